// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Health signals and recovery outcomes

use super::Verdict;
use crate::breaker::{failure_events, warn_opened};
use crate::guard::Guard;
use dg_adapters::{ArtifactResolver, Deployer};
use dg_core::{
    validate_manual_action, AuditOutcome, Clock, Decision, DecisionReport, DeployTarget, Event,
    GuardError, HealthHistory, HealthRecord, HealthStatus, OpenedBy, Sensitivity, Track,
};
use serde_json::json;

impl<R: ArtifactResolver, D: Deployer, C: Clock> Guard<R, D, C> {
    pub fn health_history(&self) -> HealthHistory {
        self.ledger.read(|state| state.health.clone())
    }

    /// Record a health sample and decide whether recovery should run.
    ///
    /// Recovery triggers once the consecutive non-healthy count reaches the
    /// configured threshold, unless the recovery breaker is open.
    pub fn evaluate_health(
        &self,
        status: HealthStatus,
        details: Option<String>,
        at_ms: Option<u64>,
        actor: &str,
    ) -> Result<DecisionReport, GuardError> {
        let at_ms = at_ms.unwrap_or_else(|| self.now());
        let threshold = self.config.recovery_trigger_threshold;
        let inputs = json!({ "status": status, "details": details, "at_ms": at_ms });
        self.decide("health.evaluate", actor, inputs, None, |state| {
            let consecutive = state.health.next_consecutive(status);
            let record = HealthRecord { at_ms, status, details };
            let mut events =
                vec![Event::HealthRecorded { record, consecutive_degraded: consecutive }];

            let verdict = if consecutive < threshold {
                Verdict::new(
                    Decision::Allow,
                    format!("{consecutive}/{threshold} consecutive non-healthy checks"),
                )
            } else if state.breaker(Track::Recovery).is_open() {
                Verdict::new(
                    Decision::BlockedManualInterventionRequired,
                    format!(
                        "{consecutive} consecutive non-healthy checks, but the recovery circuit breaker is open; automated recovery suppressed"
                    ),
                )
            } else {
                let reason = format!("{consecutive} consecutive non-healthy checks");
                events.push(Event::RecoveryTriggered { reason: reason.clone(), at_ms });
                Verdict::new(Decision::TriggerRecovery, reason)
            };
            (events, verdict)
        })
    }

    /// Operator-requested recovery, subject to the recovery breaker
    pub fn trigger_recovery(&self, actor: &str, reason: &str) -> Result<DecisionReport, GuardError> {
        let inputs = json!({ "reason": reason });
        if let Err(e) = validate_manual_action(actor, Some(reason), Sensitivity::Routine) {
            return self.refuse("recovery.trigger", actor, inputs, None, &e);
        }
        let now = self.now();
        let reason = reason.trim().to_string();
        self.decide("recovery.trigger", actor, inputs, None, |state| {
            if state.breaker(Track::Recovery).is_open() {
                let verdict = Verdict::new(
                    Decision::BlockedManualInterventionRequired,
                    "recovery circuit breaker is open; close it before triggering recovery",
                );
                return (Vec::new(), verdict);
            }
            let events = vec![Event::RecoveryTriggered { reason: reason.clone(), at_ms: now }];
            (events, Verdict::new(Decision::TriggerRecovery, format!("manual recovery: {reason}")))
        })
    }

    /// Outcome of a recovery attempt.
    ///
    /// A failure counts against the recovery breaker. If the breaker is then
    /// open, redeployment is blocked and a human must step in; otherwise the
    /// backup deployment is recommended when there is one.
    pub fn report_recovery(
        &self,
        success: bool,
        session: Option<String>,
        reason: Option<String>,
        actor: &str,
    ) -> Result<DecisionReport, GuardError> {
        let now = self.now();
        let inputs = json!({ "success": success, "session": session, "reason": reason });
        let report = self.decide("recovery.report", actor, inputs, None, |state| {
            let mut events = vec![Event::RecoveryCompleted { success, session, at_ms: now }];
            if success {
                return (events, Verdict::new(Decision::Allow, "recovery succeeded"));
            }

            let (failure, opens) = failure_events(state, Track::Recovery, reason, now);
            events.extend(failure);
            let verdict = if opens || state.breaker(Track::Recovery).is_open() {
                Verdict::new(
                    Decision::EscalateRedeploymentBlocked,
                    "recovery failed and the recovery circuit breaker is open; redeployment blocked",
                )
                .audited_as(AuditOutcome::Blocked)
            } else if state.breaker(Track::Deployment).is_open() {
                Verdict::new(
                    Decision::Escalate,
                    "recovery failed and the deployment circuit breaker is open",
                )
            } else {
                match &state.deployment.backup {
                    Some(backup) => Verdict::new(
                        Decision::TriggerRedeploy,
                        format!("recovery failed; redeploy backup {}", backup.short()),
                    )
                    .target(DeployTarget::Digest { digest: backup.clone() }),
                    None => Verdict::new(
                        Decision::Escalate,
                        "recovery failed and no backup deployment is recorded",
                    ),
                }
            };
            (events, verdict)
        })?;

        let opened_now = report.context.breakers.iter().find(|b| {
            b.track == Track::Recovery && b.opened_by == Some(OpenedBy::Auto) && b.opened_at_ms == Some(now)
        });
        if let Some(status) = opened_now {
            warn_opened(status);
        }
        Ok(report)
    }
}
