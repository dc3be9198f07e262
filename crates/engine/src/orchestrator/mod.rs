// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator: turns health signals and pipeline events into decisions.
//!
//! Every decision, including refusals caused by errors, is appended to the
//! audit log together with the state it was made against.

mod consistency;
mod deploy;
mod recovery;

pub use deploy::{RedeployRequest, RollbackRequest};

use crate::audit;
use crate::guard::Guard;
use dg_adapters::{ArtifactResolver, Deployer};
use dg_core::{
    AuditEntry, AuditId, AuditOutcome, Clock, Decision, DecisionReport, DeployTarget, ErrorKind,
    Event, GuardError, StateContext,
};
use dg_storage::MaterializedState;
use serde_json::{json, Value};
use tracing::{info, warn};

/// A decision before it is committed
#[derive(Debug, Clone)]
pub(crate) struct Verdict {
    decision: Decision,
    reason: String,
    target: Option<DeployTarget>,
    deployed: Option<bool>,
    error_kind: Option<ErrorKind>,
    outcome: Option<AuditOutcome>,
}

impl Verdict {
    pub(crate) fn new(decision: Decision, reason: impl Into<String>) -> Self {
        Self {
            decision,
            reason: reason.into(),
            target: None,
            deployed: None,
            error_kind: None,
            outcome: None,
        }
    }

    /// Refusal for an operation that failed with `err`
    pub(crate) fn from_error(err: &GuardError) -> Self {
        let kind = err.kind();
        let mut verdict = Self::new(Decision::for_error(kind), err.to_string());
        verdict.error_kind = Some(kind);
        verdict
    }

    pub(crate) fn target(mut self, target: DeployTarget) -> Self {
        self.target = Some(target);
        self
    }

    pub(crate) fn deployed(mut self, success: bool) -> Self {
        self.deployed = Some(success);
        self
    }

    /// Record the audit entry with this outcome instead of the default
    pub(crate) fn audited_as(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    fn default_outcome(&self) -> AuditOutcome {
        match self.decision {
            _ if self.deployed == Some(false) => AuditOutcome::Failure,
            d if d.proceeds() => AuditOutcome::Success,
            Decision::Blocked
            | Decision::BlockedManualInterventionRequired
            | Decision::RetryNotPermitted => AuditOutcome::Blocked,
            _ => AuditOutcome::Failure,
        }
    }

    fn audit_entry(&self, actor: &str, action: &str, now_ms: u64, inputs: Value) -> AuditEntry {
        let mut entry = AuditEntry::new(actor, action, now_ms)
            .inputs(inputs)
            .result(json!({
                "decision": self.decision,
                "reason": self.reason,
                "target": self.target,
                "deployed": self.deployed,
            }))
            .outcome(self.outcome.unwrap_or_else(|| self.default_outcome()));
        if let Some(kind) = self.error_kind {
            entry = entry.error(kind);
        }
        entry
    }

    fn into_report(self, audit_id: AuditId, context: StateContext) -> DecisionReport {
        DecisionReport {
            decision: self.decision,
            reason: self.reason,
            target: self.target,
            deployed: self.deployed,
            error_kind: self.error_kind,
            audit_id,
            context,
        }
    }
}

fn log_report(action: &str, report: &DecisionReport) {
    if report.decision.proceeds() && report.deployed != Some(false) {
        info!(action, decision = %report.decision, reason = %report.reason, "decision");
    } else {
        warn!(action, decision = %report.decision, reason = %report.reason, "decision");
    }
}

impl<R: ArtifactResolver, D: Deployer, C: Clock> Guard<R, D, C> {
    /// Commit the events `rule` produces together with the audit entry for
    /// its verdict, and report the decision against the resulting state.
    pub(crate) fn decide(
        &self,
        action: &str,
        actor: &str,
        inputs: Value,
        digest: Option<&str>,
        rule: impl FnOnce(&MaterializedState) -> (Vec<Event>, Verdict),
    ) -> Result<DecisionReport, GuardError> {
        let now = self.now();
        let report = self.ledger.commit_and_view(
            |state| {
                let (mut events, verdict) = rule(state);
                let entry = verdict.audit_entry(actor, action, now, inputs);
                let audit_id = entry.id.clone();
                events.push(audit::append(entry));
                Ok((events, (verdict, audit_id)))
            },
            |state, (verdict, audit_id)| verdict.into_report(audit_id, state.context(now, digest)),
        )?;
        log_report(action, &report);
        Ok(report)
    }

    /// Audit and report an operation refused because of `err`
    pub(crate) fn refuse(
        &self,
        action: &str,
        actor: &str,
        inputs: Value,
        digest: Option<&str>,
        err: &GuardError,
    ) -> Result<DecisionReport, GuardError> {
        let actor = if actor.trim().is_empty() { "unknown" } else { actor };
        self.decide(action, actor, inputs, digest, |_| (Vec::new(), Verdict::from_error(err)))
    }
}

#[cfg(test)]
#[path = "../orchestrator_tests/mod.rs"]
mod tests;
