// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Redeployment and rollback.
//!
//! A deploy runs in three phases so the state mutex is never held while the
//! external deploy step runs:
//!
//! 1. admission: breaker, retry, artifact and lock checks; on success the
//!    lock is taken and the start is audited, all in one batch
//! 2. the deploy step itself, outside the mutex
//! 3. completion: lock release and outcome in one batch, on every path

use super::Verdict;
use crate::audit;
use crate::breaker::{failure_events, warn_opened};
use crate::guard::Guard;
use crate::lock::{claim, override_entry, warn_override, Claim};
use dg_adapters::{ArtifactResolver, Deployer};
use dg_core::{
    format_elapsed_ms, validate_manual_action, ArtifactStatus, AuditOutcome, Clock, Decision,
    DecisionReport, DeployTarget, Event, GuardError, LockHolder, RollbackMode, Sensitivity, Track,
};
use dg_storage::MaterializedState;
use serde_json::{json, Value};
use std::path::Path;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct RedeployRequest {
    pub digest: String,
    pub location: Option<String>,
    pub actor: String,
    pub run_id: String,
    /// Take the deployment lock even if another run holds it
    pub emergency: bool,
    pub reason: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RollbackRequest {
    pub mode: RollbackMode,
    pub digest: Option<String>,
    pub file: Option<String>,
    pub location: Option<String>,
    pub actor: String,
    pub run_id: String,
    pub reason: Option<String>,
    /// Deploy even though the deployment breaker is open
    pub override_breaker: bool,
    pub emergency: bool,
}

struct DeployPlan<'a> {
    action: &'static str,
    finish_action: &'static str,
    actor: &'a str,
    run_id: &'a str,
    target: DeployTarget,
    override_breaker: bool,
    emergency: bool,
    reason: Option<&'a str>,
    inputs: Value,
}

type Takeover = (LockHolder, LockHolder);

fn require_ids(actor: &str, run_id: &str) -> Result<(), GuardError> {
    if actor.trim().is_empty() {
        return Err(GuardError::validation("actor must not be empty"));
    }
    if run_id.trim().is_empty() {
        return Err(GuardError::validation("run id must not be empty"));
    }
    Ok(())
}

/// Phase 1 checks. `Err` carries the refusal.
fn admit(
    state: &MaterializedState,
    plan: &DeployPlan<'_>,
    now: u64,
) -> Result<(Vec<Event>, Verdict, Option<Takeover>), Verdict> {
    let mut bypassed = false;
    let breaker = state.breaker(Track::Deployment);
    if breaker.is_open() {
        if !plan.override_breaker {
            return Err(Verdict::new(
                Decision::Blocked,
                format!(
                    "deployment circuit breaker is open ({}/{} failures); deployments are blocked until an operator closes it",
                    breaker.failure_count, breaker.threshold
                ),
            ));
        }
        bypassed = true;
    }

    if let Some(last) = &state.recovery.last_redeploy {
        if last.run_id == plan.run_id {
            return Err(Verdict::new(
                Decision::RetryNotPermitted,
                format!(
                    "run {} already attempted a deployment; automatic retries are not permitted",
                    plan.run_id
                ),
            ));
        }
    }

    if let Some(digest) = plan.target.digest() {
        match state.artifact(digest.as_str()) {
            None => {
                return Err(Verdict::from_error(&GuardError::NotFound(format!(
                    "no artifact recorded for {digest}"
                ))))
            }
            Some(artifact) if !artifact.status.is_deployable() => {
                return Err(Verdict::from_error(&GuardError::Validation(format!(
                    "artifact {} is {}; only deployable artifacts can be deployed",
                    digest.short(),
                    artifact.status
                ))))
            }
            Some(_) => {}
        }
    }

    let mut events = Vec::new();
    let mut takeover = None;
    match claim(state, plan.actor, plan.run_id, plan.emergency, now) {
        Claim::Busy(holder) => {
            return Err(Verdict::from_error(&GuardError::Conflict(format!(
                "deployment lock is held by {} (run {}) for {}",
                holder.holder_id,
                holder.run_id,
                format_elapsed_ms(holder.age_ms(now))
            ))))
        }
        Claim::AlreadyHeld => {}
        Claim::Take { holder, displaced } => {
            events.push(Event::LockAcquired { holder: holder.clone() });
            if let Some(displaced) = displaced {
                let entry = override_entry(&holder, &displaced, plan.reason, "lock.acquire", now);
                events.push(audit::append(entry));
                bypassed = true;
                takeover = Some((holder, displaced));
            }
        }
    }

    events.push(Event::RedeployStarted {
        target: plan.target.clone(),
        run_id: plan.run_id.to_string(),
        at_ms: now,
    });
    let mut verdict = Verdict::new(
        Decision::TriggerRedeploy,
        format!("deploying {} for run {}", plan.target, plan.run_id),
    )
    .target(plan.target.clone());
    if bypassed {
        verdict = verdict.audited_as(AuditOutcome::Override);
    }
    Ok((events, verdict, takeover))
}

impl<R: ArtifactResolver, D: Deployer, C: Clock> Guard<R, D, C> {
    /// Deploy a recorded, deployable artifact by digest.
    pub async fn redeploy(&self, req: RedeployRequest) -> Result<DecisionReport, GuardError> {
        let inputs = json!({
            "digest": req.digest,
            "location": req.location,
            "run_id": req.run_id,
            "emergency": req.emergency,
            "reason": req.reason,
        });
        match self.prepare_redeploy(&req).await {
            Err(e) => self.refuse("redeploy", &req.actor, inputs, Some(&req.digest), &e),
            Ok(target) => {
                self.execute(DeployPlan {
                    action: "redeploy",
                    finish_action: "redeploy.finish",
                    actor: &req.actor,
                    run_id: &req.run_id,
                    target,
                    override_breaker: false,
                    emergency: req.emergency,
                    reason: req.reason.as_deref(),
                    inputs,
                })
                .await
            }
        }
    }

    async fn prepare_redeploy(&self, req: &RedeployRequest) -> Result<DeployTarget, GuardError> {
        require_ids(&req.actor, &req.run_id)?;
        if req.emergency {
            validate_manual_action(&req.actor, req.reason.as_deref(), Sensitivity::Bypass)?;
        }
        let validated = self.validate_digest(&req.digest, req.location.as_deref()).await?;
        Ok(DeployTarget::Digest { digest: validated.digest })
    }

    /// Operator rollback. Every safety bypass in the request is part of the
    /// audit entry written before the deploy runs.
    pub async fn rollback(&self, req: RollbackRequest) -> Result<DecisionReport, GuardError> {
        let inputs = json!({
            "mode": req.mode,
            "digest": req.digest,
            "file": req.file,
            "location": req.location,
            "run_id": req.run_id,
            "override_breaker": req.override_breaker,
            "emergency": req.emergency,
            "reason": req.reason,
        });
        match self.prepare_rollback(&req).await {
            Err(e) => self.refuse("rollback", &req.actor, inputs, req.digest.as_deref(), &e),
            Ok(target) => {
                self.execute(DeployPlan {
                    action: "rollback",
                    finish_action: "rollback.finish",
                    actor: &req.actor,
                    run_id: &req.run_id,
                    target,
                    override_breaker: req.override_breaker,
                    emergency: req.emergency,
                    reason: req.reason.as_deref(),
                    inputs,
                })
                .await
            }
        }
    }

    async fn prepare_rollback(&self, req: &RollbackRequest) -> Result<DeployTarget, GuardError> {
        require_ids(&req.actor, &req.run_id)?;
        let bypass = req.mode == RollbackMode::FileBased || req.override_breaker || req.emergency;
        let sensitivity = if bypass { Sensitivity::Bypass } else { Sensitivity::Routine };
        validate_manual_action(&req.actor, req.reason.as_deref(), sensitivity)?;

        match req.mode {
            RollbackMode::LatestBackup => {
                let pointers = self.ledger.read(|state| state.deployment.clone());
                let backup = pointers.backup.clone().ok_or_else(|| {
                    GuardError::not_found("no backup deployment recorded; nothing to roll back to")
                })?;
                if pointers.backup_matches_current() {
                    return Err(GuardError::Conflict(format!(
                        "backup {} is the current deployment; rolling back would change nothing",
                        backup.short()
                    )));
                }
                let validated =
                    self.validate_digest(backup.as_str(), req.location.as_deref()).await?;
                Ok(DeployTarget::Digest { digest: validated.digest })
            }
            RollbackMode::SpecificDigest => {
                let digest = req.digest.as_deref().ok_or_else(|| {
                    GuardError::validation("specific-digest rollback requires a digest")
                })?;
                let validated = self.validate_digest(digest, req.location.as_deref()).await?;
                Ok(DeployTarget::Digest { digest: validated.digest })
            }
            RollbackMode::FileBased => {
                let path = req
                    .file
                    .as_deref()
                    .map(str::trim)
                    .filter(|p| !p.is_empty())
                    .ok_or_else(|| GuardError::validation("file-based rollback requires a file"))?;
                if !Path::new(path).is_file() {
                    return Err(GuardError::NotFound(format!("deploy file {path} does not exist")));
                }
                warn!(file = path, actor = %req.actor, "file-based rollback bypasses digest validation");
                Ok(DeployTarget::File { path: path.to_string() })
            }
        }
    }

    async fn execute(&self, plan: DeployPlan<'_>) -> Result<DecisionReport, GuardError> {
        let digest = plan.target.digest().map(|d| d.as_str().to_string());

        // Phase 1
        let now = self.now();
        let mut takeover: Option<Takeover> = None;
        let admitted =
            self.decide(plan.action, plan.actor, plan.inputs.clone(), digest.as_deref(), |state| {
                match admit(state, &plan, now) {
                    Ok((events, verdict, displaced)) => {
                        takeover = displaced;
                        (events, verdict)
                    }
                    Err(verdict) => (Vec::new(), verdict),
                }
            })?;
        if admitted.decision != Decision::TriggerRedeploy {
            return Ok(admitted);
        }
        if let Some((holder, displaced)) = &takeover {
            warn_override(holder, displaced);
        }

        // Phase 2
        info!(target = %plan.target, run = plan.run_id, "deploy started");
        let outcome = self.deployer.deploy(&plan.target, plan.run_id).await;

        // Phase 3
        let now = self.now();
        let mut lost_lock = false;
        let inputs = json!({ "run_id": plan.run_id, "target": plan.target });
        let finished = self.decide(plan.finish_action, plan.actor, inputs, digest.as_deref(), |state| {
            let mut events = Vec::new();
            if state.lock.as_ref().is_some_and(|h| h.is_same_claim(plan.actor, plan.run_id)) {
                events.push(Event::LockReleased { holder_id: plan.actor.to_string(), at_ms: now });
            } else {
                lost_lock = true;
            }
            events.push(Event::RedeployFinished {
                run_id: plan.run_id.to_string(),
                success: outcome.is_ok(),
                at_ms: now,
            });

            let verdict = match &outcome {
                Ok(()) => {
                    if let Some(digest) = plan.target.digest() {
                        let status = state.artifact(digest.as_str()).map(|a| a.status);
                        if status == Some(ArtifactStatus::Deployable) {
                            events.push(Event::ArtifactStatusChanged {
                                digest: digest.clone(),
                                from: ArtifactStatus::Deployable,
                                to: ArtifactStatus::Deployed,
                                forced: false,
                                at_ms: now,
                            });
                        }
                        events.push(Event::DeploymentRecorded { digest: digest.clone(), at_ms: now });
                    }
                    Verdict::new(Decision::TriggerRedeploy, format!("deployed {}", plan.target))
                        .target(plan.target.clone())
                        .deployed(true)
                }
                Err(e) => {
                    let (failure, opens) =
                        failure_events(state, Track::Deployment, Some(e.to_string()), now);
                    events.extend(failure);
                    let decision = if opens { Decision::OpenCircuit } else { Decision::Escalate };
                    Verdict::new(decision, format!("deploy of {} failed: {e}", plan.target))
                        .target(plan.target.clone())
                        .deployed(false)
                }
            };
            (events, verdict)
        });

        let finished = match finished {
            Ok(report) => report,
            Err(e) => {
                error!(
                    run = plan.run_id,
                    error = %e,
                    "deploy outcome could not be recorded; deployment lock is still held"
                );
                return Err(e);
            }
        };
        if lost_lock {
            warn!(run = plan.run_id, "deployment lock was taken over during the deploy; left in place");
        }
        if finished.decision == Decision::OpenCircuit {
            if let Some(status) =
                finished.context.breakers.iter().find(|b| b.track == Track::Deployment)
            {
                warn_opened(status);
            }
        }
        Ok(finished)
    }
}
