// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment lock operations

use crate::audit;
use crate::guard::Guard;
use dg_adapters::{ArtifactResolver, Deployer};
use dg_core::{
    validate_manual_action, AcquireOutcome, AuditEntry, AuditOutcome, Clock, Event, GuardError,
    LockHolder, LockStatus, Sensitivity,
};
use dg_storage::MaterializedState;
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct AcquireRequest {
    pub holder_id: String,
    pub run_id: String,
    /// Take the lock even if someone else holds it
    pub emergency: bool,
    pub reason: Option<String>,
}

/// What an acquire attempt would do against the current state
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Claim {
    /// Lock is taken by this claim; `displaced` is set for an emergency override
    Take { holder: LockHolder, displaced: Option<LockHolder> },
    /// The same holder and run already hold it
    AlreadyHeld,
    Busy(LockHolder),
}

pub(crate) fn claim(
    state: &MaterializedState,
    holder_id: &str,
    run_id: &str,
    emergency: bool,
    now_ms: u64,
) -> Claim {
    let fresh = |displaced: Option<&LockHolder>| LockHolder {
        holder_id: holder_id.to_string(),
        run_id: run_id.to_string(),
        acquired_at_ms: now_ms,
        emergency_override: displaced.is_some(),
        overridden_holder: displaced.map(|d| d.holder_id.clone()),
    };
    match &state.lock {
        None => Claim::Take { holder: fresh(None), displaced: None },
        Some(current) if current.is_same_claim(holder_id, run_id) => Claim::AlreadyHeld,
        Some(current) if emergency => {
            Claim::Take { holder: fresh(Some(current)), displaced: Some(current.clone()) }
        }
        Some(current) => Claim::Busy(current.clone()),
    }
}

/// Audit entry for a lock takeover, naming both holders
pub(crate) fn override_entry(
    holder: &LockHolder,
    displaced: &LockHolder,
    reason: Option<&str>,
    action: &str,
    now_ms: u64,
) -> AuditEntry {
    AuditEntry::new(&holder.holder_id, action, now_ms)
        .inputs(json!({
            "holder_id": holder.holder_id,
            "run_id": holder.run_id,
            "emergency": true,
            "reason": reason,
        }))
        .result(json!({
            "overriding_holder": holder.holder_id,
            "overriding_run": holder.run_id,
            "overridden_holder": displaced.holder_id,
            "overridden_run": displaced.run_id,
            "overridden_age_ms": displaced.age_ms(now_ms),
        }))
        .outcome(AuditOutcome::Override)
}

pub(crate) fn warn_override(holder: &LockHolder, displaced: &LockHolder) {
    warn!(
        holder = %holder.holder_id,
        run = %holder.run_id,
        overridden = %displaced.holder_id,
        overridden_run = %displaced.run_id,
        "EMERGENCY deployment lock override: mutual exclusion bypassed"
    );
}

fn require_id(value: &str, what: &str) -> Result<(), GuardError> {
    if value.trim().is_empty() {
        return Err(GuardError::Validation(format!("{what} must not be empty")));
    }
    Ok(())
}

impl<R: ArtifactResolver, D: Deployer, C: Clock> Guard<R, D, C> {
    pub fn lock_status(&self) -> LockStatus {
        let now = self.now();
        self.ledger.read(|state| state.lock_status(now))
    }

    /// Take the deployment lock. Contention is reported as
    /// [`AcquireOutcome::Conflict`], not as an error.
    pub fn acquire_lock(&self, req: AcquireRequest) -> Result<AcquireOutcome, GuardError> {
        require_id(&req.holder_id, "holder id")?;
        require_id(&req.run_id, "run id")?;
        if req.emergency {
            validate_manual_action(&req.holder_id, req.reason.as_deref(), Sensitivity::Bypass)?;
        }
        let now = self.now();

        let (outcome, takeover) = self.ledger.commit(|state| {
            match claim(state, &req.holder_id, &req.run_id, req.emergency, now) {
                Claim::Take { holder, displaced } => {
                    let entry = match &displaced {
                        Some(d) => {
                            override_entry(&holder, d, req.reason.as_deref(), "lock.acquire", now)
                        }
                        None => AuditEntry::new(&holder.holder_id, "lock.acquire", now).inputs(
                            json!({ "holder_id": holder.holder_id, "run_id": holder.run_id }),
                        ),
                    };
                    let outcome = AcquireOutcome::Locked {
                        status: LockStatus::from_holder(Some(&holder), now),
                        overridden: displaced.clone(),
                    };
                    let events =
                        vec![Event::LockAcquired { holder: holder.clone() }, audit::append(entry)];
                    Ok((events, (outcome, displaced.map(|d| (holder, d)))))
                }
                Claim::AlreadyHeld => {
                    let outcome =
                        AcquireOutcome::Locked { status: state.lock_status(now), overridden: None };
                    Ok((Vec::new(), (outcome, None)))
                }
                Claim::Busy(holder) => {
                    let age_ms = holder.age_ms(now);
                    Ok((Vec::new(), (AcquireOutcome::Conflict { holder, age_ms }, None)))
                }
            }
        })?;

        match (&outcome, takeover) {
            (_, Some((holder, displaced))) => warn_override(&holder, &displaced),
            (AcquireOutcome::Locked { .. }, None) => {
                info!(holder = %req.holder_id, run = %req.run_id, "deployment lock acquired")
            }
            (AcquireOutcome::Conflict { holder, age_ms }, None) => info!(
                requester = %req.holder_id,
                holder = %holder.holder_id,
                age_ms,
                "deployment lock contended"
            ),
        }
        Ok(outcome)
    }

    /// Release the lock held by `holder_id`. A release by anyone else is
    /// refused so a late caller cannot drop a newer holder's lock.
    pub fn release_lock(&self, holder_id: &str) -> Result<LockHolder, GuardError> {
        require_id(holder_id, "holder id")?;
        let now = self.now();
        let released = self.ledger.commit(|state| {
            let current = state
                .lock
                .as_ref()
                .ok_or_else(|| GuardError::not_found("deployment lock is not held"))?;
            if current.holder_id != holder_id {
                return Err(GuardError::NotOwner {
                    holder: current.holder_id.clone(),
                    requester: holder_id.to_string(),
                });
            }
            let entry = AuditEntry::new(holder_id, "lock.release", now).inputs(json!({
                "holder_id": holder_id,
                "run_id": current.run_id,
                "held_ms": current.age_ms(now),
            }));
            let events = vec![
                Event::LockReleased { holder_id: holder_id.to_string(), at_ms: now },
                audit::append(entry),
            ];
            Ok((events, current.clone()))
        })?;
        info!(holder = %holder_id, run = %released.run_id, "deployment lock released");
        Ok(released)
    }

    /// Administrative clear of a stuck lock, whoever holds it.
    ///
    /// Returns the holder that was cleared, or `None` if the lock was free.
    pub fn clear_lock(&self, actor: &str, reason: Option<&str>) -> Result<Option<LockHolder>, GuardError> {
        validate_manual_action(actor, reason, Sensitivity::Routine)?;
        let now = self.now();
        let cleared = self.ledger.commit(|state| {
            let Some(current) = state.lock.as_ref() else {
                return Ok((Vec::new(), None));
            };
            let entry = AuditEntry::new(actor, "lock.clear", now)
                .inputs(json!({ "reason": reason }))
                .result(json!({
                    "cleared_holder": current.holder_id,
                    "cleared_run": current.run_id,
                    "held_ms": current.age_ms(now),
                }))
                .outcome(AuditOutcome::Override);
            let events = vec![
                Event::LockCleared { actor: actor.to_string(), at_ms: now },
                audit::append(entry),
            ];
            Ok((events, Some(current.clone())))
        })?;
        if let Some(holder) = &cleared {
            warn!(
                actor,
                holder = %holder.holder_id,
                run = %holder.run_id,
                "deployment lock cleared administratively"
            );
        }
        Ok(cleared)
    }
}

#[cfg(test)]
#[path = "lock_tests.rs"]
mod tests;
