// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dual-track circuit breaker operations.
//!
//! A track opens automatically once its failure count reaches the threshold
//! and stays open until an operator closes it. Counting continues while
//! open.

use crate::audit;
use crate::guard::Guard;
use dg_adapters::{ArtifactResolver, Deployer};
use dg_core::{
    validate_manual_action, AuditEntry, AuditOutcome, BreakerEvent, BreakerExport, BreakerStatus,
    Clock, Event, GuardError, OpenedBy, RecoveryHistory, Sensitivity, ThresholdCheck,
    ThresholdStatus, Track, TrackCheck,
};
use dg_storage::MaterializedState;
use serde_json::json;
use tracing::{info, warn};

/// Reason recorded when a track opens on its own
pub const AUTO_OPEN_REASON: &str = "threshold_exceeded";

fn auto_open(track: Track, at_ms: u64) -> Event {
    Event::BreakerOpened {
        track,
        by: OpenedBy::Auto,
        reason: AUTO_OPEN_REASON.to_string(),
        actor: None,
        at_ms,
    }
}

/// Events for one more failure on `track`, including the auto-open when the
/// new count reaches the threshold of a closed track. The flag says whether
/// the track opens.
pub(crate) fn failure_events(
    state: &MaterializedState,
    track: Track,
    reason: Option<String>,
    at_ms: u64,
) -> (Vec<Event>, bool) {
    let t = state.breaker(track);
    let failure_count = t.failure_count.saturating_add(1);
    let mut events = vec![Event::BreakerFailureRecorded { track, failure_count, reason, at_ms }];
    let opens = !t.is_open() && failure_count >= t.threshold;
    if opens {
        events.push(auto_open(track, at_ms));
    }
    (events, opens)
}

fn merged_events(state: &MaterializedState, track: Option<Track>) -> Vec<BreakerEvent> {
    let mut events: Vec<BreakerEvent> = Track::selected(track)
        .into_iter()
        .flat_map(|t| state.breaker(t).events.iter().cloned())
        .collect();
    events.sort_by_key(|e| e.at_ms);
    events
}

pub(crate) fn warn_opened(status: &BreakerStatus) {
    warn!(
        track = %status.track,
        failure_count = status.failure_count,
        threshold = status.threshold,
        "circuit breaker opened"
    );
}

impl<R: ArtifactResolver, D: Deployer, C: Clock> Guard<R, D, C> {
    pub fn breaker_status(&self, track: Option<Track>) -> Vec<BreakerStatus> {
        self.ledger.read(|state| {
            Track::selected(track).into_iter().map(|t| state.breaker(t).status()).collect()
        })
    }

    /// Count a failure on `track`, opening it if this reaches the threshold.
    pub fn record_failure(
        &self,
        track: Track,
        reason: Option<String>,
        actor: &str,
    ) -> Result<BreakerStatus, GuardError> {
        let now = self.now();
        let (status, opened) = self.ledger.commit_and_view(
            |state| {
                let (mut events, opens) = failure_events(state, track, reason.clone(), now);
                let entry = AuditEntry::new(actor, "breaker.failure", now)
                    .inputs(json!({ "track": track, "reason": reason }))
                    .result(json!({ "opened": opens }));
                events.push(audit::append(entry));
                Ok((events, opens))
            },
            |state, opened| (state.breaker(track).status(), opened),
        )?;
        if opened {
            warn_opened(&status);
        }
        Ok(status)
    }

    /// Evaluate thresholds, opening any closed track already at or over its
    /// threshold. Routine polling can therefore open a breaker.
    pub fn check_thresholds(
        &self,
        track: Option<Track>,
        actor: &str,
    ) -> Result<Vec<TrackCheck>, GuardError> {
        let now = self.now();
        let (checks, opened) = self.ledger.commit_and_view(
            |state| {
                let mut events = Vec::new();
                let mut checks = Vec::new();
                for t in Track::selected(track) {
                    let b = state.breaker(t);
                    let check = if b.is_open() {
                        ThresholdCheck::Opened { newly_opened: false }
                    } else if b.over_threshold() {
                        events.push(auto_open(t, now));
                        ThresholdCheck::Opened { newly_opened: true }
                    } else {
                        ThresholdCheck::WithinLimits
                    };
                    checks.push(TrackCheck { track: t, check });
                }
                if !events.is_empty() {
                    let entry = AuditEntry::new(actor, "breaker.check", now)
                        .inputs(json!({ "track": track }))
                        .result(json!({ "checks": checks }));
                    events.push(audit::append(entry));
                }
                Ok((events, checks))
            },
            |state, checks| {
                let opened: Vec<BreakerStatus> = checks
                    .iter()
                    .filter(|c| c.check == ThresholdCheck::Opened { newly_opened: true })
                    .map(|c| state.breaker(c.track).status())
                    .collect();
                (checks, opened)
            },
        )?;
        opened.iter().for_each(warn_opened);
        Ok(checks)
    }

    /// Manually open one or both tracks
    pub fn open_breaker(
        &self,
        track: Option<Track>,
        reason: &str,
        actor: &str,
    ) -> Result<Vec<BreakerStatus>, GuardError> {
        validate_manual_action(actor, Some(reason), Sensitivity::Routine)?;
        let now = self.now();
        let reason = reason.trim().to_string();
        let statuses = self.ledger.commit_and_view(
            |state| {
                let mut events: Vec<Event> = Track::selected(track)
                    .into_iter()
                    .filter(|t| !state.breaker(*t).is_open())
                    .map(|t| Event::BreakerOpened {
                        track: t,
                        by: OpenedBy::Manual,
                        reason: reason.clone(),
                        actor: Some(actor.to_string()),
                        at_ms: now,
                    })
                    .collect();
                if !events.is_empty() {
                    let entry = AuditEntry::new(actor, "breaker.open", now)
                        .inputs(json!({ "track": track, "reason": reason }));
                    events.push(audit::append(entry));
                }
                Ok((events, ()))
            },
            |state, ()| {
                Track::selected(track).into_iter().map(|t| state.breaker(t).status()).collect()
            },
        )?;
        info!(?track, actor, %reason, "circuit breaker opened manually");
        Ok(statuses)
    }

    /// Manually close one or both tracks.
    ///
    /// Closing the deployment track while the deployment lock is held is a
    /// conflict unless `force` is set, which is a safety bypass.
    pub fn close_breaker(
        &self,
        track: Option<Track>,
        reset_failures: bool,
        force: bool,
        reason: Option<&str>,
        actor: &str,
    ) -> Result<Vec<BreakerStatus>, GuardError> {
        if force {
            validate_manual_action(actor, reason, Sensitivity::Bypass)?;
        } else if actor.trim().is_empty() {
            return Err(GuardError::validation("actor must not be empty"));
        }
        let now = self.now();
        let selected = Track::selected(track);

        let statuses = self.ledger.commit_and_view(
            |state| {
                let lock_held = selected.contains(&Track::Deployment) && state.lock.is_some();
                if lock_held && !force {
                    if let Some(holder) = state.lock.as_ref() {
                        return Err(GuardError::Conflict(format!(
                            "deployment lock is held by {} (run {}); close with --force to override",
                            holder.holder_id, holder.run_id
                        )));
                    }
                }
                let mut events: Vec<Event> = selected
                    .iter()
                    .filter(|t| {
                        let b = state.breaker(**t);
                        b.is_open() || (reset_failures && b.failure_count > 0)
                    })
                    .map(|t| Event::BreakerClosed {
                        track: *t,
                        reset_failures,
                        actor: actor.to_string(),
                        at_ms: now,
                    })
                    .collect();
                if !events.is_empty() {
                    let outcome =
                        if lock_held { AuditOutcome::Override } else { AuditOutcome::Success };
                    let entry = AuditEntry::new(actor, "breaker.close", now)
                        .inputs(json!({
                            "track": track,
                            "reset_failures": reset_failures,
                            "force": force,
                            "reason": reason,
                        }))
                        .outcome(outcome);
                    events.push(audit::append(entry));
                }
                Ok((events, ()))
            },
            |state, ()| selected.iter().map(|t| state.breaker(*t).status()).collect(),
        )?;
        info!(?track, actor, reset_failures, force, "circuit breaker closed");
        Ok(statuses)
    }

    pub fn set_threshold(
        &self,
        track: Track,
        threshold: u32,
        reason: Option<&str>,
        actor: &str,
    ) -> Result<BreakerStatus, GuardError> {
        if threshold == 0 {
            return Err(GuardError::validation("threshold must be at least 1"));
        }
        if actor.trim().is_empty() {
            return Err(GuardError::validation("actor must not be empty"));
        }
        let now = self.now();
        let status = self.ledger.commit_and_view(
            |state| {
                let previous = state.breaker(track).threshold;
                if previous == threshold {
                    return Ok((Vec::new(), ()));
                }
                let entry = AuditEntry::new(actor, "breaker.threshold", now).inputs(json!({
                    "track": track,
                    "threshold": threshold,
                    "previous": previous,
                    "reason": reason.map(str::trim),
                }));
                let events = vec![
                    Event::BreakerThresholdSet {
                        track,
                        threshold,
                        actor: actor.to_string(),
                        at_ms: now,
                    },
                    audit::append(entry),
                ];
                Ok((events, ()))
            },
            |state, ()| state.breaker(track).status(),
        )?;
        info!(%track, threshold, actor, "circuit breaker threshold set");
        Ok(status)
    }

    /// Breaker trail, oldest first, merged across the selected tracks
    pub fn breaker_events(&self, track: Option<Track>) -> Vec<BreakerEvent> {
        self.ledger.read(|state| merged_events(state, track))
    }

    pub fn recovery_history(&self) -> RecoveryHistory {
        self.ledger.read(|state| state.recovery.clone())
    }

    /// Everything `breaker export` writes out
    pub fn breaker_export(&self) -> BreakerExport {
        let now = self.now();
        let timestamp = chrono::DateTime::from_timestamp_millis(now as i64)
            .map(|t| t.to_rfc3339())
            .unwrap_or_default();
        self.ledger.read(|state| BreakerExport {
            timestamp,
            circuit_breaker: Track::ALL.iter().map(|t| state.breaker(*t).status()).collect(),
            recovery_history: state.recovery.clone(),
            event_log: merged_events(state, None),
            threshold_status: Track::ALL
                .iter()
                .map(|t| {
                    let b = state.breaker(*t);
                    ThresholdStatus {
                        track: *t,
                        failure_count: b.failure_count,
                        threshold: b.threshold,
                        exceeded: b.over_threshold(),
                    }
                })
                .collect(),
        })
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
