// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Events: the facts that drive every state change.
//!
//! Events carry resulting values (counts, new statuses) rather than deltas,
//! so applying one twice leaves state unchanged.

use crate::artifact::{ArtifactStatus, TestResult};
use crate::audit::AuditEntry;
use crate::breaker::{OpenedBy, Track};
use crate::deployment::DeployTarget;
use crate::digest::Digest;
use crate::health::HealthRecord;
use crate::lock::LockHolder;
use serde::{Deserialize, Serialize};

/// Serializes as `{"type": "area:name", ...fields}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    #[serde(rename = "artifact:recorded")]
    ArtifactRecorded {
        revision: String,
        digest: Digest,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
        at_ms: u64,
    },

    #[serde(rename = "artifact:status")]
    ArtifactStatusChanged {
        digest: Digest,
        from: ArtifactStatus,
        to: ArtifactStatus,
        #[serde(default)]
        forced: bool,
        at_ms: u64,
    },

    #[serde(rename = "artifact:test")]
    TestResultRecorded { digest: Digest, result: TestResult },

    /// `digest` became the running deployment
    #[serde(rename = "deployment:recorded")]
    DeploymentRecorded { digest: Digest, at_ms: u64 },

    #[serde(rename = "breaker:failure")]
    BreakerFailureRecorded {
        track: Track,
        failure_count: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        at_ms: u64,
    },

    #[serde(rename = "breaker:opened")]
    BreakerOpened {
        track: Track,
        by: OpenedBy,
        reason: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        actor: Option<String>,
        at_ms: u64,
    },

    #[serde(rename = "breaker:closed")]
    BreakerClosed { track: Track, reset_failures: bool, actor: String, at_ms: u64 },

    #[serde(rename = "breaker:threshold")]
    BreakerThresholdSet { track: Track, threshold: u32, actor: String, at_ms: u64 },

    #[serde(rename = "lock:acquired")]
    LockAcquired { holder: LockHolder },

    #[serde(rename = "lock:released")]
    LockReleased { holder_id: String, at_ms: u64 },

    /// Administrative clear, bypassing the holder check
    #[serde(rename = "lock:cleared")]
    LockCleared { actor: String, at_ms: u64 },

    #[serde(rename = "health:recorded")]
    HealthRecorded { record: HealthRecord, consecutive_degraded: u32 },

    #[serde(rename = "recovery:triggered")]
    RecoveryTriggered { reason: String, at_ms: u64 },

    #[serde(rename = "recovery:completed")]
    RecoveryCompleted {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session: Option<String>,
        at_ms: u64,
    },

    #[serde(rename = "redeploy:started")]
    RedeployStarted { target: DeployTarget, run_id: String, at_ms: u64 },

    #[serde(rename = "redeploy:finished")]
    RedeployFinished { run_id: String, success: bool, at_ms: u64 },

    #[serde(rename = "audit:appended")]
    AuditAppended { entry: AuditEntry },
}

impl Event {
    pub fn name(&self) -> &'static str {
        match self {
            Event::ArtifactRecorded { .. } => "artifact:recorded",
            Event::ArtifactStatusChanged { .. } => "artifact:status",
            Event::TestResultRecorded { .. } => "artifact:test",
            Event::DeploymentRecorded { .. } => "deployment:recorded",
            Event::BreakerFailureRecorded { .. } => "breaker:failure",
            Event::BreakerOpened { .. } => "breaker:opened",
            Event::BreakerClosed { .. } => "breaker:closed",
            Event::BreakerThresholdSet { .. } => "breaker:threshold",
            Event::LockAcquired { .. } => "lock:acquired",
            Event::LockReleased { .. } => "lock:released",
            Event::LockCleared { .. } => "lock:cleared",
            Event::HealthRecorded { .. } => "health:recorded",
            Event::RecoveryTriggered { .. } => "recovery:triggered",
            Event::RecoveryCompleted { .. } => "recovery:completed",
            Event::RedeployStarted { .. } => "redeploy:started",
            Event::RedeployFinished { .. } => "redeploy:finished",
            Event::AuditAppended { .. } => "audit:appended",
        }
    }

    /// One-line summary for debug logging
    pub fn log_summary(&self) -> String {
        let t = self.name();
        match self {
            Event::ArtifactRecorded { revision, digest, .. } => {
                format!("{t} revision={revision} digest={}", digest.short())
            }
            Event::ArtifactStatusChanged { digest, from, to, forced, .. } => {
                format!("{t} digest={} {from}->{to} forced={forced}", digest.short())
            }
            Event::TestResultRecorded { digest, result } => {
                format!("{t} digest={} {}={}", digest.short(), result.test_type, result.status)
            }
            Event::DeploymentRecorded { digest, .. } => format!("{t} digest={}", digest.short()),
            Event::BreakerFailureRecorded { track, failure_count, .. } => {
                format!("{t} track={track} count={failure_count}")
            }
            Event::BreakerOpened { track, by, .. } => format!("{t} track={track} by={by}"),
            Event::BreakerClosed { track, reset_failures, .. } => {
                format!("{t} track={track} reset={reset_failures}")
            }
            Event::BreakerThresholdSet { track, threshold, .. } => {
                format!("{t} track={track} threshold={threshold}")
            }
            Event::LockAcquired { holder } => format!(
                "{t} holder={} run={} emergency={}",
                holder.holder_id, holder.run_id, holder.emergency_override
            ),
            Event::LockReleased { holder_id, .. } => format!("{t} holder={holder_id}"),
            Event::LockCleared { actor, .. } => format!("{t} actor={actor}"),
            Event::HealthRecorded { record, consecutive_degraded } => {
                format!("{t} status={} consecutive={consecutive_degraded}", record.status)
            }
            Event::RecoveryTriggered { .. } => t.to_string(),
            Event::RecoveryCompleted { success, .. } => format!("{t} success={success}"),
            Event::RedeployStarted { target, run_id, .. } => {
                format!("{t} target={target} run={run_id}")
            }
            Event::RedeployFinished { run_id, success, .. } => {
                format!("{t} run={run_id} success={success}")
            }
            Event::AuditAppended { entry } => format!("{t} action={} id={}", entry.action, entry.id),
        }
    }
}

#[cfg(test)]
#[path = "event_tests.rs"]
mod tests;
