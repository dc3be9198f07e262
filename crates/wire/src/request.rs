// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use dg_core::{ArtifactStatus, HealthStatus, RollbackMode, TestStatus, Track};
use serde::{Deserialize, Serialize};

use super::Query;

/// Request from CLI to daemon
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Request {
    /// Health check ping
    Ping,

    /// Version handshake
    Hello { version: String },

    /// Query state
    Query { query: Query },

    /// Request daemon shutdown
    Shutdown,

    /// Get daemon status
    Status,

    /// Map a source revision to the digest of its built artifact
    RecordArtifact {
        revision: String,
        digest: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
        /// Creation time (epoch ms); defaults to now
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_ms: Option<u64>,
        actor: String,
    },

    /// Confirm a digest resolves in the artifact store
    ValidateDigest {
        digest: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
    },

    UpdateStatus {
        digest: String,
        status: ArtifactStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_ms: Option<u64>,
        /// Administrative override of the transition rules
        #[serde(default)]
        force: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        actor: String,
    },

    RecordTestResult {
        digest: String,
        test_type: String,
        status: TestStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_ms: Option<u64>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
        actor: String,
    },

    /// Count one failure on a breaker track
    BreakerFailure {
        track: Track,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        actor: String,
    },

    /// Evaluate thresholds, opening any track at or over its limit
    BreakerCheck {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        track: Option<Track>,
        actor: String,
    },

    BreakerOpen {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        track: Option<Track>,
        reason: String,
        actor: String,
    },

    BreakerClose {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        track: Option<Track>,
        /// Preserve failure counts instead of resetting them
        #[serde(default)]
        keep_failures: bool,
        /// Close even while a deployment holds the lock
        #[serde(default)]
        force: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        actor: String,
    },

    SetThreshold {
        track: Track,
        threshold: u32,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        actor: String,
    },

    LockAcquire {
        holder_id: String,
        run_id: String,
        /// Displace the current holder
        #[serde(default)]
        emergency: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
    },

    LockRelease { holder_id: String },

    /// Administrative clear, regardless of holder
    LockClear {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        actor: String,
    },

    /// Record a health sample and decide on recovery
    EvaluateHealth {
        status: HealthStatus,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        details: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        at_ms: Option<u64>,
        actor: String,
    },

    TriggerRecovery { reason: String, actor: String },

    /// Outcome of a recovery run
    ReportRecovery {
        success: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        session: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        actor: String,
    },

    Redeploy {
        digest: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
        run_id: String,
        #[serde(default)]
        emergency: bool,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        actor: String,
    },

    Rollback {
        mode: RollbackMode,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        digest: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        file: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        location: Option<String>,
        run_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        reason: Option<String>,
        /// Deploy even though the deployment breaker is open
        #[serde(default)]
        override_breaker: bool,
        #[serde(default)]
        emergency: bool,
        actor: String,
    },
}

impl Request {
    /// Requests that run the external deploy step and need the long timeout
    pub fn runs_deploy(&self) -> bool {
        matches!(self, Request::Redeploy { .. } | Request::Rollback { .. })
    }
}

#[cfg(test)]
#[path = "request_tests.rs"]
mod tests;
