// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use dg_core::{
    AcquireOutcome, Artifact, AuditEntry, BreakerEvent, BreakerExport, BreakerStatus,
    ConsistencyReport, DecisionReport, Digest, DigestValidation, ErrorKind, GuardError,
    HealthHistory, LockHolder, LockStatus, RecoveryHistory, StateContext, TrackCheck,
};
use serde::{Deserialize, Serialize};

/// Daemon process summary
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonStatus {
    pub version: String,
    pub pid: u32,
    pub uptime_secs: u64,
    pub state_dir: PathBuf,
    /// Sequence of the last committed journal record
    pub write_seq: u64,
    pub artifacts: usize,
    pub breakers: Vec<BreakerStatus>,
    pub lock: LockStatus,
}

/// Response from daemon to CLI
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Response {
    /// Generic success
    Ok,

    /// Health check response
    Pong,

    /// Version handshake response
    Hello { version: String },

    /// Daemon is shutting down
    ShuttingDown,

    /// Daemon status
    Status { status: Box<DaemonStatus> },

    /// Error response, with the state an operator needs to act on it
    Error {
        kind: Option<ErrorKind>,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        context: Option<Box<StateContext>>,
    },

    /// Result of a revision lookup that may come up empty
    Existing { digest: Option<Digest> },

    Digest { digest: Digest },

    DigestValidation { validation: DigestValidation },

    Artifact { artifact: Box<Artifact> },

    Artifacts { artifacts: Vec<Artifact> },

    Breakers { breakers: Vec<BreakerStatus> },

    ThresholdChecks { checks: Vec<TrackCheck> },

    BreakerEvents { events: Vec<BreakerEvent> },

    RecoveryHistory { history: RecoveryHistory },

    BreakerExport { export: Box<BreakerExport> },

    Lock { status: LockStatus },

    LockAcquired { outcome: AcquireOutcome },

    LockReleased { holder: LockHolder },

    /// `None` when no lock was held
    LockCleared { holder: Option<LockHolder> },

    Health { history: HealthHistory },

    Audit { entries: Vec<AuditEntry> },

    /// Orchestrator decision
    Decision { report: Box<DecisionReport> },

    Consistency { report: Box<ConsistencyReport> },
}

impl Response {
    /// Error response for a failed operation, carrying current state
    pub fn from_error(err: &GuardError, context: Option<StateContext>) -> Self {
        Response::Error {
            kind: Some(err.kind()),
            message: err.to_string(),
            context: context.map(Box::new),
        }
    }

    /// Error response for failures outside the domain taxonomy
    pub fn internal(message: impl Into<String>) -> Self {
        Response::Error { kind: None, message: message.into(), context: None }
    }
}

#[cfg(test)]
#[path = "response_tests.rs"]
mod tests;
