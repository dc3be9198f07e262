// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Result shapes returned to callers and written to export files

use crate::audit::AuditId;
use crate::breaker::{BreakerEvent, BreakerStatus, ThresholdCheck, Track};
use crate::context::StateContext;
use crate::decision::Decision;
use crate::deployment::{DeployTarget, RecoveryHistory};
use crate::digest::Digest;
use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};

/// Outcome of an orchestrator operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecisionReport {
    pub decision: Decision,
    pub reason: String,
    /// Deploy target involved in, or recommended by, the decision
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target: Option<DeployTarget>,
    /// Set when a deploy was executed: whether it succeeded
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deployed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
    pub audit_id: AuditId,
    pub context: StateContext,
}

/// Result of `validate-digest`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigestValidation {
    pub digest: Digest,
    pub location: String,
    /// False when no external store was consulted and the registry record was used
    pub verified_externally: bool,
}

/// Threshold evaluation for one track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackCheck {
    pub track: Track,
    pub check: ThresholdCheck,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ThresholdStatus {
    pub track: Track,
    pub failure_count: u32,
    pub threshold: u32,
    pub exceeded: bool,
}

/// The document written by `breaker export`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerExport {
    /// RFC 3339 export time
    pub timestamp: String,
    pub circuit_breaker: Vec<BreakerStatus>,
    pub recovery_history: RecoveryHistory,
    pub event_log: Vec<BreakerEvent>,
    pub threshold_status: Vec<ThresholdStatus>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueSeverity {
    Info,
    Warning,
}

crate::simple_display! {
    IssueSeverity {
        Info => "info",
        Warning => "warning",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyIssue {
    pub severity: IssueSeverity,
    pub component: String,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConsistencyReport {
    pub consistent: bool,
    pub issues: Vec<ConsistencyIssue>,
    pub context: StateContext,
}
