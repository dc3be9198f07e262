// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Append-only audit log entries

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};
use serde_json::Value;

crate::define_id! {
    /// Unique identifier for an audit entry.
    pub struct AuditId("aud-");
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditOutcome {
    Success,
    Failure,
    Blocked,
    /// A safety rule was deliberately bypassed
    Override,
}

crate::simple_display! {
    AuditOutcome {
        Success => "success",
        Failure => "failure",
        Blocked => "blocked",
        Override => "override",
    }
}

/// One state-changing decision. Never mutated after it is appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub id: AuditId,
    pub at_ms: u64,
    pub actor: String,
    pub action: String,
    #[serde(default)]
    pub inputs: Value,
    #[serde(default)]
    pub result: Value,
    pub outcome: AuditOutcome,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<ErrorKind>,
}

impl AuditEntry {
    pub fn new(actor: impl Into<String>, action: impl Into<String>, at_ms: u64) -> Self {
        Self {
            id: AuditId::new(),
            at_ms,
            actor: actor.into(),
            action: action.into(),
            inputs: Value::Null,
            result: Value::Null,
            outcome: AuditOutcome::Success,
            error_kind: None,
        }
    }

    pub fn inputs(mut self, inputs: Value) -> Self {
        self.inputs = inputs;
        self
    }

    pub fn result(mut self, result: Value) -> Self {
        self.result = result;
        self
    }

    pub fn outcome(mut self, outcome: AuditOutcome) -> Self {
        self.outcome = outcome;
        self
    }

    /// Mark the entry as a failure of the given kind
    pub fn error(mut self, kind: ErrorKind) -> Self {
        self.error_kind = Some(kind);
        if self.outcome == AuditOutcome::Success {
            self.outcome = AuditOutcome::Failure;
        }
        self
    }
}
