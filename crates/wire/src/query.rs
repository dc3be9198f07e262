// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Query types for reading daemon state.

use dg_core::Track;
use serde::{Deserialize, Serialize};

/// Query types for reading daemon state
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type")]
pub enum Query {
    /// Digest already recorded for a revision, if any
    CheckExisting { revision: String },
    /// Digest for a revision; NotFound if it never reached the artifact stage
    GetDigest { revision: String },
    GetArtifact { digest: String },
    /// All artifacts, newest first
    ListArtifacts,
    BreakerStatus {
        #[serde(default)]
        track: Option<Track>,
    },
    BreakerEvents {
        #[serde(default)]
        track: Option<Track>,
    },
    RecoveryHistory,
    BreakerExport,
    LockStatus,
    HealthHistory,
    /// Audit entries, newest first
    AuditLog {
        #[serde(default)]
        limit: Option<usize>,
    },
    Consistency,
}
