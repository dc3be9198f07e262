// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! State snapshot attached to decisions and errors so an operator can act
//! without issuing further queries.

use crate::artifact::ArtifactStatus;
use crate::breaker::BreakerStatus;
use crate::digest::Digest;
use crate::lock::LockStatus;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactSummary {
    pub digest: Digest,
    pub revision: String,
    pub status: ArtifactStatus,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateContext {
    pub breakers: Vec<BreakerStatus>,
    pub lock: LockStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub artifact: Option<ArtifactSummary>,
    #[serde(default)]
    pub consecutive_degraded: u32,
}
