// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Snapshot persistence for crash recovery.
//!
//! A snapshot stores the complete materialized state together with the
//! journal sequence it covers. Recovery loads the snapshot and replays
//! journal entries after that sequence.

use crate::state::MaterializedState;
use crate::store::StoreError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Current snapshot schema version
pub const CURRENT_SNAPSHOT_VERSION: u32 = 1;

pub const SNAPSHOT_KEY: &str = "snapshot";
/// Previous snapshot, kept for manual recovery
pub const SNAPSHOT_BAK_KEY: &str = "snapshot.bak";

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("snapshot version {found} is newer than supported version {supported}")]
    UnsupportedVersion { found: u32, supported: u32 },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    /// Schema version
    #[serde(rename = "v")]
    pub version: u32,
    /// Journal sequence covered by this snapshot
    pub seq: u64,
    pub state: MaterializedState,
    pub created_at: DateTime<Utc>,
}

impl Snapshot {
    pub fn new(seq: u64, state: MaterializedState) -> Self {
        Self { version: CURRENT_SNAPSHOT_VERSION, seq, state, created_at: Utc::now() }
    }

    pub(crate) fn decode(raw: &str) -> Result<Self, SnapshotError> {
        // Check the version before committing to the full schema
        #[derive(Deserialize)]
        struct Header {
            #[serde(rename = "v")]
            version: u32,
        }
        let header: Header = serde_json::from_str(raw)?;
        if header.version > CURRENT_SNAPSHOT_VERSION {
            return Err(SnapshotError::UnsupportedVersion {
                found: header.version,
                supported: CURRENT_SNAPSHOT_VERSION,
            });
        }
        Ok(serde_json::from_str(raw)?)
    }
}
