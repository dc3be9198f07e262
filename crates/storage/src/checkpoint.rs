// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Checkpointing: write a snapshot, then drop the journal entries it covers.

use crate::journal::Journal;
use crate::snapshot::{Snapshot, SnapshotError, SNAPSHOT_BAK_KEY, SNAPSHOT_KEY};
use crate::state::MaterializedState;
use crate::store::StateStore;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Load the latest snapshot, if any.
///
/// A snapshot that exists but cannot be read is an error, never treated as
/// absent: starting from empty state would silently forget open breakers
/// and held locks.
pub fn load_snapshot(store: &dyn StateStore) -> Result<Option<Snapshot>, SnapshotError> {
    match store.get(SNAPSHOT_KEY)? {
        Some(raw) => Snapshot::decode(&raw).map(Some),
        None => Ok(None),
    }
}

pub struct Checkpointer {
    store: Arc<dyn StateStore>,
    /// Snapshot after this many committed entries
    every: u64,
    last_seq: u64,
}

impl Checkpointer {
    pub fn new(store: Arc<dyn StateStore>, every: u64, last_seq: u64) -> Self {
        Self { store, every: every.max(1), last_seq }
    }

    /// Whether enough entries accumulated since the last checkpoint
    pub fn is_due(&self, write_seq: u64) -> bool {
        write_seq.saturating_sub(self.last_seq) >= self.every
    }

    pub fn last_seq(&self) -> u64 {
        self.last_seq
    }

    /// Persist `state` as of `journal.write_seq()` and truncate the journal.
    ///
    /// The previous snapshot is kept under the backup key. If truncation fails
    /// after the snapshot is written, replay still starts after the snapshot
    /// sequence, so stale entries are harmless and removed next time.
    pub fn checkpoint(
        &mut self,
        state: &MaterializedState,
        journal: &Journal,
    ) -> Result<u64, SnapshotError> {
        let seq = journal.write_seq();
        let json = serde_json::to_string(&Snapshot::new(seq, state.clone()))?;
        if let Some(previous) = self.store.get(SNAPSHOT_KEY)? {
            self.store.set(SNAPSHOT_BAK_KEY, &previous)?;
        }
        self.store.set(SNAPSHOT_KEY, &json)?;
        self.last_seq = seq;

        match journal.truncate_through(seq) {
            Ok(removed) => debug!(seq, removed, "journal truncated"),
            Err(e) => warn!(seq, error = %e, "journal truncation failed"),
        }
        info!(seq, bytes = json.len(), "checkpoint written");
        Ok(seq)
    }
}

#[cfg(test)]
#[path = "checkpoint_tests.rs"]
mod tests;
