// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dg-storage: Key-value state store, event journal, and materialized state

mod checkpoint;
mod file;
mod journal;
mod memory;
mod snapshot;
mod state;
mod store;

pub use checkpoint::{load_snapshot, Checkpointer};
pub use file::FileStore;
pub use journal::{Journal, JournalEntry, JournalError, JOURNAL_PREFIX};
pub use memory::MemoryStore;
pub use snapshot::{Snapshot, SnapshotError, CURRENT_SNAPSHOT_VERSION, SNAPSHOT_BAK_KEY, SNAPSHOT_KEY};
pub use state::MaterializedState;
pub use store::{validate_key, StateStore, StoreError};

use dg_core::GuardError;

impl From<StoreError> for GuardError {
    fn from(e: StoreError) -> Self {
        GuardError::StateStore(e.to_string())
    }
}

impl From<JournalError> for GuardError {
    fn from(e: JournalError) -> Self {
        GuardError::StateStore(e.to_string())
    }
}

impl From<SnapshotError> for GuardError {
    fn from(e: SnapshotError) -> Self {
        GuardError::StateStore(e.to_string())
    }
}
