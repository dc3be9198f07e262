// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The single writer: decides against state, journals, then applies.

use crate::config::GuardConfig;
use dg_core::{Event, GuardError};
use dg_storage::{load_snapshot, Checkpointer, Journal, MaterializedState, StateStore};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info, warn};

struct LedgerInner {
    state: MaterializedState,
    journal: Journal,
    checkpointer: Checkpointer,
}

/// Owns the materialized state and its durable history.
///
/// All mutations go through [`Ledger::commit`], which holds the state mutex
/// from the decision until the resulting batch is applied. Two operations
/// can therefore never decide against the same stale view.
pub struct Ledger {
    inner: Mutex<LedgerInner>,
}

impl Ledger {
    /// Rebuild state from `store`: the latest snapshot, then every readable
    /// journal entry after it.
    pub fn open(store: Arc<dyn StateStore>, config: &GuardConfig) -> Result<Self, GuardError> {
        let (mut state, base_seq) = match load_snapshot(store.as_ref())? {
            Some(snapshot) => {
                info!(seq = snapshot.seq, created_at = %snapshot.created_at, "loaded snapshot");
                (snapshot.state, snapshot.seq)
            }
            None => (
                MaterializedState::with_thresholds(
                    config.recovery_threshold,
                    config.deployment_threshold,
                ),
                0,
            ),
        };
        state.health.set_limit(config.health_history_limit);

        let journal = Journal::open(Arc::clone(&store), base_seq)?;
        let entries = journal.entries_after(base_seq)?;
        let mut replayed = 0usize;
        for entry in &entries {
            for event in &entry.events {
                state.apply_event(event);
                replayed += 1;
            }
        }
        info!(
            base_seq,
            entries = entries.len(),
            events = replayed,
            write_seq = journal.write_seq(),
            "state recovered"
        );

        let checkpointer = Checkpointer::new(store, config.snapshot_every, base_seq);
        Ok(Self { inner: Mutex::new(LedgerInner { state, journal, checkpointer }) })
    }

    /// Run `f` against a consistent view of the state
    pub fn read<T>(&self, f: impl FnOnce(&MaterializedState) -> T) -> T {
        f(&self.inner.lock().state)
    }

    /// Decide, journal and apply one operation.
    ///
    /// `decide` sees the current state and returns the batch to commit. An
    /// error from `decide` or from the journal leaves state untouched.
    pub fn commit<T>(
        &self,
        decide: impl FnOnce(&MaterializedState) -> Result<(Vec<Event>, T), GuardError>,
    ) -> Result<T, GuardError> {
        self.commit_and_view(decide, |_, value| value)
    }

    /// Like [`Ledger::commit`], then build a result from the updated state
    /// before the mutex is released.
    pub fn commit_and_view<T, V>(
        &self,
        decide: impl FnOnce(&MaterializedState) -> Result<(Vec<Event>, T), GuardError>,
        view: impl FnOnce(&MaterializedState, T) -> V,
    ) -> Result<V, GuardError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let (events, value) = decide(&inner.state)?;
        if events.is_empty() {
            return Ok(view(&inner.state, value));
        }

        let seq = inner.journal.append(&events)?;
        for event in &events {
            debug!(seq, event = %event.log_summary(), "apply");
            inner.state.apply_event(event);
        }

        if inner.checkpointer.is_due(seq) {
            if let Err(e) = inner.checkpointer.checkpoint(&inner.state, &inner.journal) {
                warn!(seq, error = %e, "checkpoint failed, journal keeps growing");
            }
        }
        Ok(view(&inner.state, value))
    }

    /// Snapshot now if anything was committed since the last checkpoint
    pub fn checkpoint(&self) -> Result<u64, GuardError> {
        let mut guard = self.inner.lock();
        let inner = &mut *guard;
        let seq = inner.journal.write_seq();
        if seq == inner.checkpointer.last_seq() {
            return Ok(seq);
        }
        Ok(inner.checkpointer.checkpoint(&inner.state, &inner.journal)?)
    }

    /// Sequence of the last committed batch
    pub fn write_seq(&self) -> u64 {
        self.inner.lock().journal.write_seq()
    }
}

#[cfg(test)]
#[path = "ledger_tests.rs"]
mod tests;
