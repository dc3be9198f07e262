// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Sequenced event journal on top of a [`StateStore`].
//!
//! Each committed operation is one entry under `journal/<seq>`, holding the
//! whole batch of events that operation produced. A batch therefore lands
//! atomically or not at all.

use crate::store::{StateStore, StoreError};
use dg_core::Event;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::warn;

pub const JOURNAL_PREFIX: &str = "journal/";

#[derive(Debug, Error)]
pub enum JournalError {
    #[error("store error: {0}")]
    Store(#[from] StoreError),
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("journal entry {0} already exists (another writer is active)")]
    SeqTaken(u64),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub seq: u64,
    pub events: Vec<Event>,
}

pub struct Journal {
    store: Arc<dyn StateStore>,
    write_seq: u64,
}

fn key_for(seq: u64) -> String {
    format!("{JOURNAL_PREFIX}{seq:020}")
}

fn seq_of(key: &str) -> Option<u64> {
    key.strip_prefix(JOURNAL_PREFIX)?.parse().ok()
}

impl Journal {
    /// Open the journal, positioned after the last readable entry.
    ///
    /// `base_seq` is the sequence already covered by a snapshot. An entry that
    /// fails to parse ends the readable journal; it and anything after it are
    /// discarded with a warning, matching what replay will have seen.
    pub fn open(store: Arc<dyn StateStore>, base_seq: u64) -> Result<Self, JournalError> {
        let mut journal = Self { store, write_seq: base_seq };
        let readable = journal.entries_after(base_seq)?;
        if let Some(last) = readable.last() {
            journal.write_seq = last.seq;
        }
        for key in journal.store.keys(JOURNAL_PREFIX)? {
            if seq_of(&key).is_some_and(|seq| seq > journal.write_seq) {
                warn!(key = %key, "discarding unreadable journal tail");
                journal.store.delete(&key)?;
            }
        }
        Ok(journal)
    }

    /// Sequence number of the last committed entry
    pub fn write_seq(&self) -> u64 {
        self.write_seq
    }

    /// Commit a batch. Fails without side effects if the next sequence number
    /// was already claimed by someone else.
    pub fn append(&mut self, events: &[Event]) -> Result<u64, JournalError> {
        let seq = self.write_seq + 1;
        let entry = JournalEntry { seq, events: events.to_vec() };
        let json = serde_json::to_string(&entry)?;
        if !self.store.compare_and_swap(&key_for(seq), None, &json)? {
            return Err(JournalError::SeqTaken(seq));
        }
        self.write_seq = seq;
        Ok(seq)
    }

    /// Contiguous entries after `seq`, stopping at the first gap or
    /// unreadable entry.
    pub fn entries_after(&self, seq: u64) -> Result<Vec<JournalEntry>, JournalError> {
        let mut entries = Vec::new();
        let mut next = seq + 1;
        while let Some(raw) = self.store.get(&key_for(next))? {
            match serde_json::from_str::<JournalEntry>(&raw) {
                Ok(entry) if entry.seq == next => entries.push(entry),
                Ok(entry) => {
                    warn!(expected = next, found = entry.seq, "journal sequence mismatch");
                    break;
                }
                Err(e) => {
                    warn!(seq = next, error = %e, "unreadable journal entry");
                    break;
                }
            }
            next += 1;
        }
        Ok(entries)
    }

    /// Delete every entry with sequence `<= seq`. Returns how many were removed.
    pub fn truncate_through(&self, seq: u64) -> Result<usize, JournalError> {
        let mut removed = 0;
        for key in self.store.keys(JOURNAL_PREFIX)? {
            if seq_of(&key).is_some_and(|s| s <= seq) {
                self.store.delete(&key)?;
                removed += 1;
            }
        }
        Ok(removed)
    }
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
