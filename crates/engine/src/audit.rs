// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Audit log queries and entry helpers

use crate::guard::Guard;
use dg_adapters::{ArtifactResolver, Deployer};
use dg_core::{AuditEntry, Clock, Event};

pub(crate) fn append(entry: AuditEntry) -> Event {
    Event::AuditAppended { entry }
}

impl<R: ArtifactResolver, D: Deployer, C: Clock> Guard<R, D, C> {
    /// Most recent entries first, at most `limit` of them
    pub fn audit_entries(&self, limit: Option<usize>) -> Vec<AuditEntry> {
        self.ledger.read(|state| {
            let newest_first = state.audit.iter().rev().cloned();
            match limit {
                Some(n) => newest_first.take(n).collect(),
                None => newest_first.collect(),
            }
        })
    }

    /// The whole log in append order, for export
    pub fn audit_log(&self) -> Vec<AuditEntry> {
        self.ledger.read(|state| state.audit.clone())
    }
}
