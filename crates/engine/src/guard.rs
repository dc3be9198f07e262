// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The guard: every command of the safety layer, over one ledger.

use crate::config::GuardConfig;
use crate::ledger::Ledger;
use dg_adapters::{ArtifactResolver, Deployer};
use dg_core::{Clock, StateContext};

/// Entry point for all operations.
///
/// Generic over its boundaries so tests can swap in fakes for the artifact
/// store, the deploy step, and time.
pub struct Guard<R: ArtifactResolver, D: Deployer, C: Clock> {
    pub(crate) ledger: Ledger,
    pub(crate) resolver: R,
    pub(crate) deployer: D,
    pub(crate) clock: C,
    pub(crate) config: GuardConfig,
}

impl<R: ArtifactResolver, D: Deployer, C: Clock> Guard<R, D, C> {
    pub fn new(ledger: Ledger, resolver: R, deployer: D, clock: C, config: GuardConfig) -> Self {
        Self { ledger, resolver, deployer, clock, config }
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn config(&self) -> &GuardConfig {
        &self.config
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    pub(crate) fn now(&self) -> u64 {
        self.clock.epoch_ms()
    }

    /// Breaker, lock and (optionally) artifact state attached to failures
    pub fn context(&self, digest: Option<&str>) -> StateContext {
        let now = self.now();
        self.ledger.read(|state| state.context(now, digest))
    }
}

#[cfg(test)]
#[path = "guard_tests/mod.rs"]
mod tests;
