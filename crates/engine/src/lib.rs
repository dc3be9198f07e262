// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dg-engine: Safety decisions over the materialized state.
//!
//! Every operation decides against a consistent view of the state and turns
//! its outcome into one batch of events. The [`Ledger`] journals the batch
//! and applies it, so an operation is persisted whole or not at all.

mod audit;
mod breaker;
mod config;
mod guard;
mod ledger;
mod lock;
mod orchestrator;
mod registry;

#[cfg(test)]
mod test_helpers;

pub use config::GuardConfig;
pub use guard::Guard;
pub use ledger::Ledger;
pub use lock::AcquireRequest;
pub use orchestrator::{RedeployRequest, RollbackRequest};
pub use registry::{RecordArtifact, StatusUpdate, TestResultInput};
