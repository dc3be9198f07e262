// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Tunables the engine consults when deciding

use dg_core::breaker::{DEPLOYMENT_THRESHOLD_DEFAULT, RECOVERY_THRESHOLD_DEFAULT};
use dg_core::health::HEALTH_HISTORY_LIMIT_DEFAULT;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GuardConfig {
    /// Consecutive non-healthy samples before recovery is triggered
    pub recovery_trigger_threshold: u32,
    pub health_history_limit: usize,
    /// Lock age after which the consistency report flags it as stuck
    pub stale_lock_secs: u64,
    /// Committed batches between checkpoints
    pub snapshot_every: u64,
    /// Initial thresholds for a fresh state; ignored once state exists
    pub recovery_threshold: u32,
    pub deployment_threshold: u32,
    /// Artifact store location used when neither the caller nor the
    /// artifact record names one
    pub default_location: Option<String>,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            recovery_trigger_threshold: 3,
            health_history_limit: HEALTH_HISTORY_LIMIT_DEFAULT,
            stale_lock_secs: 30 * 60,
            snapshot_every: 100,
            recovery_threshold: RECOVERY_THRESHOLD_DEFAULT,
            deployment_threshold: DEPLOYMENT_THRESHOLD_DEFAULT,
            default_location: None,
        }
    }
}
