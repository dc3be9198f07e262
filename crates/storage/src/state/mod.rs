// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Materialized state derived from journal replay

mod artifacts;
mod breakers;
mod operations;

use dg_core::breaker::{DEPLOYMENT_THRESHOLD_DEFAULT, RECOVERY_THRESHOLD_DEFAULT};
use dg_core::{
    Artifact, ArtifactSummary, AuditEntry, BreakerTrack, DeploymentPointers, Digest, Event,
    HealthHistory, LockHolder, LockStatus, RecoveryHistory, StateContext, Track,
};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Everything the daemon knows, rebuilt from snapshot + journal on startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaterializedState {
    /// Artifacts keyed by digest, in recording order
    #[serde(default)]
    pub artifacts: IndexMap<Digest, Artifact>,
    /// Immutable revision → digest mapping
    #[serde(default)]
    pub revisions: HashMap<String, Digest>,
    pub recovery_breaker: BreakerTrack,
    pub deployment_breaker: BreakerTrack,
    #[serde(default)]
    pub lock: Option<LockHolder>,
    #[serde(default)]
    pub health: HealthHistory,
    #[serde(default)]
    pub audit: Vec<AuditEntry>,
    #[serde(default)]
    pub deployment: DeploymentPointers,
    #[serde(default)]
    pub recovery: RecoveryHistory,
}

impl Default for MaterializedState {
    fn default() -> Self {
        Self::with_thresholds(RECOVERY_THRESHOLD_DEFAULT, DEPLOYMENT_THRESHOLD_DEFAULT)
    }
}

impl MaterializedState {
    /// Fresh state with the given initial breaker thresholds
    pub fn with_thresholds(recovery: u32, deployment: u32) -> Self {
        Self {
            artifacts: IndexMap::new(),
            revisions: HashMap::new(),
            recovery_breaker: BreakerTrack::new(Track::Recovery, recovery),
            deployment_breaker: BreakerTrack::new(Track::Deployment, deployment),
            lock: None,
            health: HealthHistory::default(),
            audit: Vec::new(),
            deployment: DeploymentPointers::default(),
            recovery: RecoveryHistory::default(),
        }
    }

    pub fn breaker(&self, track: Track) -> &BreakerTrack {
        match track {
            Track::Recovery => &self.recovery_breaker,
            Track::Deployment => &self.deployment_breaker,
        }
    }

    pub(crate) fn breaker_mut(&mut self, track: Track) -> &mut BreakerTrack {
        match track {
            Track::Recovery => &mut self.recovery_breaker,
            Track::Deployment => &mut self.deployment_breaker,
        }
    }

    pub fn artifact(&self, digest: &str) -> Option<&Artifact> {
        self.artifacts.get(digest)
    }

    pub fn digest_for_revision(&self, revision: &str) -> Option<&Digest> {
        self.revisions.get(revision)
    }

    pub fn lock_status(&self, now_ms: u64) -> LockStatus {
        LockStatus::from_holder(self.lock.as_ref(), now_ms)
    }

    /// Current breaker/lock/artifact picture for decisions and errors
    pub fn context(&self, now_ms: u64, digest: Option<&str>) -> StateContext {
        StateContext {
            breakers: Track::ALL.iter().map(|t| self.breaker(*t).status()).collect(),
            lock: self.lock_status(now_ms),
            artifact: digest.and_then(|d| self.artifact(d)).map(|a| ArtifactSummary {
                digest: a.digest.clone(),
                revision: a.revision.clone(),
                status: a.status,
            }),
            consecutive_degraded: self.health.consecutive_degraded(),
        }
    }

    /// Apply an event to derive state changes.
    ///
    /// # Replay Contract
    ///
    /// Each journal batch is applied exactly once: recovery loads the
    /// snapshot at sequence `n` and replays only records `n + 1..`. A crash
    /// between snapshot write and journal truncation leaves stale records at
    /// or below `n`, which are skipped, never re-applied.
    ///
    /// - events carry resulting values where they can, handlers assign them
    /// - health samples and test results are facts and always append
    /// - keyed inserts (artifacts, audit entries) still check for existence
    pub fn apply_event(&mut self, event: &Event) {
        match event {
            Event::ArtifactRecorded { .. }
            | Event::ArtifactStatusChanged { .. }
            | Event::TestResultRecorded { .. } => artifacts::apply(self, event),

            Event::BreakerFailureRecorded { .. }
            | Event::BreakerOpened { .. }
            | Event::BreakerClosed { .. }
            | Event::BreakerThresholdSet { .. } => breakers::apply(self, event),

            Event::DeploymentRecorded { .. }
            | Event::LockAcquired { .. }
            | Event::LockReleased { .. }
            | Event::LockCleared { .. }
            | Event::HealthRecorded { .. }
            | Event::RecoveryTriggered { .. }
            | Event::RecoveryCompleted { .. }
            | Event::RedeployStarted { .. }
            | Event::RedeployFinished { .. } => operations::apply(self, event),

            Event::AuditAppended { entry } => {
                if !self.audit.iter().rev().any(|e| e.id == entry.id) {
                    self.audit.push(entry.clone());
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "../state_tests/mod.rs"]
mod tests;
