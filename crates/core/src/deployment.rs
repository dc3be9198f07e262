// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! What is deployed, what to roll back to, and recovery bookkeeping

use crate::digest::Digest;
use serde::{Deserialize, Serialize};

/// Current and last known-good deployed digests.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeploymentPointers {
    #[serde(default)]
    pub current: Option<Digest>,
    /// Previously deployed digest, the `latest-backup` rollback target
    #[serde(default)]
    pub backup: Option<Digest>,
    #[serde(default)]
    pub deployed_at_ms: Option<u64>,
}

impl DeploymentPointers {
    /// Record `digest` as deployed. The previous current becomes the backup;
    /// redeploying the current digest only refreshes the timestamp.
    pub fn record_deployed(&mut self, digest: &Digest, at_ms: u64) {
        if self.current.as_ref() != Some(digest) {
            if let Some(previous) = self.current.take() {
                self.backup = Some(previous);
            }
            self.current = Some(digest.clone());
        }
        self.deployed_at_ms = Some(at_ms);
    }

    /// Both pointers name the same digest, so a backup rollback is a no-op
    pub fn backup_matches_current(&self) -> bool {
        self.current.is_some() && self.current == self.backup
    }
}

/// What a deploy step should roll out.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DeployTarget {
    Digest { digest: Digest },
    /// Lower-safety fallback: a deploy file that bypasses digest validation
    File { path: String },
}

impl DeployTarget {
    pub fn digest(&self) -> Option<&Digest> {
        match self {
            DeployTarget::Digest { digest } => Some(digest),
            DeployTarget::File { .. } => None,
        }
    }
}

impl std::fmt::Display for DeployTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeployTarget::Digest { digest } => write!(f, "{digest}"),
            DeployTarget::File { path } => write!(f, "file:{path}"),
        }
    }
}

/// How a rollback target is resolved
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum RollbackMode {
    LatestBackup,
    SpecificDigest,
    FileBased,
}

crate::simple_display! {
    RollbackMode {
        LatestBackup => "latest-backup",
        SpecificDigest => "specific-digest",
        FileBased => "file-based",
    }
}

crate::parse_enum! {
    RollbackMode, "rollback target" {
        "latest-backup" => LatestBackup,
        "specific-digest" => SpecificDigest,
        "file-based" => FileBased,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryTrigger {
    pub at_ms: u64,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryCompletion {
    pub at_ms: u64,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedeployRecord {
    pub started_at_ms: u64,
    pub target: DeployTarget,
    pub run_id: String,
    /// `None` while the deploy is still running
    #[serde(default)]
    pub success: Option<bool>,
    #[serde(default)]
    pub finished_at_ms: Option<u64>,
}

/// Most recent recovery and redeployment activity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecoveryHistory {
    #[serde(default)]
    pub last_trigger: Option<RecoveryTrigger>,
    #[serde(default)]
    pub last_completion: Option<RecoveryCompletion>,
    #[serde(default)]
    pub last_redeploy: Option<RedeployRecord>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::test_digest;

    #[test]
    fn first_deploy_has_no_backup() {
        let mut p = DeploymentPointers::default();
        p.record_deployed(&test_digest(1), 10);
        assert_eq!(p.current, Some(test_digest(1)));
        assert_eq!(p.backup, None);
    }

    #[test]
    fn second_deploy_moves_current_to_backup() {
        let mut p = DeploymentPointers::default();
        p.record_deployed(&test_digest(1), 10);
        p.record_deployed(&test_digest(2), 20);
        assert_eq!(p.current, Some(test_digest(2)));
        assert_eq!(p.backup, Some(test_digest(1)));
        assert_eq!(p.deployed_at_ms, Some(20));
    }

    #[test]
    fn redeploying_current_keeps_backup() {
        let mut p = DeploymentPointers::default();
        p.record_deployed(&test_digest(1), 10);
        p.record_deployed(&test_digest(2), 20);
        p.record_deployed(&test_digest(2), 30);
        assert_eq!(p.backup, Some(test_digest(1)));
        assert_eq!(p.deployed_at_ms, Some(30));
    }

    #[test]
    fn rollback_mode_parses_kebab_case() {
        assert_eq!("latest-backup".parse::<RollbackMode>().unwrap(), RollbackMode::LatestBackup);
        assert!("latest".parse::<RollbackMode>().is_err());
    }
}
