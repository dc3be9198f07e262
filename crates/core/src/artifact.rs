// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Built artifacts and their lifecycle

use crate::digest::Digest;
use serde::{Deserialize, Serialize};

/// Lifecycle status of an artifact.
///
/// `built → testing → {deployable | failed} → deployed`. Only the forward
/// edges are legal; anything else requires an audited administrative
/// override.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArtifactStatus {
    Built,
    Testing,
    Deployable,
    Failed,
    Deployed,
}

crate::simple_display! {
    ArtifactStatus {
        Built => "built",
        Testing => "testing",
        Deployable => "deployable",
        Failed => "failed",
        Deployed => "deployed",
    }
}

crate::parse_enum! {
    ArtifactStatus, "artifact status" {
        "built" => Built,
        "testing" => Testing,
        "deployable" => Deployable,
        "failed" => Failed,
        "deployed" => Deployed,
    }
}

impl ArtifactStatus {
    /// Statuses reachable from `self` without an override
    pub fn successors(self) -> &'static [ArtifactStatus] {
        match self {
            ArtifactStatus::Built => &[ArtifactStatus::Testing],
            ArtifactStatus::Testing => &[ArtifactStatus::Deployable, ArtifactStatus::Failed],
            ArtifactStatus::Deployable => &[ArtifactStatus::Deployed],
            ArtifactStatus::Failed | ArtifactStatus::Deployed => &[],
        }
    }

    pub fn can_transition_to(self, next: ArtifactStatus) -> bool {
        self.successors().contains(&next)
    }

    /// Whether an artifact in this status may be (re)deployed
    pub fn is_deployable(self) -> bool {
        matches!(self, ArtifactStatus::Deployable | ArtifactStatus::Deployed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestStatus {
    Passed,
    Failed,
    Skipped,
}

crate::simple_display! {
    TestStatus {
        Passed => "passed",
        Failed => "failed",
        Skipped => "skipped",
    }
}

crate::parse_enum! {
    TestStatus, "test status" {
        "passed" => Passed,
        "failed" => Failed,
        "skipped" => Skipped,
    }
}

/// One recorded test outcome. Recording never changes the artifact status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_type: String,
    pub status: TestStatus,
    pub at_ms: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// Registry record for one built artifact, keyed by digest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Artifact {
    pub digest: Digest,
    pub revision: String,
    pub status: ArtifactStatus,
    /// Registry/repository the artifact was pushed to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    #[serde(default)]
    pub test_results: Vec<TestResult>,
    pub created_at_ms: u64,
    pub updated_at_ms: u64,
}

impl Artifact {
    pub fn new(revision: impl Into<String>, digest: Digest, at_ms: u64) -> Self {
        Self {
            digest,
            revision: revision.into(),
            status: ArtifactStatus::Built,
            location: None,
            test_results: Vec::new(),
            created_at_ms: at_ms,
            updated_at_ms: at_ms,
        }
    }

    pub fn with_location(mut self, location: Option<String>) -> Self {
        self.location = location;
        self
    }

    /// Latest result per test type, in first-seen order
    pub fn latest_results(&self) -> Vec<&TestResult> {
        let mut latest: Vec<&TestResult> = Vec::new();
        for result in &self.test_results {
            match latest.iter_mut().find(|r| r.test_type == result.test_type) {
                Some(slot) => *slot = result,
                None => latest.push(result),
            }
        }
        latest
    }

    pub fn all_tests_passed(&self) -> bool {
        let latest = self.latest_results();
        !latest.is_empty() && latest.iter().all(|r| r.status != TestStatus::Failed)
    }
}

#[cfg(test)]
#[path = "artifact_tests.rs"]
mod tests;
