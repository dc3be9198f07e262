// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact registry: one record per built digest.
//!
//! The revision → digest mapping is write-once. Status moves forward along
//! `built → testing → {deployable | failed} → deployed`; anything else needs
//! a forced, audited override.

use crate::audit;
use crate::guard::Guard;
use dg_adapters::{ArtifactResolver, Deployer, Resolution};
use dg_core::{
    validate_manual_action, Artifact, ArtifactStatus, AuditEntry, AuditOutcome, Clock, Digest,
    DigestValidation, Event, GuardError, Sensitivity, TestResult, TestStatus,
};
use serde_json::json;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct RecordArtifact {
    pub revision: String,
    pub digest: String,
    pub location: Option<String>,
    pub at_ms: Option<u64>,
    pub actor: String,
}

#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub digest: String,
    pub status: ArtifactStatus,
    pub at_ms: Option<u64>,
    /// Permit a non-monotonic transition
    pub force: bool,
    pub reason: Option<String>,
    pub actor: String,
}

#[derive(Debug, Clone)]
pub struct TestResultInput {
    pub digest: String,
    pub test_type: String,
    pub status: TestStatus,
    pub at_ms: Option<u64>,
    pub details: Option<String>,
    pub actor: String,
}

fn unknown_digest(digest: &Digest) -> GuardError {
    GuardError::NotFound(format!("no artifact recorded for {digest}"))
}

impl<R: ArtifactResolver, D: Deployer, C: Clock> Guard<R, D, C> {
    /// Digest recorded for `revision`, if any. Never mutates state.
    pub fn check_existing(&self, revision: &str) -> Option<Digest> {
        self.ledger.read(|state| state.digest_for_revision(revision).cloned())
    }

    /// Like [`Guard::check_existing`], but a missing revision is an error: the
    /// build for it never reached the artifact stage.
    pub fn get_digest(&self, revision: &str) -> Result<Digest, GuardError> {
        self.check_existing(revision).ok_or_else(|| {
            GuardError::NotFound(format!(
                "no artifact recorded for revision {revision}; the build did not reach the artifact stage"
            ))
        })
    }

    pub fn artifact(&self, digest: &str) -> Result<Artifact, GuardError> {
        let digest = Digest::parse(digest)?;
        self.ledger
            .read(|state| state.artifact(digest.as_str()).cloned())
            .ok_or_else(|| unknown_digest(&digest))
    }

    /// Every artifact, newest first
    pub fn artifacts(&self) -> Vec<Artifact> {
        self.ledger.read(|state| {
            let mut all: Vec<Artifact> = state.artifacts.values().rev().cloned().collect();
            all.sort_by(|a, b| b.created_at_ms.cmp(&a.created_at_ms));
            all
        })
    }

    pub fn record_artifact(&self, req: RecordArtifact) -> Result<Artifact, GuardError> {
        let digest = Digest::parse(&req.digest)?;
        let revision = req.revision.trim().to_string();
        if revision.is_empty() {
            return Err(GuardError::validation("revision must not be empty"));
        }
        let now = self.now();
        let at_ms = req.at_ms.unwrap_or(now);

        let artifact = self.ledger.commit_and_view(
            |state| {
                if let Some(existing) = state.digest_for_revision(&revision) {
                    if existing != &digest {
                        return Err(GuardError::Conflict(format!(
                            "revision {revision} is already recorded with {existing}"
                        )));
                    }
                    return Ok((Vec::new(), false));
                }
                let entry = AuditEntry::new(&req.actor, "artifact.record", now).inputs(json!({
                    "revision": revision,
                    "digest": digest,
                    "location": req.location,
                }));
                let events = vec![
                    Event::ArtifactRecorded {
                        revision: revision.clone(),
                        digest: digest.clone(),
                        location: req.location.clone(),
                        at_ms,
                    },
                    audit::append(entry),
                ];
                Ok((events, true))
            },
            |state, created| (state.artifact(digest.as_str()).cloned(), created),
        )?;

        match artifact {
            (Some(artifact), created) => {
                if created {
                    info!(%revision, digest = %digest.short(), "artifact recorded");
                }
                Ok(artifact)
            }
            (None, _) => Err(unknown_digest(&digest)),
        }
    }

    /// Confirm the digest is well formed and resolvable in the artifact store.
    ///
    /// The location is taken from the caller, then the artifact record, then
    /// configuration. Stores that cannot be queried defer to the registry:
    /// the digest must have been recorded.
    pub async fn validate_digest(
        &self,
        digest: &str,
        location: Option<&str>,
    ) -> Result<DigestValidation, GuardError> {
        let digest = Digest::parse(digest)?;
        let (recorded, location) = self.ledger.read(|state| {
            let artifact = state.artifact(digest.as_str());
            let location = location
                .map(str::to_string)
                .or_else(|| artifact.and_then(|a| a.location.clone()))
                .or_else(|| self.config.default_location.clone());
            (artifact.is_some(), location.unwrap_or_default())
        });

        match self.resolver.resolve(&location, &digest).await? {
            Resolution::Found => {
                Ok(DigestValidation { digest, location, verified_externally: true })
            }
            Resolution::Missing => Err(GuardError::NotFound(format!(
                "{digest} does not resolve in artifact store {location}"
            ))),
            Resolution::Unverified if recorded => {
                Ok(DigestValidation { digest, location, verified_externally: false })
            }
            Resolution::Unverified => Err(GuardError::NotFound(format!(
                "{digest} is not recorded in the artifact registry"
            ))),
        }
    }

    pub fn update_status(&self, req: StatusUpdate) -> Result<Artifact, GuardError> {
        let digest = Digest::parse(&req.digest)?;
        if req.force {
            validate_manual_action(&req.actor, req.reason.as_deref(), Sensitivity::Bypass)?;
        }
        let now = self.now();
        let at_ms = req.at_ms.unwrap_or(now);
        let to = req.status;

        let (artifact, forced) = self.ledger.commit_and_view(
            |state| {
                let current = state.artifact(digest.as_str()).ok_or_else(|| unknown_digest(&digest))?;
                let from = current.status;
                let legal = from.can_transition_to(to);
                if !legal && !req.force {
                    return Err(GuardError::InvalidTransition { from, to });
                }
                if from == to {
                    return Ok((Vec::new(), false));
                }
                let forced = !legal;
                let entry = AuditEntry::new(&req.actor, "artifact.status", now)
                    .inputs(json!({
                        "digest": digest,
                        "from": from,
                        "to": to,
                        "force": req.force,
                        "reason": req.reason,
                    }))
                    .outcome(if forced { AuditOutcome::Override } else { AuditOutcome::Success });
                let mut events = vec![Event::ArtifactStatusChanged {
                    digest: digest.clone(),
                    from,
                    to,
                    forced,
                    at_ms,
                }];
                if to == ArtifactStatus::Deployed {
                    events.push(Event::DeploymentRecorded { digest: digest.clone(), at_ms });
                }
                events.push(audit::append(entry));
                Ok((events, forced))
            },
            |state, forced| (state.artifact(digest.as_str()).cloned(), forced),
        )?;

        if forced {
            warn!(digest = %digest.short(), status = %to, actor = %req.actor, "forced artifact status override");
        }
        artifact.ok_or_else(|| unknown_digest(&digest))
    }

    /// Append a test outcome. The artifact's status is left alone; the caller
    /// decides the transition after interpreting the results.
    pub fn record_test_result(&self, req: TestResultInput) -> Result<Artifact, GuardError> {
        let digest = Digest::parse(&req.digest)?;
        let test_type = req.test_type.trim().to_string();
        if test_type.is_empty() {
            return Err(GuardError::validation("test type must not be empty"));
        }
        let now = self.now();
        let result = TestResult {
            test_type,
            status: req.status,
            at_ms: req.at_ms.unwrap_or(now),
            details: req.details.clone(),
        };

        let artifact = self.ledger.commit_and_view(
            |state| {
                if state.artifact(digest.as_str()).is_none() {
                    return Err(unknown_digest(&digest));
                }
                let entry = AuditEntry::new(&req.actor, "artifact.test", now).inputs(json!({
                    "digest": digest,
                    "test_type": result.test_type,
                    "status": result.status,
                }));
                let events = vec![
                    Event::TestResultRecorded { digest: digest.clone(), result: result.clone() },
                    audit::append(entry),
                ];
                Ok((events, ()))
            },
            |state, ()| state.artifact(digest.as_str()).cloned(),
        )?;
        artifact.ok_or_else(|| unknown_digest(&digest))
    }
}

#[cfg(test)]
#[path = "registry_tests.rs"]
mod tests;
