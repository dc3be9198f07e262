// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Typed query and command methods for DaemonClient.

use dg_core::{
    AcquireOutcome, Artifact, ArtifactStatus, AuditEntry, BreakerEvent, BreakerExport,
    BreakerStatus, ConsistencyReport, DecisionReport, Digest, DigestValidation, HealthStatus,
    LockHolder, LockStatus, RecoveryHistory, RollbackMode, TestStatus, Track, TrackCheck,
};
use dg_wire::{DaemonStatus, Query, Request, Response};

use super::{ClientError, DaemonClient};

/// Rollback parameters as given on the command line
pub struct RollbackArgs {
    pub mode: RollbackMode,
    pub digest: Option<String>,
    pub file: Option<String>,
    pub location: Option<String>,
    pub run_id: String,
    pub reason: Option<String>,
    pub override_breaker: bool,
    pub emergency: bool,
}

impl DaemonClient {
    async fn query(&self, query: Query) -> Result<Response, ClientError> {
        self.send(&Request::Query { query }).await
    }

    async fn decision(&self, request: Request) -> Result<DecisionReport, ClientError> {
        match self.send(&request).await? {
            Response::Decision { report } => Ok(*report),
            other => Self::reject(other),
        }
    }

    async fn artifact_response(&self, request: Request) -> Result<Artifact, ClientError> {
        match self.send(&request).await? {
            Response::Artifact { artifact } => Ok(*artifact),
            other => Self::reject(other),
        }
    }

    async fn breakers_response(&self, request: Request) -> Result<Vec<BreakerStatus>, ClientError> {
        match self.send(&request).await? {
            Response::Breakers { breakers } => Ok(breakers),
            other => Self::reject(other),
        }
    }

    pub async fn status(&self) -> Result<DaemonStatus, ClientError> {
        match self.send(&Request::Status).await? {
            Response::Status { status } => Ok(*status),
            other => Self::reject(other),
        }
    }

    pub async fn shutdown(&self) -> Result<(), ClientError> {
        match self.send(&Request::Shutdown).await? {
            Response::ShuttingDown | Response::Ok => Ok(()),
            other => Self::reject(other),
        }
    }

    // -- artifacts --

    pub async fn check_existing(&self, revision: &str) -> Result<Option<Digest>, ClientError> {
        match self.query(Query::CheckExisting { revision: revision.to_string() }).await? {
            Response::Existing { digest } => Ok(digest),
            other => Self::reject(other),
        }
    }

    pub async fn get_digest(&self, revision: &str) -> Result<Digest, ClientError> {
        match self.query(Query::GetDigest { revision: revision.to_string() }).await? {
            Response::Digest { digest } => Ok(digest),
            other => Self::reject(other),
        }
    }

    pub async fn get_artifact(&self, digest: &str) -> Result<Artifact, ClientError> {
        match self.query(Query::GetArtifact { digest: digest.to_string() }).await? {
            Response::Artifact { artifact } => Ok(*artifact),
            other => Self::reject(other),
        }
    }

    pub async fn list_artifacts(&self) -> Result<Vec<Artifact>, ClientError> {
        match self.query(Query::ListArtifacts).await? {
            Response::Artifacts { artifacts } => Ok(artifacts),
            other => Self::reject(other),
        }
    }

    pub async fn record_artifact(
        &self,
        revision: &str,
        digest: &str,
        location: Option<String>,
        actor: &str,
    ) -> Result<Artifact, ClientError> {
        self.artifact_response(Request::RecordArtifact {
            revision: revision.to_string(),
            digest: digest.to_string(),
            location,
            at_ms: None,
            actor: actor.to_string(),
        })
        .await
    }

    pub async fn validate_digest(
        &self,
        digest: &str,
        location: Option<String>,
    ) -> Result<DigestValidation, ClientError> {
        let request = Request::ValidateDigest { digest: digest.to_string(), location };
        match self.send(&request).await? {
            Response::DigestValidation { validation } => Ok(validation),
            other => Self::reject(other),
        }
    }

    pub async fn update_status(
        &self,
        digest: &str,
        status: ArtifactStatus,
        force: bool,
        reason: Option<String>,
        actor: &str,
    ) -> Result<Artifact, ClientError> {
        self.artifact_response(Request::UpdateStatus {
            digest: digest.to_string(),
            status,
            at_ms: None,
            force,
            reason,
            actor: actor.to_string(),
        })
        .await
    }

    pub async fn record_test_result(
        &self,
        digest: &str,
        test_type: &str,
        status: TestStatus,
        details: Option<String>,
        actor: &str,
    ) -> Result<Artifact, ClientError> {
        self.artifact_response(Request::RecordTestResult {
            digest: digest.to_string(),
            test_type: test_type.to_string(),
            status,
            at_ms: None,
            details,
            actor: actor.to_string(),
        })
        .await
    }

    // -- circuit breaker --

    pub async fn breaker_status(
        &self,
        track: Option<Track>,
    ) -> Result<Vec<BreakerStatus>, ClientError> {
        match self.query(Query::BreakerStatus { track }).await? {
            Response::Breakers { breakers } => Ok(breakers),
            other => Self::reject(other),
        }
    }

    pub async fn breaker_check(
        &self,
        track: Option<Track>,
        actor: &str,
    ) -> Result<Vec<TrackCheck>, ClientError> {
        match self.send(&Request::BreakerCheck { track, actor: actor.to_string() }).await? {
            Response::ThresholdChecks { checks } => Ok(checks),
            other => Self::reject(other),
        }
    }

    pub async fn breaker_failure(
        &self,
        track: Track,
        reason: Option<String>,
        actor: &str,
    ) -> Result<Vec<BreakerStatus>, ClientError> {
        self.breakers_response(Request::BreakerFailure { track, reason, actor: actor.to_string() })
            .await
    }

    pub async fn breaker_open(
        &self,
        track: Option<Track>,
        reason: &str,
        actor: &str,
    ) -> Result<Vec<BreakerStatus>, ClientError> {
        self.breakers_response(Request::BreakerOpen {
            track,
            reason: reason.to_string(),
            actor: actor.to_string(),
        })
        .await
    }

    pub async fn breaker_close(
        &self,
        track: Option<Track>,
        keep_failures: bool,
        force: bool,
        reason: Option<String>,
        actor: &str,
    ) -> Result<Vec<BreakerStatus>, ClientError> {
        self.breakers_response(Request::BreakerClose {
            track,
            keep_failures,
            force,
            reason,
            actor: actor.to_string(),
        })
        .await
    }

    pub async fn set_threshold(
        &self,
        track: Track,
        threshold: u32,
        reason: Option<String>,
        actor: &str,
    ) -> Result<Vec<BreakerStatus>, ClientError> {
        self.breakers_response(Request::SetThreshold {
            track,
            threshold,
            reason,
            actor: actor.to_string(),
        })
        .await
    }

    pub async fn breaker_events(&self, track: Option<Track>) -> Result<Vec<BreakerEvent>, ClientError> {
        match self.query(Query::BreakerEvents { track }).await? {
            Response::BreakerEvents { events } => Ok(events),
            other => Self::reject(other),
        }
    }

    pub async fn recovery_history(&self) -> Result<RecoveryHistory, ClientError> {
        match self.query(Query::RecoveryHistory).await? {
            Response::RecoveryHistory { history } => Ok(history),
            other => Self::reject(other),
        }
    }

    pub async fn breaker_export(&self) -> Result<BreakerExport, ClientError> {
        match self.query(Query::BreakerExport).await? {
            Response::BreakerExport { export } => Ok(*export),
            other => Self::reject(other),
        }
    }

    // -- deployment lock --

    pub async fn lock_status(&self) -> Result<LockStatus, ClientError> {
        match self.query(Query::LockStatus).await? {
            Response::Lock { status } => Ok(status),
            other => Self::reject(other),
        }
    }

    pub async fn lock_acquire(
        &self,
        holder_id: &str,
        run_id: &str,
        emergency: bool,
        reason: Option<String>,
    ) -> Result<AcquireOutcome, ClientError> {
        let request = Request::LockAcquire {
            holder_id: holder_id.to_string(),
            run_id: run_id.to_string(),
            emergency,
            reason,
        };
        match self.send(&request).await? {
            Response::LockAcquired { outcome } => Ok(outcome),
            other => Self::reject(other),
        }
    }

    pub async fn lock_release(&self, holder_id: &str) -> Result<LockHolder, ClientError> {
        match self.send(&Request::LockRelease { holder_id: holder_id.to_string() }).await? {
            Response::LockReleased { holder } => Ok(holder),
            other => Self::reject(other),
        }
    }

    pub async fn lock_clear(
        &self,
        reason: Option<String>,
        actor: &str,
    ) -> Result<Option<LockHolder>, ClientError> {
        match self.send(&Request::LockClear { reason, actor: actor.to_string() }).await? {
            Response::LockCleared { holder } => Ok(holder),
            other => Self::reject(other),
        }
    }

    // -- orchestrator --

    pub async fn evaluate_health(
        &self,
        status: HealthStatus,
        details: Option<String>,
        actor: &str,
    ) -> Result<DecisionReport, ClientError> {
        self.decision(Request::EvaluateHealth {
            status,
            details,
            at_ms: None,
            actor: actor.to_string(),
        })
        .await
    }

    pub async fn trigger_recovery(
        &self,
        reason: &str,
        actor: &str,
    ) -> Result<DecisionReport, ClientError> {
        self.decision(Request::TriggerRecovery {
            reason: reason.to_string(),
            actor: actor.to_string(),
        })
        .await
    }

    pub async fn report_recovery(
        &self,
        success: bool,
        session: Option<String>,
        reason: Option<String>,
        actor: &str,
    ) -> Result<DecisionReport, ClientError> {
        self.decision(Request::ReportRecovery { success, session, reason, actor: actor.to_string() })
            .await
    }

    pub async fn redeploy(
        &self,
        digest: &str,
        location: Option<String>,
        run_id: &str,
        emergency: bool,
        reason: Option<String>,
        actor: &str,
    ) -> Result<DecisionReport, ClientError> {
        self.decision(Request::Redeploy {
            digest: digest.to_string(),
            location,
            run_id: run_id.to_string(),
            emergency,
            reason,
            actor: actor.to_string(),
        })
        .await
    }

    pub async fn rollback(
        &self,
        args: RollbackArgs,
        actor: &str,
    ) -> Result<DecisionReport, ClientError> {
        self.decision(Request::Rollback {
            mode: args.mode,
            digest: args.digest,
            file: args.file,
            location: args.location,
            run_id: args.run_id,
            reason: args.reason,
            override_breaker: args.override_breaker,
            emergency: args.emergency,
            actor: actor.to_string(),
        })
        .await
    }

    pub async fn health_history(&self) -> Result<dg_core::HealthHistory, ClientError> {
        match self.query(Query::HealthHistory).await? {
            Response::Health { history } => Ok(history),
            other => Self::reject(other),
        }
    }

    pub async fn consistency(&self) -> Result<ConsistencyReport, ClientError> {
        match self.query(Query::Consistency).await? {
            Response::Consistency { report } => Ok(*report),
            other => Self::reject(other),
        }
    }

    // -- audit --

    pub async fn audit_log(&self, limit: Option<usize>) -> Result<Vec<AuditEntry>, ClientError> {
        match self.query(Query::AuditLog { limit }).await? {
            Response::Audit { entries } => Ok(entries),
            other => Self::reject(other),
        }
    }
}
