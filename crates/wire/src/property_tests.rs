// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Property tests for protocol serde roundtrips.
//!
//! Covers every variant of Request, Response, and Query with minimal fixed
//! field values, plus generated artifact and breaker payloads.

use std::path::PathBuf;

use dg_core::test_support::strategies::{arb_artifact_status, arb_digest, arb_track};
use dg_core::test_support::test_digest;
use dg_core::{
    AcquireOutcome, Artifact, AuditEntry, AuditId, BreakerTrack, ConsistencyReport, Decision,
    DecisionReport, DigestValidation, ErrorKind, HealthHistory, HealthStatus, LockStatus,
    RecoveryHistory, RollbackMode, StateContext, TestStatus, Track,
};
use proptest::prelude::*;

use super::wire::{decode, encode};
use super::*;

fn s() -> String {
    String::new()
}

fn context() -> StateContext {
    StateContext {
        breakers: Track::ALL.iter().map(|t| BreakerTrack::new(*t, 3).status()).collect(),
        lock: LockStatus::from_holder(None, 0),
        artifact: None,
        consecutive_degraded: 0,
    }
}

fn all_requests() -> Vec<Request> {
    vec![
        Request::Ping,
        Request::Hello { version: s() },
        Request::Query { query: Query::ListArtifacts },
        Request::Shutdown,
        Request::Status,
        Request::RecordArtifact { revision: s(), digest: s(), location: None, at_ms: None, actor: s() },
        Request::ValidateDigest { digest: s(), location: None },
        Request::UpdateStatus {
            digest: s(),
            status: dg_core::ArtifactStatus::Testing,
            at_ms: None,
            force: false,
            reason: None,
            actor: s(),
        },
        Request::RecordTestResult {
            digest: s(),
            test_type: s(),
            status: TestStatus::Passed,
            at_ms: None,
            details: None,
            actor: s(),
        },
        Request::BreakerFailure { track: Track::Deployment, reason: None, actor: s() },
        Request::BreakerCheck { track: None, actor: s() },
        Request::BreakerOpen { track: None, reason: s(), actor: s() },
        Request::BreakerClose {
            track: Some(Track::Recovery),
            keep_failures: false,
            force: false,
            reason: None,
            actor: s(),
        },
        Request::SetThreshold { track: Track::Recovery, threshold: 3, reason: None, actor: s() },
        Request::LockAcquire { holder_id: s(), run_id: s(), emergency: false, reason: None },
        Request::LockRelease { holder_id: s() },
        Request::LockClear { reason: None, actor: s() },
        Request::EvaluateHealth { status: HealthStatus::Degraded, details: None, at_ms: None, actor: s() },
        Request::TriggerRecovery { reason: s(), actor: s() },
        Request::ReportRecovery { success: false, session: None, reason: None, actor: s() },
        Request::Redeploy {
            digest: s(),
            location: None,
            run_id: s(),
            emergency: false,
            reason: None,
            actor: s(),
        },
        Request::Rollback {
            mode: RollbackMode::SpecificDigest,
            digest: Some(s()),
            file: None,
            location: None,
            run_id: s(),
            reason: None,
            override_breaker: true,
            emergency: false,
            actor: s(),
        },
    ]
}

fn all_responses() -> Vec<Response> {
    let digest = test_digest(1);
    vec![
        Response::Ok,
        Response::Pong,
        Response::Hello { version: s() },
        Response::ShuttingDown,
        Response::Status {
            status: Box::new(DaemonStatus {
                version: s(),
                pid: 1,
                uptime_secs: 0,
                state_dir: PathBuf::new(),
                write_seq: 0,
                artifacts: 0,
                breakers: vec![],
                lock: LockStatus::from_holder(None, 0),
            }),
        },
        Response::Error { kind: Some(ErrorKind::Conflict), message: s(), context: Some(Box::new(context())) },
        Response::Error { kind: None, message: s(), context: None },
        Response::Existing { digest: None },
        Response::Digest { digest: digest.clone() },
        Response::DigestValidation {
            validation: DigestValidation {
                digest: digest.clone(),
                location: s(),
                verified_externally: true,
            },
        },
        Response::Artifact { artifact: Box::new(Artifact::new("r1", digest.clone(), 0)) },
        Response::Artifacts { artifacts: vec![] },
        Response::Breakers { breakers: context().breakers },
        Response::ThresholdChecks { checks: vec![] },
        Response::BreakerEvents { events: vec![] },
        Response::RecoveryHistory { history: RecoveryHistory::default() },
        Response::Lock { status: LockStatus::from_holder(None, 0) },
        Response::LockAcquired {
            outcome: AcquireOutcome::Locked { status: LockStatus::from_holder(None, 0), overridden: None },
        },
        Response::LockCleared { holder: None },
        Response::Health { history: HealthHistory::new(10) },
        Response::Audit { entries: vec![AuditEntry::new("alice", "breaker.open", 0)] },
        Response::Decision {
            report: Box::new(DecisionReport {
                decision: Decision::RetryNotPermitted,
                reason: s(),
                target: None,
                deployed: None,
                error_kind: None,
                audit_id: AuditId::from_string("aud-x"),
                context: context(),
            }),
        },
        Response::Consistency {
            report: Box::new(ConsistencyReport { consistent: true, issues: vec![], context: context() }),
        },
    ]
}

fn all_queries() -> Vec<Query> {
    vec![
        Query::CheckExisting { revision: s() },
        Query::GetDigest { revision: s() },
        Query::GetArtifact { digest: s() },
        Query::ListArtifacts,
        Query::BreakerStatus { track: None },
        Query::BreakerEvents { track: Some(Track::Deployment) },
        Query::RecoveryHistory,
        Query::BreakerExport,
        Query::LockStatus,
        Query::HealthHistory,
        Query::AuditLog { limit: Some(5) },
        Query::Consistency,
    ]
}

proptest! {
    #[test]
    fn request_serde_roundtrip(req in proptest::sample::select(all_requests())) {
        let encoded = encode(&req).expect("encode");
        let decoded: Request = decode(&encoded).expect("decode");
        prop_assert_eq!(decoded, req);
    }

    #[test]
    fn response_serde_roundtrip(resp in proptest::sample::select(all_responses())) {
        let encoded = encode(&resp).expect("encode");
        let decoded: Response = decode(&encoded).expect("decode");
        prop_assert_eq!(decoded, resp);
    }

    #[test]
    fn query_serde_roundtrip(query in proptest::sample::select(all_queries())) {
        let req = Request::Query { query: query.clone() };
        let encoded = encode(&req).expect("encode");
        let decoded: Request = decode(&encoded).expect("decode");
        prop_assert_eq!(decoded, Request::Query { query });
    }

    #[test]
    fn artifact_payload_roundtrip(
        digest in arb_digest(),
        status in arb_artifact_status(),
        revision in "[a-z0-9]{1,12}",
    ) {
        let mut artifact = Artifact::new(revision, digest, 1_000);
        artifact.status = status;
        let resp = Response::Artifact { artifact: Box::new(artifact) };
        let decoded: Response = decode(&encode(&resp).expect("encode")).expect("decode");
        prop_assert_eq!(decoded, resp);
    }

    #[test]
    fn breaker_status_roundtrip(track in arb_track(), threshold in 1u32..50, failures in 0u32..60) {
        let mut breaker = BreakerTrack::new(track, threshold);
        breaker.failure_count = failures;
        let resp = Response::Breakers { breakers: vec![breaker.status()] };
        let decoded: Response = decode(&encode(&resp).expect("encode")).expect("decode");
        prop_assert_eq!(decoded, resp);
    }
}
