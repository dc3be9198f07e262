// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::settings::Settings;
use dg_core::test_support::test_digest;
use dg_core::{ArtifactStatus, Decision, ErrorKind, HealthStatus, Track};
use dg_wire::Query;
use tempfile::TempDir;

fn ctx_with(settings: &str) -> (TempDir, ListenCtx) {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::parse(settings).unwrap();
    let ctx = test_ctx(dir.path(), &settings);
    (dir, ctx)
}

fn ctx() -> (TempDir, ListenCtx) {
    ctx_with("[deploy]\ncommand = \"true\"\n")
}

async fn record(ctx: &ListenCtx, revision: &str, seed: u8) -> String {
    let digest = test_digest(seed).to_string();
    let response = handle_request(
        Request::RecordArtifact {
            revision: revision.to_string(),
            digest: digest.clone(),
            location: Some("ghcr.io/acme/paste".to_string()),
            at_ms: None,
            actor: "ci".to_string(),
        },
        ctx,
    )
    .await;
    assert!(matches!(response, Response::Artifact { .. }), "{response:?}");
    digest
}

async fn promote(ctx: &ListenCtx, digest: &str, statuses: &[ArtifactStatus]) {
    for status in statuses {
        let response = handle_request(
            Request::UpdateStatus {
                digest: digest.to_string(),
                status: *status,
                at_ms: None,
                force: false,
                reason: None,
                actor: "ci".to_string(),
            },
            ctx,
        )
        .await;
        assert!(matches!(response, Response::Artifact { .. }), "{response:?}");
    }
}

fn error_kind(response: &Response) -> Option<ErrorKind> {
    match response {
        Response::Error { kind, .. } => *kind,
        other => panic!("expected error, got {other:?}"),
    }
}

#[tokio::test]
async fn ping_and_hello_answer_with_version() {
    let (_dir, ctx) = ctx();
    assert_eq!(handle_request(Request::Ping, &ctx).await, Response::Pong);
    let response =
        handle_request(Request::Hello { version: "0.0.0+other".to_string() }, &ctx).await;
    assert_eq!(response, Response::Hello { version: PROTOCOL_VERSION.to_string() });
}

#[tokio::test]
async fn recorded_artifact_is_queryable() {
    let (_dir, ctx) = ctx();
    let digest = record(&ctx, "abc123", 1).await;

    let query = |query| handle_request(Request::Query { query }, &ctx);
    match query(Query::CheckExisting { revision: "abc123".to_string() }).await {
        Response::Existing { digest: Some(found) } => assert_eq!(found.as_str(), digest),
        other => panic!("unexpected: {other:?}"),
    }
    match query(Query::GetDigest { revision: "abc123".to_string() }).await {
        Response::Digest { digest: found } => assert_eq!(found.as_str(), digest),
        other => panic!("unexpected: {other:?}"),
    }
    match query(Query::ListArtifacts).await {
        Response::Artifacts { artifacts } => assert_eq!(artifacts.len(), 1),
        other => panic!("unexpected: {other:?}"),
    }
    let missing = query(Query::GetDigest { revision: "nope".to_string() }).await;
    assert_eq!(error_kind(&missing), Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn errors_carry_state_context_for_named_artifact() {
    let (_dir, ctx) = ctx();
    let digest = record(&ctx, "abc123", 1).await;

    let response = handle_request(
        Request::UpdateStatus {
            digest: digest.clone(),
            status: ArtifactStatus::Deployed,
            at_ms: None,
            force: false,
            reason: None,
            actor: "ci".to_string(),
        },
        &ctx,
    )
    .await;
    match response {
        Response::Error { kind, context: Some(context), .. } => {
            assert_eq!(kind, Some(ErrorKind::InvalidTransition));
            let artifact = context.artifact.unwrap();
            assert_eq!(artifact.status, ArtifactStatus::Built);
            assert_eq!(context.breakers.len(), 2);
        }
        other => panic!("expected error with context, got {other:?}"),
    }
}

#[tokio::test]
async fn validate_digest_rejects_malformed_input() {
    let (_dir, ctx) = ctx();
    let response = handle_request(
        Request::ValidateDigest { digest: "sha256:xyz".to_string(), location: None },
        &ctx,
    )
    .await;
    assert_eq!(error_kind(&response), Some(ErrorKind::Validation));
}

#[tokio::test]
async fn validate_digest_accepts_recorded_artifact_without_registry() {
    let (_dir, ctx) = ctx();
    let digest = record(&ctx, "abc123", 1).await;
    match handle_request(Request::ValidateDigest { digest, location: None }, &ctx).await {
        Response::DigestValidation { validation } => assert!(!validation.verified_externally),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn breaker_failures_open_and_block_redeploy() {
    let (_dir, ctx) = ctx_with("[breaker]\ndeployment_threshold = 2\n");
    let digest = record(&ctx, "abc123", 1).await;
    promote(&ctx, &digest, &[ArtifactStatus::Testing, ArtifactStatus::Deployable]).await;

    for _ in 0..2 {
        let response = handle_request(
            Request::BreakerFailure {
                track: Track::Deployment,
                reason: Some("smoke test".to_string()),
                actor: "ci".to_string(),
            },
            &ctx,
        )
        .await;
        assert!(matches!(response, Response::Breakers { .. }), "{response:?}");
    }

    let response = handle_request(
        Request::BreakerCheck { track: Some(Track::Deployment), actor: "ci".to_string() },
        &ctx,
    )
    .await;
    match response {
        Response::ThresholdChecks { checks } => assert_eq!(checks.len(), 1),
        other => panic!("unexpected: {other:?}"),
    }

    let response = handle_request(
        Request::Redeploy {
            digest,
            location: None,
            run_id: "run-1".to_string(),
            emergency: false,
            reason: None,
            actor: "ci".to_string(),
        },
        &ctx,
    )
    .await;
    match response {
        Response::Decision { report } => {
            assert_eq!(report.decision, Decision::Blocked);
            assert_eq!(report.deployed, None);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn redeploy_runs_command_and_releases_lock() {
    let (_dir, ctx) = ctx();
    let digest = record(&ctx, "abc123", 1).await;
    promote(&ctx, &digest, &[ArtifactStatus::Testing, ArtifactStatus::Deployable]).await;

    let response = handle_request(
        Request::Redeploy {
            digest: digest.clone(),
            location: None,
            run_id: "run-1".to_string(),
            emergency: false,
            reason: None,
            actor: "ci".to_string(),
        },
        &ctx,
    )
    .await;
    match response {
        Response::Decision { report } => {
            assert_eq!(report.decision, Decision::Allow);
            assert_eq!(report.deployed, Some(true));
        }
        other => panic!("unexpected: {other:?}"),
    }

    match handle_request(Request::Query { query: Query::LockStatus }, &ctx).await {
        Response::Lock { status } => assert!(!status.held),
        other => panic!("unexpected: {other:?}"),
    }
    match handle_request(Request::Query { query: Query::GetArtifact { digest } }, &ctx).await {
        Response::Artifact { artifact } => assert_eq!(artifact.status, ArtifactStatus::Deployed),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn lock_contention_is_an_outcome() {
    let (_dir, ctx) = ctx();
    let acquire = |holder: &str| Request::LockAcquire {
        holder_id: holder.to_string(),
        run_id: format!("{holder}-run"),
        emergency: false,
        reason: None,
    };

    match handle_request(acquire("alice"), &ctx).await {
        Response::LockAcquired { outcome } => assert!(outcome.is_locked()),
        other => panic!("unexpected: {other:?}"),
    }
    match handle_request(acquire("bob"), &ctx).await {
        Response::LockAcquired { outcome } => assert!(!outcome.is_locked()),
        other => panic!("unexpected: {other:?}"),
    }

    let response =
        handle_request(Request::LockRelease { holder_id: "bob".to_string() }, &ctx).await;
    assert_eq!(error_kind(&response), Some(ErrorKind::NotOwner));

    match handle_request(Request::LockRelease { holder_id: "alice".to_string() }, &ctx).await {
        Response::LockReleased { holder } => assert_eq!(holder.holder_id, "alice"),
        other => panic!("unexpected: {other:?}"),
    }
    match handle_request(Request::LockClear { reason: None, actor: "ops".to_string() }, &ctx).await
    {
        Response::LockCleared { holder } => assert!(holder.is_none()),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn degraded_health_triggers_recovery() {
    let (_dir, ctx) = ctx_with("recovery_trigger_threshold = 2\n");
    let evaluate = || Request::EvaluateHealth {
        status: HealthStatus::Degraded,
        details: None,
        at_ms: None,
        actor: "monitor".to_string(),
    };

    let first = handle_request(evaluate(), &ctx).await;
    let second = handle_request(evaluate(), &ctx).await;
    match (first, second) {
        (Response::Decision { report: first }, Response::Decision { report: second }) => {
            assert_eq!(first.decision, Decision::Allow);
            assert_eq!(second.decision, Decision::TriggerRecovery);
        }
        other => panic!("unexpected: {other:?}"),
    }

    match handle_request(Request::Query { query: Query::HealthHistory }, &ctx).await {
        Response::Health { history } => assert_eq!(history.len(), 2),
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn audit_log_records_mutations() {
    let (_dir, ctx) = ctx();
    record(&ctx, "abc123", 1).await;
    record(&ctx, "def456", 2).await;

    match handle_request(Request::Query { query: Query::AuditLog { limit: Some(1) } }, &ctx).await
    {
        Response::Audit { entries } => {
            assert_eq!(entries.len(), 1);
            assert_eq!(entries[0].action, "artifact.record");
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn status_reports_state_summary() {
    let (dir, ctx) = ctx();
    record(&ctx, "abc123", 1).await;
    match handle_request(Request::Status, &ctx).await {
        Response::Status { status } => {
            assert_eq!(status.artifacts, 1);
            assert_eq!(status.pid, std::process::id());
            assert_eq!(status.state_dir, dir.path());
            assert_eq!(status.breakers.len(), 2);
            assert!(status.write_seq >= 1);
        }
        other => panic!("unexpected: {other:?}"),
    }
}

#[tokio::test]
async fn shutdown_notifies_waiter() {
    let (_dir, ctx) = ctx();
    let notified = ctx.shutdown.clone();
    assert_eq!(handle_request(Request::Shutdown, &ctx).await, Response::ShuttingDown);
    tokio::time::timeout(std::time::Duration::from_secs(1), notified.notified())
        .await
        .unwrap();
}

#[tokio::test]
async fn connection_round_trip_over_stream() {
    let (_dir, ctx) = ctx();
    let (client, server) = tokio::io::duplex(64 * 1024);
    let (server_read, server_write) = tokio::io::split(server);
    let serve = tokio::spawn(async move { handle_connection(server_read, server_write, &ctx).await });

    let (mut client_read, mut client_write) = tokio::io::split(client);
    let data = wire::encode(&Request::Ping).unwrap();
    wire::write_message(&mut client_write, &data).await.unwrap();
    let bytes = wire::read_message(&mut client_read).await.unwrap();
    let response: Response = wire::decode(&bytes).unwrap();
    assert_eq!(response, Response::Pong);

    serve.await.unwrap().unwrap();
}

#[tokio::test]
async fn closed_connection_is_reported() {
    let (_dir, ctx) = ctx();
    let (client, server) = tokio::io::duplex(1024);
    drop(client);
    let (server_read, server_write) = tokio::io::split(server);
    let err = handle_connection(server_read, server_write, &ctx).await.unwrap_err();
    assert!(matches!(err, ConnectionError::Protocol(ProtocolError::ConnectionClosed)));
}
