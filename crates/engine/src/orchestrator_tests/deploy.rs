// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_helpers::*;
use crate::GuardConfig;
use dg_adapters::{DeployCall, DeployError, FakeDeployer};
use dg_core::test_support::test_digest;
use dg_core::{
    ArtifactStatus, AuditOutcome, BreakerState, Decision, DeployTarget, ErrorKind, RollbackMode,
    Track,
};
use std::sync::Arc;

fn failed() -> DeployError {
    DeployError::Failed { code: Some(1), stderr: "rollout stuck".to_string() }
}

#[tokio::test]
async fn redeploy_deploys_and_moves_pointers() {
    let ctx = setup();
    let digest = ctx.deployable(1);
    let report = ctx.guard.redeploy(redeploy_req(&digest, "run-1")).await.unwrap();

    assert_eq!(report.decision, Decision::TriggerRedeploy);
    assert_eq!(report.deployed, Some(true));
    assert_eq!(
        ctx.deployer.calls(),
        vec![DeployCall { target: DeployTarget::Digest { digest: digest.clone() }, run_id: "run-1".into() }]
    );
    assert_eq!(ctx.guard.artifact(digest.as_str()).unwrap().status, ArtifactStatus::Deployed);
    assert!(!ctx.guard.lock_status().held);
    ctx.guard.ledger().read(|s| {
        assert_eq!(s.deployment.current, Some(digest.clone()));
        let last = s.recovery.last_redeploy.as_ref().unwrap();
        assert_eq!(last.success, Some(true));
    });

    let actions: Vec<String> =
        ctx.guard.audit_entries(Some(2)).into_iter().map(|e| e.action).collect();
    assert_eq!(actions, vec!["redeploy.finish", "redeploy"]);
}

#[tokio::test]
async fn open_deployment_breaker_blocks_redeploy() {
    let ctx = setup_with(GuardConfig { deployment_threshold: 3, ..Default::default() });
    for _ in 0..3 {
        ctx.guard.record_failure(Track::Deployment, None, ACTOR).unwrap();
    }
    assert_eq!(ctx.guard.breaker_status(Some(Track::Deployment))[0].state, BreakerState::Open);

    let digest = ctx.deployable(1);
    let report = ctx.guard.redeploy(redeploy_req(&digest, "run-1")).await.unwrap();
    assert_eq!(report.decision, Decision::Blocked);
    assert!(report.reason.contains("circuit breaker is open"));
    assert!(ctx.deployer.calls().is_empty());
    assert!(!ctx.guard.lock_status().held);
    assert_eq!(ctx.guard.audit_entries(Some(1))[0].outcome, AuditOutcome::Blocked);
}

#[tokio::test]
async fn redeploy_requires_deployable_status() {
    let ctx = setup();
    let digest = ctx.record(1);
    let report = ctx.guard.redeploy(redeploy_req(&digest, "run-1")).await.unwrap();
    assert_eq!(report.decision, Decision::Blocked);
    assert_eq!(report.error_kind, Some(ErrorKind::Validation));
    assert_eq!(report.context.artifact.map(|a| a.status), Some(ArtifactStatus::Built));
}

#[tokio::test]
async fn redeploy_of_unpublished_digest_is_not_found() {
    let ctx = setup();
    let report = ctx.guard.redeploy(redeploy_req(&test_digest(5), "run-1")).await.unwrap();
    assert_eq!(report.decision, Decision::Blocked);
    assert_eq!(report.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn unreachable_store_escalates() {
    let ctx = setup();
    let digest = ctx.deployable(1);
    ctx.resolver.set_unreachable(true);
    let report = ctx.guard.redeploy(redeploy_req(&digest, "run-1")).await.unwrap();
    assert_eq!(report.decision, Decision::Escalate);
    assert_eq!(report.error_kind, Some(ErrorKind::RegistryUnreachable));
}

#[tokio::test]
async fn held_lock_blocks_redeploy() {
    let ctx = setup();
    let digest = ctx.deployable(1);
    ctx.guard.acquire_lock(acquire("opA", "run-0")).unwrap();
    let report = ctx.guard.redeploy(redeploy_req(&digest, "run-1")).await.unwrap();
    assert_eq!(report.decision, Decision::Blocked);
    assert_eq!(report.error_kind, Some(ErrorKind::Conflict));
    assert_eq!(report.context.lock.holder_id.as_deref(), Some("opA"));
}

#[tokio::test]
async fn failed_deploy_counts_and_releases_lock() {
    let ctx = setup();
    let digest = ctx.deployable(1);
    ctx.deployer.push_outcome(Err(failed()));
    let report = ctx.guard.redeploy(redeploy_req(&digest, "run-1")).await.unwrap();

    assert_eq!(report.decision, Decision::Escalate);
    assert_eq!(report.deployed, Some(false));
    assert!(report.reason.contains("rollout stuck"));
    assert!(!ctx.guard.lock_status().held);
    assert_eq!(ctx.guard.breaker_status(Some(Track::Deployment))[0].failure_count, 1);
    assert_eq!(ctx.guard.artifact(digest.as_str()).unwrap().status, ArtifactStatus::Deployable);
    assert_eq!(ctx.guard.audit_entries(Some(1))[0].outcome, AuditOutcome::Failure);
}

#[tokio::test]
async fn failure_at_threshold_opens_circuit() {
    let ctx = setup_with(GuardConfig { deployment_threshold: 1, ..Default::default() });
    let digest = ctx.deployable(1);
    ctx.deployer.push_outcome(Err(DeployError::Timeout(std::time::Duration::from_secs(900))));
    let report = ctx.guard.redeploy(redeploy_req(&digest, "run-1")).await.unwrap();
    assert_eq!(report.decision, Decision::OpenCircuit);
    assert_eq!(report.context.breakers[1].state, BreakerState::Open);
}

#[tokio::test]
async fn same_run_may_not_retry() {
    let ctx = setup();
    let digest = ctx.deployable(1);
    ctx.deployer.push_outcome(Err(failed()));
    ctx.guard.redeploy(redeploy_req(&digest, "run-1")).await.unwrap();

    let retry = ctx.guard.redeploy(redeploy_req(&digest, "run-1")).await.unwrap();
    assert_eq!(retry.decision, Decision::RetryNotPermitted);
    assert_eq!(ctx.deployer.calls().len(), 1);

    let fresh = ctx.guard.redeploy(redeploy_req(&digest, "run-2")).await.unwrap();
    assert_eq!(fresh.deployed, Some(true));
}

#[tokio::test]
async fn emergency_redeploy_takes_over_lock() {
    let ctx = setup();
    let digest = ctx.deployable(1);
    ctx.guard.acquire_lock(acquire("opA", "run-0")).unwrap();

    let mut req = redeploy_req(&digest, "run-1");
    req.emergency = true;
    req.reason = Some(BYPASS_REASON.to_string());
    let report = ctx.guard.redeploy(req).await.unwrap();
    assert_eq!(report.deployed, Some(true));

    let log = ctx.guard.audit_log();
    let takeover = log.iter().find(|e| e.action == "lock.acquire").unwrap();
    assert_eq!(takeover.result["overridden_holder"], "opA");
    assert_eq!(takeover.result["overriding_holder"], ACTOR);
    let start = log.iter().find(|e| e.action == "redeploy").unwrap();
    assert_eq!(start.outcome, AuditOutcome::Override);
}

#[tokio::test]
async fn lock_is_held_while_deploy_runs() {
    let (deployer, gate) = FakeDeployer::new().gated();
    let ctx = Arc::new(setup_with_deployer(GuardConfig::default(), deployer));
    let digest = ctx.deployable(1);

    let task = {
        let ctx = Arc::clone(&ctx);
        let digest = digest.clone();
        tokio::spawn(async move { ctx.guard.redeploy(redeploy_req(&digest, "run-1")).await })
    };
    while ctx.deployer.calls().is_empty() {
        tokio::task::yield_now().await;
    }

    // Other operations proceed while the deploy is in flight
    let status = ctx.guard.lock_status();
    assert_eq!(status.run_id.as_deref(), Some("run-1"));
    let second = ctx.deployable(2);
    let blocked = ctx.guard.redeploy(redeploy_req(&second, "run-2")).await.unwrap();
    assert_eq!(blocked.error_kind, Some(ErrorKind::Conflict));

    gate.notify_one();
    let report = task.await.unwrap().unwrap();
    assert_eq!(report.deployed, Some(true));
    assert!(!ctx.guard.lock_status().held);
}

#[tokio::test]
async fn cleared_lock_is_not_released_by_finishing_run() {
    let (deployer, gate) = FakeDeployer::new().gated();
    let ctx = Arc::new(setup_with_deployer(GuardConfig::default(), deployer));
    let digest = ctx.deployable(1);

    let task = {
        let ctx = Arc::clone(&ctx);
        tokio::spawn(async move { ctx.guard.redeploy(redeploy_req(&digest, "run-1")).await })
    };
    while ctx.deployer.calls().is_empty() {
        tokio::task::yield_now().await;
    }
    ctx.guard.clear_lock("admin", Some("runner looked hung")).unwrap();
    ctx.guard.acquire_lock(acquire("opB", "run-9")).unwrap();

    gate.notify_one();
    task.await.unwrap().unwrap();
    assert_eq!(ctx.guard.lock_status().holder_id.as_deref(), Some("opB"));
}

#[tokio::test]
async fn rollback_to_latest_backup() {
    let ctx = setup();
    let first = ctx.deployed(1, "run-1").await;
    ctx.deployed(2, "run-2").await;

    let report = ctx.guard.rollback(rollback_req(RollbackMode::LatestBackup, "run-3")).await.unwrap();
    assert_eq!(report.deployed, Some(true), "{}", report.reason);
    assert_eq!(report.target, Some(DeployTarget::Digest { digest: first.clone() }));
    ctx.guard.ledger().read(|s| assert_eq!(s.deployment.current, Some(first.clone())));

    let start = ctx.guard.audit_log().into_iter().find(|e| e.action == "rollback").unwrap();
    assert_eq!(start.inputs["mode"], "latest-backup");
    assert_eq!(start.inputs["override_breaker"], false);
}

#[tokio::test]
async fn rollback_without_backup_is_blocked() {
    let ctx = setup();
    ctx.deployed(1, "run-1").await;
    let report = ctx.guard.rollback(rollback_req(RollbackMode::LatestBackup, "run-2")).await.unwrap();
    assert_eq!(report.decision, Decision::Blocked);
    assert_eq!(report.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn repeated_backup_rollbacks_alternate() {
    let ctx = setup();
    let first = ctx.deployed(1, "run-1").await;
    let second = ctx.deployed(2, "run-2").await;

    ctx.guard.rollback(rollback_req(RollbackMode::LatestBackup, "run-3")).await.unwrap();
    let report = ctx.guard.rollback(rollback_req(RollbackMode::LatestBackup, "run-4")).await.unwrap();
    assert_eq!(report.target, Some(DeployTarget::Digest { digest: second.clone() }));
    ctx.guard.ledger().read(|s| {
        assert_eq!(s.deployment.current, Some(second.clone()));
        assert_eq!(s.deployment.backup, Some(first.clone()));
    });
}

#[tokio::test]
async fn specific_digest_rollback_to_deployed_artifact() {
    let ctx = setup();
    let first = ctx.deployed(1, "run-1").await;
    ctx.deployed(2, "run-2").await;

    let mut req = rollback_req(RollbackMode::SpecificDigest, "run-3");
    req.digest = Some(first.to_string());
    let report = ctx.guard.rollback(req).await.unwrap();
    assert_eq!(report.deployed, Some(true), "{}", report.reason);
    assert_eq!(ctx.guard.artifact(first.as_str()).unwrap().status, ArtifactStatus::Deployed);
}

#[tokio::test]
async fn specific_digest_rollback_needs_digest() {
    let ctx = setup();
    let report = ctx.guard.rollback(rollback_req(RollbackMode::SpecificDigest, "run-1")).await.unwrap();
    assert_eq!(report.error_kind, Some(ErrorKind::Validation));
}

#[tokio::test]
async fn file_rollback_bypasses_digest_checks_with_long_reason() {
    let ctx = setup();
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("deploy.yaml");
    std::fs::write(&file, "image: paste@sha256:...").unwrap();

    let mut req = rollback_req(RollbackMode::FileBased, "run-1");
    req.file = Some(file.display().to_string());
    let short = ctx.guard.rollback(req.clone()).await.unwrap();
    assert_eq!(short.error_kind, Some(ErrorKind::Validation));

    req.run_id = "run-2".to_string();
    req.reason = Some(BYPASS_REASON.to_string());
    let report = ctx.guard.rollback(req).await.unwrap();
    assert_eq!(report.deployed, Some(true), "{}", report.reason);
    assert!(ctx.resolver.lookups().is_empty());
    assert!(matches!(ctx.deployer.calls()[0].target, DeployTarget::File { .. }));
    ctx.guard.ledger().read(|s| assert!(s.deployment.current.is_none()));
}

#[tokio::test]
async fn file_rollback_of_missing_file_is_not_found() {
    let ctx = setup();
    let mut req = rollback_req(RollbackMode::FileBased, "run-1");
    req.file = Some("/nonexistent/dg/deploy.yaml".to_string());
    req.reason = Some(BYPASS_REASON.to_string());
    let report = ctx.guard.rollback(req).await.unwrap();
    assert_eq!(report.error_kind, Some(ErrorKind::NotFound));
}

#[tokio::test]
async fn breaker_override_is_recorded_before_execution() {
    let ctx = setup();
    let first = ctx.deployed(1, "run-1").await;
    ctx.deployed(2, "run-2").await;
    ctx.guard.open_breaker(Some(Track::Deployment), "too many failures", "admin").unwrap();

    let blocked = ctx.guard.rollback(rollback_req(RollbackMode::LatestBackup, "run-3")).await.unwrap();
    assert_eq!(blocked.decision, Decision::Blocked);

    let mut req = rollback_req(RollbackMode::LatestBackup, "run-4");
    req.override_breaker = true;
    req.reason = Some(BYPASS_REASON.to_string());
    let report = ctx.guard.rollback(req).await.unwrap();
    assert_eq!(report.target, Some(DeployTarget::Digest { digest: first }));
    assert_eq!(report.deployed, Some(true));

    let log = ctx.guard.audit_log();
    let start = log.iter().rposition(|e| e.action == "rollback").unwrap();
    let finish = log.iter().rposition(|e| e.action == "rollback.finish").unwrap();
    assert!(start < finish);
    assert_eq!(log[start].outcome, AuditOutcome::Override);
    assert_eq!(log[start].inputs["override_breaker"], true);
}
