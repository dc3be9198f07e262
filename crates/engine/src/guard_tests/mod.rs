// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! End-to-end flows through the guard, including a restart on disk.

use super::*;
use crate::test_helpers::*;
use crate::{GuardConfig, Ledger};
use dg_adapters::{FakeDeployer, FakeResolver};
use dg_core::test_support::test_digest;
use dg_core::{
    AcquireOutcome, ArtifactStatus, BreakerState, Decision, FakeClock, GuardError, HealthStatus,
    TestStatus, Track,
};
use dg_storage::{FileStore, StateStore};
use std::path::Path;
use std::sync::Arc;

fn open_on_disk(dir: &Path, config: &GuardConfig) -> TestGuard {
    let store: Arc<dyn StateStore> = Arc::new(FileStore::open(dir).unwrap());
    let ledger = Ledger::open(store, config).unwrap();
    Guard::new(ledger, FakeResolver::new(), FakeDeployer::new(), FakeClock::new(), config.clone())
}

#[test]
fn artifact_lifecycle_reaches_deployable() {
    let ctx = setup();
    let digest = test_digest(0xaa);
    ctx.guard.record_artifact(record_req("r1", &digest)).unwrap();
    assert_eq!(ctx.guard.check_existing("r1"), Some(digest.clone()));

    ctx.guard.update_status(status_req(&digest, ArtifactStatus::Testing)).unwrap();
    ctx.guard.record_test_result(test_result(&digest, "integration", TestStatus::Passed)).unwrap();
    let artifact =
        ctx.guard.update_status(status_req(&digest, ArtifactStatus::Deployable)).unwrap();

    assert_eq!(artifact.status, ArtifactStatus::Deployable);
    assert_eq!(artifact.test_results.len(), 1);
    assert_eq!(artifact.test_results[0].test_type, "integration");
}

#[tokio::test]
async fn deployment_failures_at_threshold_block_redeploy() {
    let ctx = setup_with(GuardConfig { deployment_threshold: 3, ..Default::default() });
    let digest = ctx.deployable(1);
    for _ in 0..3 {
        ctx.guard.record_failure(Track::Deployment, Some("rollout failed".into()), ACTOR).unwrap();
    }
    assert_eq!(ctx.guard.breaker_status(Some(Track::Deployment))[0].state, BreakerState::Open);

    let report = ctx.guard.redeploy(redeploy_req(&digest, "run-1")).await.unwrap();
    assert_eq!(report.decision, Decision::Blocked);
}

#[test]
fn lock_handoff_between_operators() {
    let ctx = setup();
    let first = ctx.guard.acquire_lock(acquire("opA", "run1")).unwrap();
    assert!(matches!(first, AcquireOutcome::Locked { .. }));

    let second = ctx.guard.acquire_lock(acquire("opB", "run2")).unwrap();
    assert!(matches!(second, AcquireOutcome::Conflict { .. }));

    let err = ctx.guard.release_lock("opB").unwrap_err();
    assert!(matches!(err, GuardError::NotOwner { .. }));

    ctx.guard.release_lock("opA").unwrap();
    let third = ctx.guard.acquire_lock(acquire("opB", "run3")).unwrap();
    assert!(matches!(third, AcquireOutcome::Locked { .. }));
}

#[test]
fn state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();
    let config = GuardConfig { snapshot_every: 4, ..Default::default() };
    let digest = test_digest(7);
    {
        let guard = open_on_disk(dir.path(), &config);
        guard.record_artifact(record_req("r7", &digest)).unwrap();
        guard.update_status(status_req(&digest, ArtifactStatus::Testing)).unwrap();
        guard.record_failure(Track::Recovery, None, ACTOR).unwrap();
        guard.acquire_lock(acquire("opA", "run-1")).unwrap();
        guard
            .evaluate_health(HealthStatus::Degraded, Some("p99 over budget".into()), None, ACTOR)
            .unwrap();
    }

    let guard = open_on_disk(dir.path(), &config);
    assert_eq!(guard.get_digest("r7").unwrap(), digest);
    assert_eq!(guard.artifact(digest.as_str()).unwrap().status, ArtifactStatus::Testing);
    assert_eq!(guard.breaker_status(Some(Track::Recovery))[0].failure_count, 1);
    assert_eq!(guard.lock_status().holder_id.as_deref(), Some("opA"));
    assert_eq!(guard.health_history().len(), 1);
    assert_eq!(guard.audit_log().len(), 5);
}

#[test]
fn identical_samples_replay_exactly_once() {
    let dir = tempfile::tempdir().unwrap();
    let config = GuardConfig { snapshot_every: 2, ..Default::default() };
    {
        let guard = open_on_disk(dir.path(), &config);
        for _ in 0..3 {
            guard.evaluate_health(HealthStatus::Degraded, None, Some(9_000), ACTOR).unwrap();
        }
    }

    let guard = open_on_disk(dir.path(), &config);
    assert_eq!(guard.health_history().len(), 3);
    assert_eq!(guard.health_history().consecutive_degraded(), 3);
}

#[test]
fn context_names_the_artifact() {
    let ctx = setup();
    let digest = ctx.record(3);
    let context = ctx.guard.context(Some(digest.as_str()));
    assert_eq!(context.artifact.map(|a| a.revision), Some("r3".to_string()));
    assert_eq!(context.breakers.len(), 2);
    assert!(!context.lock.held);
}
