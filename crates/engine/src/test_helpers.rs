// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared fixtures for engine tests

use crate::{
    AcquireRequest, GuardConfig, Ledger, RecordArtifact, RedeployRequest, RollbackRequest,
    StatusUpdate, TestResultInput,
};
use crate::guard::Guard;
use dg_adapters::{FakeDeployer, FakeResolver};
use dg_core::test_support::test_digest;
use dg_core::{ArtifactStatus, Digest, FakeClock, RollbackMode, TestStatus};
use dg_storage::{MemoryStore, StateStore};
use std::sync::Arc;

pub(crate) type TestGuard = Guard<FakeResolver, FakeDeployer, FakeClock>;

pub(crate) const LOCATION: &str = "ghcr.io/acme/paste";
pub(crate) const ACTOR: &str = "ci-bot";
pub(crate) const BYPASS_REASON: &str = "production outage, backup image verified by hand";

pub(crate) struct TestContext {
    pub guard: TestGuard,
    pub resolver: FakeResolver,
    pub deployer: FakeDeployer,
    pub clock: FakeClock,
    pub store: Arc<MemoryStore>,
}

pub(crate) fn setup() -> TestContext {
    setup_with(GuardConfig::default())
}

pub(crate) fn setup_with(config: GuardConfig) -> TestContext {
    setup_with_deployer(config, FakeDeployer::new())
}

pub(crate) fn setup_with_deployer(config: GuardConfig, deployer: FakeDeployer) -> TestContext {
    let store = Arc::new(MemoryStore::new());
    let shared: Arc<dyn StateStore> = Arc::clone(&store) as Arc<dyn StateStore>;
    let ledger = Ledger::open(shared, &config).unwrap();
    let resolver = FakeResolver::new();
    let clock = FakeClock::new();
    let guard = Guard::new(ledger, resolver.clone(), deployer.clone(), clock.clone(), config);
    TestContext { guard, resolver, deployer, clock, store }
}

pub(crate) fn record_req(revision: &str, digest: &Digest) -> RecordArtifact {
    RecordArtifact {
        revision: revision.to_string(),
        digest: digest.to_string(),
        location: Some(LOCATION.to_string()),
        at_ms: None,
        actor: ACTOR.to_string(),
    }
}

pub(crate) fn status_req(digest: &Digest, status: ArtifactStatus) -> StatusUpdate {
    StatusUpdate {
        digest: digest.to_string(),
        status,
        at_ms: None,
        force: false,
        reason: None,
        actor: ACTOR.to_string(),
    }
}

pub(crate) fn test_result(digest: &Digest, test_type: &str, status: TestStatus) -> TestResultInput {
    TestResultInput {
        digest: digest.to_string(),
        test_type: test_type.to_string(),
        status,
        at_ms: None,
        details: None,
        actor: ACTOR.to_string(),
    }
}

pub(crate) fn acquire(holder: &str, run: &str) -> AcquireRequest {
    AcquireRequest {
        holder_id: holder.to_string(),
        run_id: run.to_string(),
        emergency: false,
        reason: None,
    }
}

pub(crate) fn redeploy_req(digest: &Digest, run: &str) -> RedeployRequest {
    RedeployRequest {
        digest: digest.to_string(),
        location: None,
        actor: ACTOR.to_string(),
        run_id: run.to_string(),
        emergency: false,
        reason: None,
    }
}

pub(crate) fn rollback_req(mode: RollbackMode, run: &str) -> RollbackRequest {
    RollbackRequest {
        mode,
        digest: None,
        file: None,
        location: None,
        actor: "oncall".to_string(),
        run_id: run.to_string(),
        reason: Some("error rate spike".to_string()),
        override_breaker: false,
        emergency: false,
    }
}

impl TestContext {
    /// Record artifact `seed` (revision `r<seed>`) and publish it
    pub(crate) fn record(&self, seed: u8) -> Digest {
        let digest = test_digest(seed);
        self.guard.record_artifact(record_req(&format!("r{seed}"), &digest)).unwrap();
        self.resolver.publish(LOCATION, &digest);
        digest
    }

    /// Record artifact `seed` and walk it to deployable
    pub(crate) fn deployable(&self, seed: u8) -> Digest {
        let digest = self.record(seed);
        self.guard.update_status(status_req(&digest, ArtifactStatus::Testing)).unwrap();
        self.guard.update_status(status_req(&digest, ArtifactStatus::Deployable)).unwrap();
        digest
    }

    /// Deployable artifact `seed`, successfully redeployed under `run`
    pub(crate) async fn deployed(&self, seed: u8, run: &str) -> Digest {
        let digest = self.deployable(seed);
        let report = self.guard.redeploy(redeploy_req(&digest, run)).await.unwrap();
        assert_eq!(report.deployed, Some(true), "{}", report.reason);
        digest
    }
}
