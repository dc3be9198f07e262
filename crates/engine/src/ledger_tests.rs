// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dg_core::test_support::test_digest;
use dg_core::{Track, ArtifactStatus};
use dg_storage::{MemoryStore, SNAPSHOT_KEY};

fn recorded(seed: u8) -> Event {
    Event::ArtifactRecorded {
        revision: format!("r{seed}"),
        digest: test_digest(seed),
        location: None,
        at_ms: 1_000,
    }
}

fn failure(count: u32) -> Event {
    Event::BreakerFailureRecorded {
        track: Track::Deployment,
        failure_count: count,
        reason: None,
        at_ms: 2_000,
    }
}

fn open(store: &Arc<MemoryStore>, config: &GuardConfig) -> Ledger {
    let store: Arc<dyn StateStore> = Arc::clone(store) as Arc<dyn StateStore>;
    Ledger::open(store, config).unwrap()
}

#[test]
fn fresh_ledger_uses_configured_thresholds() {
    let config = GuardConfig { recovery_threshold: 7, deployment_threshold: 9, ..Default::default() };
    let ledger = open(&Arc::new(MemoryStore::new()), &config);
    ledger.read(|s| {
        assert_eq!(s.recovery_breaker.threshold, 7);
        assert_eq!(s.deployment_breaker.threshold, 9);
    });
    assert_eq!(ledger.write_seq(), 0);
}

#[test]
fn commit_applies_and_journals() {
    let store = Arc::new(MemoryStore::new());
    let ledger = open(&store, &GuardConfig::default());
    let seq = ledger.commit(|_| Ok((vec![recorded(1)], ()))).map(|_| ledger.write_seq()).unwrap();
    assert_eq!(seq, 1);
    assert!(ledger.read(|s| s.artifact(test_digest(1).as_str()).is_some()));
    assert!(store.get("journal/00000000000000000001").unwrap().is_some());
}

#[test]
fn empty_batch_is_not_journaled() {
    let store = Arc::new(MemoryStore::new());
    let ledger = open(&store, &GuardConfig::default());
    let value = ledger.commit(|_| Ok((Vec::new(), 42))).unwrap();
    assert_eq!(value, 42);
    assert_eq!(ledger.write_seq(), 0);
    assert!(store.keys("journal/").unwrap().is_empty());
}

#[test]
fn failed_decision_leaves_state_alone() {
    let ledger = open(&Arc::new(MemoryStore::new()), &GuardConfig::default());
    let result: Result<(), _> = ledger.commit(|_| Err(GuardError::conflict("nope")));
    assert!(result.is_err());
    assert_eq!(ledger.write_seq(), 0);
    assert!(ledger.read(|s| s.artifacts.is_empty()));
}

#[test]
fn view_sees_updated_state() {
    let ledger = open(&Arc::new(MemoryStore::new()), &GuardConfig::default());
    let count = ledger
        .commit_and_view(|_| Ok((vec![failure(1)], ())), |s, ()| s.deployment_breaker.failure_count)
        .unwrap();
    assert_eq!(count, 1);
}

#[test]
fn reopen_replays_journal() {
    let store = Arc::new(MemoryStore::new());
    {
        let ledger = open(&store, &GuardConfig::default());
        ledger.commit(|_| Ok((vec![recorded(1), failure(1)], ()))).unwrap();
        ledger.commit(|_| Ok((vec![failure(2)], ()))).unwrap();
    }
    let ledger = open(&store, &GuardConfig::default());
    assert_eq!(ledger.write_seq(), 2);
    ledger.read(|s| {
        assert_eq!(s.deployment_breaker.failure_count, 2);
        assert_eq!(s.artifact(test_digest(1).as_str()).map(|a| a.status), Some(ArtifactStatus::Built));
    });
}

#[test]
fn checkpoint_is_taken_when_due_and_replay_resumes_after_it() {
    let store = Arc::new(MemoryStore::new());
    let config = GuardConfig { snapshot_every: 2, ..Default::default() };
    {
        let ledger = open(&store, &config);
        ledger.commit(|_| Ok((vec![failure(1)], ()))).unwrap();
        ledger.commit(|_| Ok((vec![failure(2)], ()))).unwrap();
        assert!(store.get(SNAPSHOT_KEY).unwrap().is_some());
        assert!(store.keys("journal/").unwrap().is_empty());
        ledger.commit(|_| Ok((vec![failure(3)], ()))).unwrap();
    }
    let ledger = open(&store, &config);
    assert_eq!(ledger.write_seq(), 3);
    assert_eq!(ledger.read(|s| s.deployment_breaker.failure_count), 3);
}

#[test]
fn explicit_checkpoint_skips_when_nothing_changed() {
    let store = Arc::new(MemoryStore::new());
    let ledger = open(&store, &GuardConfig::default());
    assert_eq!(ledger.checkpoint().unwrap(), 0);
    assert!(store.get(SNAPSHOT_KEY).unwrap().is_none());

    ledger.commit(|_| Ok((vec![recorded(2)], ()))).unwrap();
    assert_eq!(ledger.checkpoint().unwrap(), 1);
    assert!(store.get(SNAPSHOT_KEY).unwrap().is_some());
}

#[test]
fn journal_slot_taken_by_another_writer_is_a_state_store_error() {
    let store = Arc::new(MemoryStore::new());
    let ledger = open(&store, &GuardConfig::default());
    store.set("journal/00000000000000000001", "{\"seq\":1,\"events\":[]}").unwrap();
    let err = ledger.commit(|_| Ok((vec![recorded(1)], ()))).unwrap_err();
    assert_eq!(err.kind(), dg_core::ErrorKind::StateStore);
    assert!(ledger.read(|s| s.artifacts.is_empty()));
}

#[test]
fn health_limit_comes_from_config() {
    let config = GuardConfig { health_history_limit: 4, ..Default::default() };
    let ledger = open(&Arc::new(MemoryStore::new()), &config);
    assert_eq!(ledger.read(|s| s.health.limit()), 4);
}
