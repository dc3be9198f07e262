// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::{MemoryStore, CURRENT_SNAPSHOT_VERSION, JOURNAL_PREFIX};
use dg_core::test_support::test_digest;
use dg_core::Event;

fn recorded(seed: u8) -> Event {
    Event::ArtifactRecorded {
        revision: format!("r{seed}"),
        digest: test_digest(seed),
        location: None,
        at_ms: 1,
    }
}

#[test]
fn missing_snapshot_loads_as_none() {
    let store = MemoryStore::new();
    assert!(load_snapshot(&store).unwrap().is_none());
}

#[test]
fn checkpoint_then_recover() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let mut journal = Journal::open(Arc::clone(&store), 0).unwrap();
    let mut state = MaterializedState::default();
    for seed in 1..=3 {
        let event = recorded(seed);
        journal.append(std::slice::from_ref(&event)).unwrap();
        state.apply_event(&event);
    }

    let mut checkpointer = Checkpointer::new(Arc::clone(&store), 2, 0);
    assert!(checkpointer.is_due(journal.write_seq()));
    assert_eq!(checkpointer.checkpoint(&state, &journal).unwrap(), 3);
    assert!(!checkpointer.is_due(3));
    assert!(store.keys(JOURNAL_PREFIX).unwrap().is_empty());

    // One more entry after the checkpoint
    let event = recorded(4);
    journal.append(std::slice::from_ref(&event)).unwrap();

    let snapshot = load_snapshot(store.as_ref()).unwrap().unwrap();
    assert_eq!(snapshot.seq, 3);
    let mut recovered = snapshot.state;
    let journal = Journal::open(Arc::clone(&store), snapshot.seq).unwrap();
    for entry in journal.entries_after(snapshot.seq).unwrap() {
        for event in &entry.events {
            recovered.apply_event(event);
        }
    }
    assert_eq!(recovered.artifacts.len(), 4);
    assert_eq!(journal.write_seq(), 4);
}

#[test]
fn previous_snapshot_kept_as_backup() {
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let mut journal = Journal::open(Arc::clone(&store), 0).unwrap();
    let mut checkpointer = Checkpointer::new(Arc::clone(&store), 1, 0);
    let state = MaterializedState::default();

    journal.append(&[recorded(1)]).unwrap();
    checkpointer.checkpoint(&state, &journal).unwrap();
    journal.append(&[recorded(2)]).unwrap();
    checkpointer.checkpoint(&state, &journal).unwrap();

    let bak = store.get(SNAPSHOT_BAK_KEY).unwrap().unwrap();
    assert_eq!(Snapshot::decode(&bak).unwrap().seq, 1);
}

#[test]
fn future_version_is_rejected() {
    let store = MemoryStore::new();
    let mut value = serde_json::to_value(Snapshot::new(1, MaterializedState::default())).unwrap();
    value["v"] = serde_json::json!(CURRENT_SNAPSHOT_VERSION + 1);
    store.set(SNAPSHOT_KEY, &value.to_string()).unwrap();
    assert!(matches!(
        load_snapshot(&store),
        Err(SnapshotError::UnsupportedVersion { .. })
    ));
}

#[test]
fn corrupt_snapshot_is_an_error() {
    let store = MemoryStore::new();
    store.set(SNAPSHOT_KEY, "{truncated").unwrap();
    assert!(matches!(load_snapshot(&store), Err(SnapshotError::Json(_))));
}
