// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::sync::Arc;
use tempfile::tempdir;

#[test]
fn values_survive_reopen() {
    let dir = tempdir().unwrap();
    {
        let store = FileStore::open(dir.path()).unwrap();
        store.set("journal/00000000000000000001", "{\"seq\":1}").unwrap();
    }
    let store = FileStore::open(dir.path()).unwrap();
    assert_eq!(
        store.get("journal/00000000000000000001").unwrap().as_deref(),
        Some("{\"seq\":1}")
    );
}

#[test]
fn keys_skip_lock_and_temp_files() {
    let dir = tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    store.set("snapshot", "{}").unwrap();
    std::fs::write(dir.path().join("snapshot.1.0.~tmp"), "partial").unwrap();
    assert!(dir.path().join(".store.lock").exists());
    assert_eq!(store.keys("").unwrap(), vec!["snapshot".to_string()]);
}

#[test]
fn key_cannot_escape_root() {
    let dir = tempdir().unwrap();
    let store = FileStore::open(dir.path().join("inner")).unwrap();
    assert!(store.set("../outside", "x").is_err());
    assert!(!dir.path().join("outside").exists());
}

#[test]
fn invalid_utf8_is_an_encoding_error() {
    let dir = tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    std::fs::write(dir.path().join("binary"), [0xff, 0xfe]).unwrap();
    assert!(matches!(store.get("binary"), Err(StoreError::Encoding(_))));
}

#[test]
fn concurrent_create_if_absent_has_one_winner() {
    let dir = tempdir().unwrap();
    let root = dir.path().to_path_buf();
    let handles: Vec<_> = (0..8)
        .map(|i| {
            let root = root.clone();
            std::thread::spawn(move || {
                // Separate instances model separate processes sharing the directory
                let store = FileStore::open(&root).unwrap();
                store.compare_and_swap("claim", None, &format!("writer-{i}")).unwrap()
            })
        })
        .collect();
    let winners = handles.into_iter().map(|h| h.join().unwrap()).filter(|won| *won).count();
    assert_eq!(winners, 1);
}

#[test]
fn concurrent_cas_increments_lose_nothing() {
    let dir = tempdir().unwrap();
    let store = Arc::new(FileStore::open(dir.path()).unwrap());
    store.set("counter", "0").unwrap();
    let handles: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            std::thread::spawn(move || {
                for _ in 0..25 {
                    loop {
                        let current = store.get("counter").unwrap().unwrap();
                        let next = (current.parse::<u32>().unwrap() + 1).to_string();
                        if store.compare_and_swap("counter", Some(&current), &next).unwrap() {
                            break;
                        }
                    }
                }
            })
        })
        .collect();
    for h in handles {
        h.join().unwrap();
    }
    assert_eq!(store.get("counter").unwrap().as_deref(), Some("100"));
}
