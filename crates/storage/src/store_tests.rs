// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Contract tests run against every `StateStore` implementation.

use super::*;
use crate::{FileStore, MemoryStore};
use yare::parameterized;

#[parameterized(
    simple = { "snapshot" },
    nested = { "journal/00000000000000000001" },
    dotted = { "snapshot.bak" },
    dashes = { "a-b_c/d.e" },
)]
fn accepts_valid_keys(key: &str) {
    assert!(validate_key(key).is_ok());
}

#[parameterized(
    empty = { "" },
    leading_slash = { "/etc/passwd" },
    trailing_slash = { "journal/" },
    double_slash = { "a//b" },
    parent = { "../escape" },
    inner_parent = { "a/../b" },
    hidden = { ".store.lock" },
    space = { "has space" },
    tilde = { "x.~tmp" },
    unicode = { "clé" },
)]
fn rejects_invalid_keys(key: &str) {
    assert!(matches!(validate_key(key), Err(StoreError::InvalidKey(_))));
}

fn contract(store: &dyn StateStore) {
    assert_eq!(store.get("k").unwrap(), None);
    store.set("k", "v1").unwrap();
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v1"));

    // CAS with stale expectation fails and leaves the value alone
    assert!(!store.compare_and_swap("k", Some("v0"), "v2").unwrap());
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v1"));

    assert!(store.compare_and_swap("k", Some("v1"), "v2").unwrap());
    assert_eq!(store.get("k").unwrap().as_deref(), Some("v2"));

    // Create-if-absent
    assert!(!store.compare_and_swap("k", None, "v3").unwrap());
    assert!(store.compare_and_swap("fresh/key", None, "x").unwrap());

    assert_eq!(store.keys("").unwrap(), vec!["fresh/key".to_string(), "k".to_string()]);
    assert_eq!(store.keys("fresh/").unwrap(), vec!["fresh/key".to_string()]);

    store.delete("k").unwrap();
    store.delete("k").unwrap();
    assert_eq!(store.get("k").unwrap(), None);

    assert!(matches!(store.set("../x", "v"), Err(StoreError::InvalidKey(_))));
    assert!(matches!(store.get("/abs"), Err(StoreError::InvalidKey(_))));
}

#[test]
fn memory_store_honors_contract() {
    contract(&MemoryStore::new());
}

#[test]
fn file_store_honors_contract() {
    let dir = tempfile::tempdir().unwrap();
    let store = FileStore::open(dir.path()).unwrap();
    contract(&store);
}
