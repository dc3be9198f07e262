// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use std::collections::HashSet;

crate::define_id! {
    /// ID type used only by these tests.
    pub struct ProbeId("prb-");
}

#[test]
fn new_ids_carry_prefix_and_fit_inline() {
    let id = ProbeId::new();
    assert!(id.as_str().starts_with("prb-"));
    assert_eq!(id.as_str().len(), 23);
    assert_eq!(id.suffix().len(), 19);
}

#[test]
fn new_ids_are_unique() {
    let ids: HashSet<_> = (0..100).map(|_| ProbeId::new()).collect();
    assert_eq!(ids.len(), 100);
}

#[test]
fn lookup_by_str_through_borrow() {
    let mut set = HashSet::new();
    set.insert(ProbeId::from_string("prb-abc"));
    assert!(set.contains("prb-abc"));
}

#[test]
fn id_short_uses_suffix() {
    let id = ProbeId::from_string("prb-abcdefghij");
    assert_eq!(id.short(4), "abcd");
    assert_eq!(id.short(100), "abcdefghij");
}

#[test]
fn short_respects_char_boundaries() {
    assert_eq!(short("abcdefgh", 3), "abc");
    assert_eq!(short("abc", 8), "abc");
    assert_eq!(short("ééé", 2), "éé");
}

#[test]
fn serializes_transparently() {
    let id = ProbeId::from_string("prb-xyz");
    assert_eq!(serde_json::to_string(&id).unwrap(), "\"prb-xyz\"");
}
