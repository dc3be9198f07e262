// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;

fn rec(at_ms: u64, status: HealthStatus) -> HealthRecord {
    HealthRecord { at_ms, status, details: None }
}

#[test]
fn eleven_records_into_ten_keeps_newest_ten() {
    let mut history = HealthHistory::new(10);
    for i in 0..11 {
        history.record(rec(i, HealthStatus::Healthy));
    }
    assert_eq!(history.len(), 10);
    let stamps: Vec<u64> = history.records().map(|r| r.at_ms).collect();
    assert_eq!(stamps, (1..11).collect::<Vec<_>>());
}

#[test]
fn consecutive_counts_degraded_and_unhealthy() {
    let mut history = HealthHistory::default();
    assert_eq!(history.record(rec(1, HealthStatus::Degraded)), 1);
    assert_eq!(history.record(rec(2, HealthStatus::Unhealthy)), 2);
    assert_eq!(history.record(rec(3, HealthStatus::Degraded)), 3);
    assert_eq!(history.record(rec(4, HealthStatus::Healthy)), 0);
    assert_eq!(history.record(rec(5, HealthStatus::Unhealthy)), 1);
}

#[test]
fn consecutive_survives_eviction() {
    let mut history = HealthHistory::new(2);
    for i in 0..5 {
        history.record(rec(i, HealthStatus::Degraded));
    }
    assert_eq!(history.len(), 2);
    assert_eq!(history.consecutive_degraded(), 5);
}

#[test]
fn next_consecutive_predicts_record() {
    let mut history = HealthHistory::default();
    history.record(rec(1, HealthStatus::Degraded));
    let predicted = history.next_consecutive(HealthStatus::Unhealthy);
    assert_eq!(history.record(rec(2, HealthStatus::Unhealthy)), predicted);
}

#[test]
fn shrinking_limit_evicts_oldest() {
    let mut history = HealthHistory::new(5);
    for i in 0..5 {
        history.record(rec(i, HealthStatus::Healthy));
    }
    history.set_limit(3);
    assert_eq!(history.latest().map(|r| r.at_ms), Some(4));
    assert_eq!(history.records().next().map(|r| r.at_ms), Some(2));
}

fn arb_status() -> impl Strategy<Value = HealthStatus> {
    prop_oneof![
        Just(HealthStatus::Healthy),
        Just(HealthStatus::Degraded),
        Just(HealthStatus::Unhealthy),
    ]
}

proptest! {
    #[test]
    fn never_exceeds_limit(limit in 1usize..20, statuses in proptest::collection::vec(arb_status(), 0..60)) {
        let mut history = HealthHistory::new(limit);
        for (i, s) in statuses.iter().enumerate() {
            history.record(rec(i as u64, *s));
        }
        prop_assert!(history.len() <= limit);
        prop_assert_eq!(history.len(), statuses.len().min(limit));
    }

    #[test]
    fn consecutive_equals_trailing_non_healthy_run(statuses in proptest::collection::vec(arb_status(), 0..60)) {
        let mut history = HealthHistory::new(10);
        for (i, s) in statuses.iter().enumerate() {
            history.record(rec(i as u64, *s));
        }
        let trailing = statuses.iter().rev().take_while(|s| **s != HealthStatus::Healthy).count();
        prop_assert_eq!(history.consecutive_degraded() as usize, trailing);
    }
}
