// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

fn failure(track: Track, count: u32, at_ms: u64) -> Event {
    Event::BreakerFailureRecorded {
        track,
        failure_count: count,
        reason: Some("boom".to_string()),
        at_ms,
    }
}

fn opened(track: Track, by: OpenedBy) -> Event {
    Event::BreakerOpened {
        track,
        by,
        reason: "threshold_exceeded".to_string(),
        actor: None,
        at_ms: 50,
    }
}

fn kinds(state: &MaterializedState, track: Track) -> Vec<BreakerEventKind> {
    state.breaker(track).events.iter().map(|e| e.kind).collect()
}

#[test]
fn failure_count_is_assigned_not_incremented() {
    let mut state = MaterializedState::default();
    apply_twice(&mut state, &failure(Track::Deployment, 1, 10));
    assert_eq!(state.breaker(Track::Deployment).failure_count, 1);
    assert_eq!(state.breaker(Track::Deployment).last_failure_at_ms, Some(10));
}

#[test]
fn crossing_threshold_adds_one_breach_entry() {
    let mut state = MaterializedState::with_thresholds(3, 3);
    for n in 1..=4 {
        apply_twice(&mut state, &failure(Track::Deployment, n, u64::from(n)));
    }
    assert_eq!(kinds(&state, Track::Deployment), vec![BreakerEventKind::ThresholdBreached]);
}

#[test]
fn open_and_close_record_trail_once() {
    let mut state = MaterializedState::default();
    apply_twice(&mut state, &opened(Track::Recovery, OpenedBy::Manual));
    let track = state.breaker(Track::Recovery);
    assert!(track.is_open());
    assert_eq!(track.opened_by, Some(OpenedBy::Manual));
    assert_eq!(track.opened_at_ms, Some(50));

    let close = Event::BreakerClosed {
        track: Track::Recovery,
        reset_failures: false,
        actor: "ops".to_string(),
        at_ms: 60,
    };
    apply_twice(&mut state, &close);
    let track = state.breaker(Track::Recovery);
    assert!(!track.is_open());
    assert_eq!(track.opened_at_ms, None);
    assert_eq!(
        kinds(&state, Track::Recovery),
        vec![BreakerEventKind::Opened, BreakerEventKind::Closed]
    );
}

#[test]
fn close_with_reset_clears_count_but_keep_preserves_it() {
    let mut state = MaterializedState::default();
    state.apply_event(&failure(Track::Deployment, 4, 1));
    state.apply_event(&Event::BreakerClosed {
        track: Track::Deployment,
        reset_failures: false,
        actor: "ops".to_string(),
        at_ms: 2,
    });
    assert_eq!(state.breaker(Track::Deployment).failure_count, 4);
    state.apply_event(&Event::BreakerClosed {
        track: Track::Deployment,
        reset_failures: true,
        actor: "ops".to_string(),
        at_ms: 3,
    });
    assert_eq!(state.breaker(Track::Deployment).failure_count, 0);
}

#[test]
fn tracks_are_independent() {
    let mut state = MaterializedState::default();
    state.apply_event(&opened(Track::Recovery, OpenedBy::Auto));
    state.apply_event(&failure(Track::Recovery, 3, 1));
    assert!(state.breaker(Track::Recovery).is_open());
    assert!(!state.breaker(Track::Deployment).is_open());
    assert_eq!(state.breaker(Track::Deployment).failure_count, 0);
}

#[test]
fn threshold_change_recorded_only_when_different() {
    let mut state = MaterializedState::default();
    let set = Event::BreakerThresholdSet {
        track: Track::Deployment,
        threshold: 2,
        actor: "ops".to_string(),
        at_ms: 1,
    };
    apply_twice(&mut state, &set);
    assert_eq!(state.breaker(Track::Deployment).threshold, 2);
    assert_eq!(kinds(&state, Track::Deployment), vec![BreakerEventKind::ThresholdChanged]);
}
