// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::*;
use crate::GuardConfig;
use dg_core::{BreakerEventKind, BreakerState, ErrorKind};
use proptest::prelude::*;
use yare::parameterized;

fn deployment_state(ctx: &TestContext) -> BreakerStatus {
    ctx.guard.breaker_status(Some(Track::Deployment)).remove(0)
}

#[test]
fn threshold_property_at_three() {
    let ctx = setup_with(GuardConfig { deployment_threshold: 3, ..Default::default() });
    let first = ctx.guard.record_failure(Track::Deployment, None, ACTOR).unwrap();
    let second = ctx.guard.record_failure(Track::Deployment, None, ACTOR).unwrap();
    assert_eq!(second.state, BreakerState::Closed);
    assert_eq!(first.failure_count, 1);

    let third = ctx.guard.record_failure(Track::Deployment, None, ACTOR).unwrap();
    assert_eq!(third.state, BreakerState::Open);
    assert_eq!(third.opened_by, Some(OpenedBy::Auto));
    assert_eq!(third.open_reason.as_deref(), Some(AUTO_OPEN_REASON));
    let opened_at = third.opened_at_ms;

    ctx.clock.advance(std::time::Duration::from_secs(1));
    let fourth = ctx.guard.record_failure(Track::Deployment, None, ACTOR).unwrap();
    assert_eq!(fourth.state, BreakerState::Open);
    assert_eq!(fourth.failure_count, 4);
    assert_eq!(fourth.opened_at_ms, opened_at);
}

proptest! {
    #[test]
    fn opens_exactly_at_threshold(threshold in 1u32..8, extra in 0u32..4) {
        let ctx = setup_with(GuardConfig { recovery_threshold: threshold, ..Default::default() });
        for n in 1..threshold {
            let status = ctx.guard.record_failure(Track::Recovery, None, ACTOR).unwrap();
            prop_assert_eq!(status.state, BreakerState::Closed, "failure {}", n);
        }
        for n in 0..=extra {
            let status = ctx.guard.record_failure(Track::Recovery, None, ACTOR).unwrap();
            prop_assert_eq!(status.state, BreakerState::Open);
            prop_assert_eq!(status.failure_count, threshold + n);
        }
        let opened = ctx
            .guard
            .breaker_events(Some(Track::Recovery))
            .iter()
            .filter(|e| e.kind == BreakerEventKind::Opened)
            .count();
        prop_assert_eq!(opened, 1);
    }
}

#[test]
fn tracks_are_independent() {
    let ctx = setup_with(GuardConfig { recovery_threshold: 1, ..Default::default() });
    ctx.guard.record_failure(Track::Recovery, Some("restart loop".into()), ACTOR).unwrap();
    let statuses = ctx.guard.breaker_status(None);
    assert_eq!(statuses[0].track, Track::Recovery);
    assert_eq!(statuses[0].state, BreakerState::Open);
    assert_eq!(statuses[1].track, Track::Deployment);
    assert_eq!(statuses[1].state, BreakerState::Closed);
    assert_eq!(statuses[1].failure_count, 0);
}

#[test]
fn check_opens_a_track_already_over_threshold() {
    let ctx = setup_with(GuardConfig { deployment_threshold: 4, ..Default::default() });
    for _ in 0..2 {
        ctx.guard.record_failure(Track::Deployment, None, ACTOR).unwrap();
    }
    ctx.guard.set_threshold(Track::Deployment, 2, None, "admin").unwrap();
    assert_eq!(deployment_state(&ctx).state, BreakerState::Closed);

    let checks = ctx.guard.check_thresholds(None, "monitor").unwrap();
    assert_eq!(
        checks,
        vec![
            TrackCheck { track: Track::Recovery, check: ThresholdCheck::WithinLimits },
            TrackCheck { track: Track::Deployment, check: ThresholdCheck::Opened { newly_opened: true } },
        ]
    );
    assert_eq!(deployment_state(&ctx).state, BreakerState::Open);

    let again = ctx.guard.check_thresholds(Some(Track::Deployment), "monitor").unwrap();
    assert_eq!(again[0].check, ThresholdCheck::Opened { newly_opened: false });
}

#[test]
fn check_within_limits_writes_nothing() {
    let ctx = setup();
    ctx.guard.check_thresholds(None, "monitor").unwrap();
    assert_eq!(ctx.guard.ledger().write_seq(), 0);
}

#[test]
fn manual_open_requires_reason() {
    let ctx = setup();
    let err = ctx.guard.open_breaker(None, "no", "admin").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn manual_open_applies_to_selected_tracks() {
    let ctx = setup();
    let statuses = ctx.guard.open_breaker(Some(Track::Deployment), "freeze for release", "admin").unwrap();
    assert_eq!(statuses.len(), 1);
    assert_eq!(statuses[0].opened_by, Some(OpenedBy::Manual));
    assert_eq!(ctx.guard.breaker_status(Some(Track::Recovery))[0].state, BreakerState::Closed);

    let all = ctx.guard.open_breaker(None, "freeze everything", "admin").unwrap();
    assert!(all.iter().all(|s| s.state == BreakerState::Open));
}

#[parameterized(
    reset = { true, 0 },
    keep = { false, 3 },
)]
fn close_resets_or_keeps_failures(reset_failures: bool, expected: u32) {
    let ctx = setup_with(GuardConfig { deployment_threshold: 3, ..Default::default() });
    for _ in 0..3 {
        ctx.guard.record_failure(Track::Deployment, None, ACTOR).unwrap();
    }
    let statuses = ctx
        .guard
        .close_breaker(Some(Track::Deployment), reset_failures, false, None, "admin")
        .unwrap();
    assert_eq!(statuses[0].state, BreakerState::Closed);
    assert_eq!(statuses[0].failure_count, expected);
    assert!(statuses[0].opened_at_ms.is_none());
}

#[test]
fn close_conflicts_with_held_lock_unless_forced() {
    let ctx = setup();
    ctx.guard.open_breaker(None, "incident 42", "admin").unwrap();
    ctx.guard.acquire_lock(acquire("opA", "run1")).unwrap();

    let err = ctx.guard.close_breaker(None, true, false, None, "admin").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Conflict);

    // The recovery track does not involve the deployment lock
    ctx.guard.close_breaker(Some(Track::Recovery), true, false, None, "admin").unwrap();

    let err = ctx.guard.close_breaker(None, true, true, Some("short"), "admin").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);

    let statuses =
        ctx.guard.close_breaker(None, true, true, Some(BYPASS_REASON), "admin").unwrap();
    assert!(statuses.iter().all(|s| s.state == BreakerState::Closed));
    assert_eq!(ctx.guard.audit_entries(Some(1))[0].outcome, AuditOutcome::Override);
}

#[test]
fn zero_threshold_is_rejected() {
    let ctx = setup();
    let err = ctx.guard.set_threshold(Track::Recovery, 0, None, "admin").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn threshold_change_audits_optional_reason() {
    let ctx = setup();
    ctx.guard
        .set_threshold(Track::Deployment, 8, Some(" release train week "), "admin")
        .unwrap();
    let entry = &ctx.guard.audit_entries(Some(1))[0];
    assert_eq!(entry.action, "breaker.threshold");
    assert_eq!(entry.inputs["threshold"], 8);
    assert_eq!(entry.inputs["reason"], "release train week");

    ctx.guard.set_threshold(Track::Deployment, 6, None, "admin").unwrap();
    let entry = &ctx.guard.audit_entries(Some(1))[0];
    assert!(entry.inputs["reason"].is_null());
}

#[test]
fn events_trail_is_ordered_across_tracks() {
    let ctx = setup_with(GuardConfig { recovery_threshold: 1, deployment_threshold: 1, ..Default::default() });
    ctx.guard.record_failure(Track::Deployment, None, ACTOR).unwrap();
    ctx.clock.advance(std::time::Duration::from_secs(1));
    ctx.guard.record_failure(Track::Recovery, None, ACTOR).unwrap();
    ctx.clock.advance(std::time::Duration::from_secs(1));
    ctx.guard.close_breaker(Some(Track::Deployment), true, false, None, "admin").unwrap();

    let kinds: Vec<(Track, BreakerEventKind)> =
        ctx.guard.breaker_events(None).iter().map(|e| (e.track, e.kind)).collect();
    assert_eq!(
        kinds,
        vec![
            (Track::Deployment, BreakerEventKind::ThresholdBreached),
            (Track::Deployment, BreakerEventKind::Opened),
            (Track::Recovery, BreakerEventKind::ThresholdBreached),
            (Track::Recovery, BreakerEventKind::Opened),
            (Track::Deployment, BreakerEventKind::Closed),
        ]
    );
}

#[test]
fn export_collects_status_history_and_trail() {
    let ctx = setup_with(GuardConfig { deployment_threshold: 1, ..Default::default() });
    ctx.guard.record_failure(Track::Deployment, Some("rollout timed out".into()), ACTOR).unwrap();
    let export = ctx.guard.breaker_export();
    assert!(export.timestamp.starts_with("2023-11-14T"));
    assert_eq!(export.circuit_breaker.len(), 2);
    assert_eq!(export.event_log.len(), 2);
    let deployment = export.threshold_status.iter().find(|t| t.track == Track::Deployment).unwrap();
    assert!(deployment.exceeded);
    let json = serde_json::to_value(&export).unwrap();
    for key in ["timestamp", "circuit_breaker", "recovery_history", "event_log", "threshold_status"] {
        assert!(json.get(key).is_some(), "missing {key}");
    }
}
