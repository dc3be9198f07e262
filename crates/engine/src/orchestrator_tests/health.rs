// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_helpers::*;
use crate::GuardConfig;
use dg_core::{AuditOutcome, Decision, HealthStatus, Track};

#[test]
fn healthy_signal_allows() {
    let ctx = setup();
    let report = ctx.guard.evaluate_health(HealthStatus::Healthy, None, None, "monitor").unwrap();
    assert_eq!(report.decision, Decision::Allow);
    assert_eq!(report.context.consecutive_degraded, 0);
    assert_eq!(ctx.guard.health_history().len(), 1);
}

#[test]
fn recovery_triggers_at_configured_threshold() {
    let ctx = setup_with(GuardConfig { recovery_trigger_threshold: 3, ..Default::default() });
    let statuses = [HealthStatus::Degraded, HealthStatus::Unhealthy];
    for status in statuses {
        let report = ctx.guard.evaluate_health(status, None, None, "monitor").unwrap();
        assert_eq!(report.decision, Decision::Allow);
    }
    let report = ctx
        .guard
        .evaluate_health(HealthStatus::Degraded, Some("p99 > 2s".into()), None, "monitor")
        .unwrap();
    assert_eq!(report.decision, Decision::TriggerRecovery);
    assert_eq!(report.context.consecutive_degraded, 3);

    let history = ctx.guard.recovery_history();
    assert!(history.last_trigger.is_some());
}

#[test]
fn identical_samples_each_extend_the_streak() {
    let ctx = setup_with(GuardConfig { recovery_trigger_threshold: 3, ..Default::default() });
    let mut decisions = Vec::new();
    for _ in 0..3 {
        let report =
            ctx.guard.evaluate_health(HealthStatus::Degraded, None, Some(5_000), "monitor").unwrap();
        decisions.push((report.decision, report.context.consecutive_degraded));
    }
    assert_eq!(
        decisions,
        vec![(Decision::Allow, 1), (Decision::Allow, 2), (Decision::TriggerRecovery, 3)]
    );
    assert_eq!(ctx.guard.health_history().len(), 3);
    assert_eq!(ctx.guard.health_history().consecutive_degraded(), 3);
}

#[test]
fn stored_streak_matches_decisions_without_clock_movement() {
    let ctx = setup_with(GuardConfig { recovery_trigger_threshold: 2, ..Default::default() });
    for expected in 1..=3u32 {
        let report = ctx.guard.evaluate_health(HealthStatus::Unhealthy, None, None, "monitor").unwrap();
        assert_eq!(report.context.consecutive_degraded, expected);
    }
    assert_eq!(ctx.guard.health_history().consecutive_degraded(), 3);
}

#[test]
fn healthy_sample_resets_the_streak() {
    let ctx = setup_with(GuardConfig { recovery_trigger_threshold: 2, ..Default::default() });
    ctx.guard.evaluate_health(HealthStatus::Degraded, None, None, "monitor").unwrap();
    ctx.guard.evaluate_health(HealthStatus::Healthy, None, None, "monitor").unwrap();
    let report = ctx.guard.evaluate_health(HealthStatus::Degraded, None, None, "monitor").unwrap();
    assert_eq!(report.decision, Decision::Allow);
    assert_eq!(report.context.consecutive_degraded, 1);
}

#[test]
fn open_recovery_breaker_suppresses_recovery() {
    let ctx = setup_with(GuardConfig { recovery_trigger_threshold: 1, ..Default::default() });
    ctx.guard.open_breaker(Some(Track::Recovery), "flapping restarts", "admin").unwrap();
    let report = ctx.guard.evaluate_health(HealthStatus::Unhealthy, None, None, "monitor").unwrap();
    assert_eq!(report.decision, Decision::BlockedManualInterventionRequired);
    assert!(report.reason.contains("recovery circuit breaker is open"));

    let entry = &ctx.guard.audit_entries(Some(1))[0];
    assert_eq!(entry.action, "health.evaluate");
    assert_eq!(entry.outcome, AuditOutcome::Blocked);
    assert!(ctx.guard.recovery_history().last_trigger.is_none());
}

#[test]
fn history_stays_bounded() {
    let ctx = setup_with(GuardConfig { health_history_limit: 10, ..Default::default() });
    for i in 0..11u64 {
        ctx.guard
            .evaluate_health(HealthStatus::Healthy, Some(format!("sample {i}")), Some(1_000 + i), "monitor")
            .unwrap();
    }
    let history = ctx.guard.health_history();
    assert_eq!(history.len(), 10);
    assert_eq!(history.records().next().and_then(|r| r.details.as_deref()), Some("sample 1"));
}
