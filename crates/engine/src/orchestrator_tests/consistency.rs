// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_helpers::*;
use crate::GuardConfig;
use dg_core::{ArtifactStatus, IssueSeverity, Track};
use std::time::Duration;

#[test]
fn fresh_state_is_consistent() {
    let ctx = setup();
    let report = ctx.guard.consistency();
    assert!(report.consistent);
    assert!(report.issues.is_empty());
}

#[test]
fn lowered_threshold_leaves_closed_breaker_over_limit() {
    let ctx = setup();
    ctx.guard.record_failure(Track::Deployment, None, ACTOR).unwrap();
    ctx.guard.record_failure(Track::Deployment, None, ACTOR).unwrap();
    ctx.guard.set_threshold(Track::Deployment, 2, None, "admin").unwrap();

    let report = ctx.guard.consistency();
    assert!(!report.consistent);
    assert_eq!(report.issues[0].component, "breaker.deployment");
    assert!(report.issues[0].message.contains("dg breaker check"));
}

#[test]
fn raised_threshold_after_auto_open_is_informational() {
    let ctx = setup_with(GuardConfig { recovery_threshold: 1, ..Default::default() });
    ctx.guard.record_failure(Track::Recovery, None, ACTOR).unwrap();
    ctx.guard.set_threshold(Track::Recovery, 4, None, "admin").unwrap();

    let report = ctx.guard.consistency();
    assert!(report.consistent);
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].severity, IssueSeverity::Info);
}

#[test]
fn stale_lock_is_reported() {
    let ctx = setup();
    ctx.guard.acquire_lock(acquire("opA", "run-1")).unwrap();
    ctx.clock.advance(Duration::from_secs(60));
    assert!(ctx.guard.consistency().consistent);

    ctx.clock.advance(Duration::from_secs(ctx.guard.config().stale_lock_secs));
    let report = ctx.guard.consistency();
    assert!(!report.consistent);
    let issue = report.issues.iter().find(|i| i.component == "lock").unwrap();
    assert!(issue.message.contains("consider clearing stuck deployment lock"));
    assert!(report.context.lock.held);
}

#[tokio::test]
async fn current_deployment_with_forced_status_is_flagged() {
    let ctx = setup();
    let digest = ctx.deployed(1, "run-1").await;
    let mut update = status_req(&digest, ArtifactStatus::Failed);
    update.force = true;
    update.reason = Some(BYPASS_REASON.to_string());
    ctx.guard.update_status(update).unwrap();

    let report = ctx.guard.consistency();
    assert!(!report.consistent);
    let issue = report.issues.iter().find(|i| i.component == "deployment").unwrap();
    assert!(issue.message.contains("has status failed"), "{}", issue.message);
}
