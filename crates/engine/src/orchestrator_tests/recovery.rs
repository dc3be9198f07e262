// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use crate::test_helpers::*;
use crate::GuardConfig;
use dg_core::{AuditOutcome, BreakerState, Decision, DeployTarget, ErrorKind, Track};

#[test]
fn manual_trigger_needs_reason() {
    let ctx = setup();
    let report = ctx.guard.trigger_recovery("oncall", "hm").unwrap();
    assert_eq!(report.decision, Decision::Blocked);
    assert_eq!(report.error_kind, Some(ErrorKind::Validation));
}

#[test]
fn manual_trigger_respects_recovery_breaker() {
    let ctx = setup();
    let report = ctx.guard.trigger_recovery("oncall", "memory leak suspected").unwrap();
    assert_eq!(report.decision, Decision::TriggerRecovery);

    ctx.guard.open_breaker(Some(Track::Recovery), "stop auto recovery", "admin").unwrap();
    let report = ctx.guard.trigger_recovery("oncall", "memory leak suspected").unwrap();
    assert_eq!(report.decision, Decision::BlockedManualInterventionRequired);
}

#[test]
fn successful_recovery_allows_and_keeps_counts() {
    let ctx = setup();
    ctx.guard.report_recovery(false, None, Some("restart failed".into()), "monitor").unwrap();
    let report = ctx.guard.report_recovery(true, Some("sess-2".into()), None, "monitor").unwrap();
    assert_eq!(report.decision, Decision::Allow);
    let recovery = &report.context.breakers[0];
    assert_eq!(recovery.failure_count, 1);

    let completion = ctx.guard.recovery_history().last_completion.unwrap();
    assert!(completion.success);
    assert_eq!(completion.session.as_deref(), Some("sess-2"));
}

#[test]
fn failed_recovery_without_backup_escalates() {
    let ctx = setup();
    let report = ctx.guard.report_recovery(false, None, None, "monitor").unwrap();
    assert_eq!(report.decision, Decision::Escalate);
    assert!(report.target.is_none());
}

#[tokio::test]
async fn failed_recovery_recommends_backup_redeploy() {
    let ctx = setup();
    let first = ctx.deployed(1, "run-1").await;
    ctx.deployed(2, "run-2").await;

    let report = ctx.guard.report_recovery(false, None, None, "monitor").unwrap();
    assert_eq!(report.decision, Decision::TriggerRedeploy);
    assert_eq!(report.target, Some(DeployTarget::Digest { digest: first }));
}

#[tokio::test]
async fn failed_recovery_with_open_deployment_breaker_escalates() {
    let ctx = setup();
    ctx.deployed(1, "run-1").await;
    ctx.deployed(2, "run-2").await;
    ctx.guard.open_breaker(Some(Track::Deployment), "deploy freeze", "admin").unwrap();
    let report = ctx.guard.report_recovery(false, None, None, "monitor").unwrap();
    assert_eq!(report.decision, Decision::Escalate);
}

#[test]
fn repeated_failures_block_redeployment() {
    let ctx = setup_with(GuardConfig { recovery_threshold: 2, ..Default::default() });
    let first = ctx.guard.report_recovery(false, None, None, "monitor").unwrap();
    assert_ne!(first.decision, Decision::EscalateRedeploymentBlocked);

    let second = ctx.guard.report_recovery(false, None, None, "monitor").unwrap();
    assert_eq!(second.decision, Decision::EscalateRedeploymentBlocked);
    assert_eq!(second.context.breakers[0].state, BreakerState::Open);
    assert_eq!(ctx.guard.audit_entries(Some(1))[0].outcome, AuditOutcome::Blocked);

    let third = ctx.guard.report_recovery(false, None, None, "monitor").unwrap();
    assert_eq!(third.decision, Decision::EscalateRedeploymentBlocked);
    assert_eq!(third.context.breakers[0].failure_count, 3);
}
