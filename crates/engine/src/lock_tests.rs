// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::test_helpers::*;
use dg_core::test_support::holder;
use dg_core::ErrorKind;
use std::time::Duration;

fn emergency(holder: &str, run: &str, reason: Option<&str>) -> AcquireRequest {
    AcquireRequest {
        holder_id: holder.to_string(),
        run_id: run.to_string(),
        emergency: true,
        reason: reason.map(str::to_string),
    }
}

#[test]
fn claim_on_free_lock_takes_it() {
    let state = MaterializedState::default();
    let got = claim(&state, "opA", "run1", false, 5);
    assert_eq!(got, Claim::Take { holder: holder("opA", "run1", 5), displaced: None });
}

#[test]
fn claim_by_same_holder_and_run_is_reentrant() {
    let mut state = MaterializedState::default();
    state.lock = Some(holder("opA", "run1", 5));
    assert_eq!(claim(&state, "opA", "run1", false, 9), Claim::AlreadyHeld);
    assert!(matches!(claim(&state, "opA", "run2", false, 9), Claim::Busy(_)));
}

#[test]
fn emergency_claim_displaces_holder() {
    let mut state = MaterializedState::default();
    state.lock = Some(holder("opA", "run1", 5));
    let Claim::Take { holder: taken, displaced } = claim(&state, "opB", "run2", true, 9) else {
        panic!("expected takeover");
    };
    assert!(taken.emergency_override);
    assert_eq!(taken.overridden_holder.as_deref(), Some("opA"));
    assert_eq!(displaced, Some(holder("opA", "run1", 5)));
}

#[test]
fn lock_scenario_acquire_conflict_release() {
    let ctx = setup();
    assert!(ctx.guard.acquire_lock(acquire("opA", "run1")).unwrap().is_locked());

    let second = ctx.guard.acquire_lock(acquire("opB", "run2")).unwrap();
    let AcquireOutcome::Conflict { holder, .. } = second else {
        panic!("expected conflict, got {second:?}");
    };
    assert_eq!(holder.holder_id, "opA");

    let err = ctx.guard.release_lock("opB").unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotOwner);

    ctx.guard.release_lock("opA").unwrap();
    assert!(ctx.guard.acquire_lock(acquire("opB", "run3")).unwrap().is_locked());
    assert_eq!(ctx.guard.lock_status().holder_id.as_deref(), Some("opB"));
}

#[test]
fn conflict_reports_holder_age() {
    let ctx = setup();
    ctx.guard.acquire_lock(acquire("opA", "run1")).unwrap();
    ctx.clock.advance(Duration::from_secs(90));
    match ctx.guard.acquire_lock(acquire("opB", "run2")).unwrap() {
        AcquireOutcome::Conflict { age_ms, .. } => assert_eq!(age_ms, 90_000),
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[test]
fn retried_acquire_is_idempotent() {
    let ctx = setup();
    ctx.guard.acquire_lock(acquire("opA", "run1")).unwrap();
    let seq = ctx.guard.ledger().write_seq();
    assert!(ctx.guard.acquire_lock(acquire("opA", "run1")).unwrap().is_locked());
    assert_eq!(ctx.guard.ledger().write_seq(), seq);
}

#[test]
fn emergency_acquire_requires_a_bypass_reason() {
    let ctx = setup();
    ctx.guard.acquire_lock(acquire("opA", "run1")).unwrap();
    let err = ctx.guard.acquire_lock(emergency("opB", "run2", Some("urgent"))).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
    let err = ctx.guard.acquire_lock(emergency("opB", "run2", None)).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn emergency_acquire_overrides_and_audits_both_holders() {
    let ctx = setup();
    ctx.guard.acquire_lock(acquire("opA", "run1")).unwrap();
    let outcome =
        ctx.guard.acquire_lock(emergency("opB", "run2", Some(BYPASS_REASON))).unwrap();
    let AcquireOutcome::Locked { status, overridden } = outcome else {
        panic!("expected lock");
    };
    assert!(status.emergency_override);
    assert_eq!(overridden.map(|h| h.holder_id).as_deref(), Some("opA"));

    let entry = &ctx.guard.audit_entries(Some(1))[0];
    assert_eq!(entry.outcome, AuditOutcome::Override);
    assert_eq!(entry.result["overriding_holder"], "opB");
    assert_eq!(entry.result["overridden_holder"], "opA");
    assert_eq!(entry.inputs["reason"], BYPASS_REASON);
}

#[test]
fn emergency_acquire_of_free_lock_is_ordinary() {
    let ctx = setup();
    let outcome =
        ctx.guard.acquire_lock(emergency("opB", "run2", Some(BYPASS_REASON))).unwrap();
    let AcquireOutcome::Locked { status, overridden } = outcome else {
        panic!("expected lock");
    };
    assert!(!status.emergency_override);
    assert!(overridden.is_none());
    assert_eq!(ctx.guard.audit_entries(Some(1))[0].outcome, AuditOutcome::Success);
}

#[test]
fn release_of_free_lock_is_not_found() {
    let ctx = setup();
    assert_eq!(ctx.guard.release_lock("opA").unwrap_err().kind(), ErrorKind::NotFound);
}

#[test]
fn release_from_displaced_holder_is_refused() {
    let ctx = setup();
    ctx.guard.acquire_lock(acquire("opA", "run1")).unwrap();
    ctx.guard.acquire_lock(emergency("opB", "run2", Some(BYPASS_REASON))).unwrap();
    assert_eq!(ctx.guard.release_lock("opA").unwrap_err().kind(), ErrorKind::NotOwner);
    assert!(ctx.guard.lock_status().held);
}

#[test]
fn clear_bypasses_holder_check_and_is_audited() {
    let ctx = setup();
    ctx.guard.acquire_lock(acquire("opA", "run1")).unwrap();
    let cleared = ctx.guard.clear_lock("admin", Some("runner crashed mid-deploy")).unwrap();
    assert_eq!(cleared.map(|h| h.holder_id).as_deref(), Some("opA"));
    assert!(!ctx.guard.lock_status().held);

    let entry = &ctx.guard.audit_entries(Some(1))[0];
    assert_eq!(entry.action, "lock.clear");
    assert_eq!(entry.actor, "admin");
    assert_eq!(entry.result["cleared_holder"], "opA");
}

#[test]
fn clear_needs_reason_and_is_a_no_op_when_free() {
    let ctx = setup();
    assert_eq!(ctx.guard.clear_lock("admin", None).unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(ctx.guard.clear_lock("admin", Some("tidy up")).unwrap(), None);
    assert_eq!(ctx.guard.ledger().write_seq(), 0);
}

#[test]
fn blank_ids_are_rejected() {
    let ctx = setup();
    assert_eq!(ctx.guard.acquire_lock(acquire(" ", "run1")).unwrap_err().kind(), ErrorKind::Validation);
    assert_eq!(ctx.guard.acquire_lock(acquire("opA", "")).unwrap_err().kind(), ErrorKind::Validation);
}
