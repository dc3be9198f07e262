// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

mod consistency;
mod deploy;
mod health;
mod recovery;

use super::*;
use crate::test_helpers::*;
use dg_core::{AuditOutcome, ErrorKind};

#[test]
fn refusal_is_audited_with_error_kind() {
    let ctx = setup();
    let err = GuardError::not_found("nothing here");
    let report = ctx.guard.refuse("redeploy", ACTOR, json!({}), None, &err).unwrap();
    assert_eq!(report.decision, Decision::Blocked);
    assert_eq!(report.error_kind, Some(ErrorKind::NotFound));

    let entry = &ctx.guard.audit_entries(Some(1))[0];
    assert_eq!(entry.id, report.audit_id);
    assert_eq!(entry.error_kind, Some(ErrorKind::NotFound));
    assert_eq!(entry.outcome, AuditOutcome::Blocked);
    assert_eq!(entry.result["decision"], "blocked");
}

#[test]
fn infrastructure_errors_escalate() {
    let ctx = setup();
    let err = GuardError::RegistryUnreachable("timeout".to_string());
    let report = ctx.guard.refuse("redeploy", "", json!({}), None, &err).unwrap();
    assert_eq!(report.decision, Decision::Escalate);
    let entry = &ctx.guard.audit_entries(Some(1))[0];
    assert_eq!(entry.actor, "unknown");
    assert_eq!(entry.outcome, AuditOutcome::Failure);
}
