// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dg_core::test_support::{holder, test_digest};
use dg_core::{
    ArtifactStatus, AuditEntry, BreakerEventKind, BreakerState, DeployTarget, HealthRecord,
    HealthStatus, OpenedBy, TestResult, TestStatus,
};

mod breakers;

fn apply_twice(state: &mut MaterializedState, event: &Event) {
    state.apply_event(event);
    state.apply_event(event);
}

fn recorded(revision: &str, seed: u8) -> Event {
    Event::ArtifactRecorded {
        revision: revision.to_string(),
        digest: test_digest(seed),
        location: Some("ghcr.io/acme/paste".to_string()),
        at_ms: 100,
    }
}

#[test]
fn artifact_recorded_indexes_revision() {
    let mut state = MaterializedState::default();
    apply_twice(&mut state, &recorded("r1", 1));
    assert_eq!(state.artifacts.len(), 1);
    assert_eq!(state.digest_for_revision("r1"), Some(&test_digest(1)));
    let artifact = state.artifact(test_digest(1).as_str()).unwrap();
    assert_eq!(artifact.status, ArtifactStatus::Built);
    assert_eq!(artifact.location.as_deref(), Some("ghcr.io/acme/paste"));
}

#[test]
fn revision_mapping_is_never_replaced() {
    let mut state = MaterializedState::default();
    state.apply_event(&recorded("r1", 1));
    state.apply_event(&recorded("r1", 2));
    assert_eq!(state.digest_for_revision("r1"), Some(&test_digest(1)));
}

#[test]
fn status_change_is_idempotent() {
    let mut state = MaterializedState::default();
    state.apply_event(&recorded("r1", 1));
    apply_twice(
        &mut state,
        &Event::ArtifactStatusChanged {
            digest: test_digest(1),
            from: ArtifactStatus::Built,
            to: ArtifactStatus::Testing,
            forced: false,
            at_ms: 200,
        },
    );
    let result = TestResult {
        test_type: "integration".to_string(),
        status: TestStatus::Passed,
        at_ms: 300,
        details: None,
    };
    state.apply_event(&Event::TestResultRecorded { digest: test_digest(1), result });

    let artifact = state.artifact(test_digest(1).as_str()).unwrap();
    assert_eq!(artifact.status, ArtifactStatus::Testing);
    assert_eq!(artifact.test_results.len(), 1);
    assert_eq!(artifact.updated_at_ms, 300);
}

#[test]
fn identical_test_results_both_append() {
    let mut state = MaterializedState::default();
    state.apply_event(&recorded("r1", 1));
    let result = TestResult {
        test_type: "integration".to_string(),
        status: TestStatus::Failed,
        at_ms: 300,
        details: Some("timeout".to_string()),
    };
    apply_twice(&mut state, &Event::TestResultRecorded { digest: test_digest(1), result });
    let artifact = state.artifact(test_digest(1).as_str()).unwrap();
    assert_eq!(artifact.test_results.len(), 2);
}

#[test]
fn events_for_unknown_artifacts_are_ignored() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::ArtifactStatusChanged {
        digest: test_digest(9),
        from: ArtifactStatus::Built,
        to: ArtifactStatus::Testing,
        forced: false,
        at_ms: 1,
    });
    assert!(state.artifacts.is_empty());
}

#[test]
fn lock_release_requires_matching_holder() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::LockAcquired { holder: holder("opA", "run1", 10) });
    state.apply_event(&Event::LockReleased { holder_id: "opB".to_string(), at_ms: 20 });
    assert!(state.lock.is_some());
    apply_twice(&mut state, &Event::LockReleased { holder_id: "opA".to_string(), at_ms: 30 });
    assert!(state.lock.is_none());
}

#[test]
fn lock_clear_ignores_holder() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::LockAcquired { holder: holder("opA", "run1", 10) });
    state.apply_event(&Event::LockCleared { actor: "ops".to_string(), at_ms: 20 });
    assert!(!state.lock_status(30).held);
}

#[test]
fn identical_health_samples_each_count() {
    let mut state = MaterializedState::default();
    let event = Event::HealthRecorded {
        record: HealthRecord { at_ms: 5, status: HealthStatus::Degraded, details: None },
        consecutive_degraded: 1,
    };
    apply_twice(&mut state, &event);
    assert_eq!(state.health.len(), 2);
    assert_eq!(state.health.consecutive_degraded(), 2);
}

#[test]
fn deployment_recorded_rotates_backup() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::DeploymentRecorded { digest: test_digest(1), at_ms: 1 });
    apply_twice(&mut state, &Event::DeploymentRecorded { digest: test_digest(2), at_ms: 2 });
    assert_eq!(state.deployment.current, Some(test_digest(2)));
    assert_eq!(state.deployment.backup, Some(test_digest(1)));
}

#[test]
fn redeploy_finish_matches_run() {
    let mut state = MaterializedState::default();
    state.apply_event(&Event::RedeployStarted {
        target: DeployTarget::Digest { digest: test_digest(1) },
        run_id: "run-7".to_string(),
        at_ms: 1,
    });
    state.apply_event(&Event::RedeployFinished {
        run_id: "run-other".to_string(),
        success: true,
        at_ms: 2,
    });
    assert_eq!(state.recovery.last_redeploy.as_ref().unwrap().success, None);
    state.apply_event(&Event::RedeployFinished {
        run_id: "run-7".to_string(),
        success: false,
        at_ms: 3,
    });
    let record = state.recovery.last_redeploy.as_ref().unwrap();
    assert_eq!(record.success, Some(false));
    assert_eq!(record.finished_at_ms, Some(3));
}

#[test]
fn audit_append_is_guarded_by_id() {
    let mut state = MaterializedState::default();
    let entry = AuditEntry::new("ci", "artifact.record", 1);
    apply_twice(&mut state, &Event::AuditAppended { entry });
    assert_eq!(state.audit.len(), 1);
}

#[test]
fn context_reports_both_breakers_and_artifact() {
    let mut state = MaterializedState::default();
    state.apply_event(&recorded("r1", 1));
    let ctx = state.context(1_000, Some(test_digest(1).as_str()));
    assert_eq!(ctx.breakers.len(), 2);
    assert!(!ctx.lock.held);
    assert_eq!(ctx.artifact.unwrap().revision, "r1");
}

#[test]
fn state_round_trips_through_json() {
    let mut state = MaterializedState::default();
    state.apply_event(&recorded("r1", 1));
    state.apply_event(&Event::LockAcquired { holder: holder("opA", "run1", 10) });
    let json = serde_json::to_string(&state).unwrap();
    let back: MaterializedState = serde_json::from_str(&json).unwrap();
    assert_eq!(back.artifacts, state.artifacts);
    assert_eq!(back.lock, state.lock);
    assert_eq!(back.deployment_breaker, state.deployment_breaker);
}

#[test]
fn default_thresholds() {
    let state = MaterializedState::default();
    assert_eq!(state.breaker(Track::Recovery).threshold, 3);
    assert_eq!(state.breaker(Track::Deployment).threshold, 5);
    assert_eq!(state.breaker(Track::Deployment).state, BreakerState::Closed);
}
