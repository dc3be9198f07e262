// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dg_core::test_support::test_digest;
use dg_core::{BreakerEventKind, DeployTarget, RecoveryCompletion, RedeployRecord};
use serial_test::serial;

fn render(history: &RecoveryHistory) -> String {
    std::env::set_var("NO_COLOR", "1");
    let mut out = Vec::new();
    write_history(history, &mut out);
    String::from_utf8(out).unwrap()
}

#[test]
#[serial]
fn empty_history_says_never() {
    let text = render(&RecoveryHistory::default());
    assert_eq!(
        text,
        "Last recovery trigger: never\nLast recovery: never\nLast redeployment: never\n"
    );
}

#[test]
#[serial]
fn history_shows_outcomes() {
    let history = RecoveryHistory {
        last_trigger: None,
        last_completion: Some(RecoveryCompletion {
            at_ms: 1,
            success: false,
            session: Some("sess-9".to_string()),
        }),
        last_redeploy: Some(RedeployRecord {
            started_at_ms: 1,
            target: DeployTarget::Digest { digest: test_digest(4) },
            run_id: "run-3".to_string(),
            success: None,
            finished_at_ms: None,
        }),
    };
    let text = render(&history);
    assert!(text.contains("Last recovery: failed"), "{text}");
    assert!(text.contains(", session sess-9"), "{text}");
    assert!(text.contains("in progress"), "{text}");
    assert!(text.contains("(run run-3)"), "{text}");
}

#[test]
fn events_render_actor_and_reason() {
    let event = BreakerEvent {
        at_ms: 0,
        track: Track::Deployment,
        kind: BreakerEventKind::Opened,
        failure_count: 5,
        threshold: 5,
        reason: Some("too many failed deploys".to_string()),
        actor: Some("ops".to_string()),
    };
    let mut out = Vec::new();
    write_events(&[event], &mut out);
    let text = String::from_utf8(out).unwrap();
    assert!(text.contains("deployment  opened"), "{text}");
    assert!(text.trim_end().ends_with("5/5 by ops: too many failed deploys"), "{text}");
}
