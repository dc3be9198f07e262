// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Defaults applied when older clients omit optional fields.

use super::*;

#[test]
fn breaker_close_flags_default_to_false() {
    let json = r#"{"type":"BreakerClose","actor":"alice"}"#;
    let decoded: Request = serde_json::from_str(json).expect("deserialize failed");
    match decoded {
        Request::BreakerClose { track, keep_failures, force, reason, actor } => {
            assert!(track.is_none());
            assert!(!keep_failures);
            assert!(!force);
            assert!(reason.is_none());
            assert_eq!(actor, "alice");
        }
        _ => panic!("Expected BreakerClose request"),
    }
}

#[test]
fn rollback_mode_is_kebab_case() {
    let json = r#"{"type":"Rollback","mode":"latest-backup","run_id":"r1","actor":"oncall"}"#;
    let decoded: Request = serde_json::from_str(json).expect("deserialize failed");
    match decoded {
        Request::Rollback { mode, override_breaker, emergency, digest, .. } => {
            assert_eq!(mode, RollbackMode::LatestBackup);
            assert!(!override_breaker);
            assert!(!emergency);
            assert!(digest.is_none());
        }
        _ => panic!("Expected Rollback request"),
    }
}

#[yare::parameterized(
    redeploy = { Request::Redeploy { digest: String::new(), location: None, run_id: String::new(), emergency: false, reason: None, actor: String::new() }, true },
    rollback = { Request::Rollback { mode: RollbackMode::FileBased, digest: None, file: None, location: None, run_id: String::new(), reason: None, override_breaker: false, emergency: false, actor: String::new() }, true },
    trigger_recovery = { Request::TriggerRecovery { reason: String::new(), actor: String::new() }, false },
    ping = { Request::Ping, false },
)]
fn deploy_requests_use_long_timeout(request: Request, expected: bool) {
    assert_eq!(request.runs_deploy(), expected);
}
