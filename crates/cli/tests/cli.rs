// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used)]

//! Command-line surface checks that need no running daemon.

use assert_cmd::Command;

fn dg(state_dir: &std::path::Path) -> Command {
    let mut cmd = Command::cargo_bin("dg").unwrap();
    cmd.env("DG_STATE_DIR", state_dir).env("NO_COLOR", "1").env_remove("DG_DAEMON_BIN");
    cmd
}

fn output_text(output: &[u8]) -> String {
    String::from_utf8_lossy(output).into_owned()
}

#[test]
fn help_lists_command_groups() {
    let dir = tempfile::tempdir().unwrap();
    let out = dg(dir.path()).arg("--help").output().unwrap();
    assert!(out.status.success());
    let text = output_text(&out.stdout);
    for group in ["artifact", "breaker", "lock", "orchestrate", "audit", "daemon"] {
        assert!(text.contains(group), "missing {group} in:\n{text}");
    }
}

#[test]
fn generate_hash_prints_sha256_digest() {
    let dir = tempfile::tempdir().unwrap();
    let file = dir.path().join("payload");
    std::fs::write(&file, "abc").unwrap();
    let out = dg(dir.path())
        .args(["artifact", "generate-hash", "--file"])
        .arg(&file)
        .output()
        .unwrap();
    assert!(out.status.success(), "{}", output_text(&out.stderr));
    assert_eq!(
        output_text(&out.stdout).trim(),
        "sha256:ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
    );
}

#[test]
fn generate_hash_missing_file_exits_not_found() {
    let dir = tempfile::tempdir().unwrap();
    let out = dg(dir.path())
        .args(["artifact", "generate-hash", "--file", "/nonexistent/payload"])
        .output()
        .unwrap();
    assert_eq!(out.status.code(), Some(3));
}

#[test]
fn commands_without_daemon_exit_11() {
    let dir = tempfile::tempdir().unwrap();
    let out = dg(dir.path()).args(["lock", "status"]).output().unwrap();
    assert_eq!(out.status.code(), Some(11));
    assert!(output_text(&out.stderr).contains("Daemon not running"));
}

#[test]
fn daemon_status_reports_not_running_as_json() {
    let dir = tempfile::tempdir().unwrap();
    let out = dg(dir.path()).args(["daemon", "status", "--json"]).output().unwrap();
    assert_eq!(out.status.code(), Some(11));
    let value: serde_json::Value = serde_json::from_slice(&out.stdout).unwrap();
    assert_eq!(value["status"], "not_running");
}

#[test]
fn daemon_stop_without_daemon_is_not_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let out = dg(dir.path()).args(["daemon", "stop"]).output().unwrap();
    assert!(out.status.success());
    assert!(output_text(&out.stdout).contains("Daemon not running"));
}

#[test]
fn unknown_rollback_target_is_rejected_by_parser() {
    let dir = tempfile::tempdir().unwrap();
    let out = dg(dir.path()).args(["orchestrate", "rollback", "--target", "sideways"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
    assert!(output_text(&out.stderr).contains("latest-backup"));
}

#[test]
fn report_recovery_requires_an_outcome() {
    let dir = tempfile::tempdir().unwrap();
    let out = dg(dir.path()).args(["orchestrate", "report-recovery"]).output().unwrap();
    assert_eq!(out.status.code(), Some(2));
}

#[test]
fn threshold_commands_accept_a_reason() {
    let dir = tempfile::tempdir().unwrap();
    for group in ["threshold", "deployment-threshold"] {
        let out = dg(dir.path())
            .args(["breaker", group, "4", "--reason", "noisy canary week"])
            .output()
            .unwrap();
        // Parsed fine; only the missing daemon stops it.
        assert_eq!(out.status.code(), Some(11));
    }
}
