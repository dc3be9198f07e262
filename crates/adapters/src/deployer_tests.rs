// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dg_core::test_support::test_digest;

fn digest_target() -> DeployTarget {
    DeployTarget::Digest { digest: test_digest(4) }
}

#[tokio::test]
async fn passes_target_through_environment() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("env.txt");
    let command = format!("echo \"$DG_DIGEST $DG_RUN_ID\" > {}", out.display());
    let deployer = CommandDeployer::new(Some(command), Duration::from_secs(5));
    deployer.deploy(&digest_target(), "run-42").await.unwrap();
    let written = std::fs::read_to_string(&out).unwrap();
    assert_eq!(written.trim(), format!("{} run-42", test_digest(4)));
}

#[tokio::test]
async fn file_target_sets_deploy_file() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("env.txt");
    let command = format!("echo \"$DG_DEPLOY_FILE\" > {}", out.display());
    let deployer = CommandDeployer::new(Some(command), Duration::from_secs(5));
    let target = DeployTarget::File { path: "/srv/deploy/backup.tar".to_string() };
    deployer.deploy(&target, "run-1").await.unwrap();
    assert_eq!(std::fs::read_to_string(&out).unwrap().trim(), "/srv/deploy/backup.tar");
}

#[tokio::test]
async fn nonzero_exit_is_failure_with_stderr() {
    let deployer = CommandDeployer::new(
        Some("echo 'rollout stalled' >&2; exit 3".to_string()),
        Duration::from_secs(5),
    );
    match deployer.deploy(&digest_target(), "run-1").await {
        Err(DeployError::Failed { code, stderr }) => {
            assert_eq!(code, Some(3));
            assert_eq!(stderr, "rollout stalled");
        }
        other => panic!("expected failure, got {other:?}"),
    }
}

#[tokio::test]
async fn slow_deploy_times_out() {
    let deployer = CommandDeployer::new(Some("sleep 5".to_string()), Duration::from_millis(50));
    let err = deployer.deploy(&digest_target(), "run-1").await.unwrap_err();
    assert!(matches!(err, DeployError::Timeout(_)));
}

#[tokio::test]
async fn unconfigured_deployer_refuses() {
    let deployer = CommandDeployer::new(None, Duration::from_secs(1));
    let err = deployer.deploy(&digest_target(), "run-1").await.unwrap_err();
    assert!(matches!(err, DeployError::NotConfigured));
}

#[test]
fn stderr_tail_keeps_last_lines() {
    let text: String = (0..30).map(|i| format!("line {i}\n")).collect();
    let tail = stderr_tail(text.as_bytes());
    assert!(tail.starts_with("line 10"));
    assert!(tail.ends_with("line 29"));
}

#[tokio::test]
async fn fake_deployer_scripts_outcomes() {
    let fake = FakeDeployer::new();
    fake.push_outcome(Err(DeployError::Timeout(Duration::from_secs(1))));
    assert!(fake.deploy(&digest_target(), "a").await.is_err());
    assert!(fake.deploy(&digest_target(), "b").await.is_ok());
    let runs: Vec<String> = fake.calls().into_iter().map(|c| c.run_id).collect();
    assert_eq!(runs, vec!["a", "b"]);
}
