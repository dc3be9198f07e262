// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dg_adapters::ResolverRouter;

const FULL: &str = r#"
recovery_trigger_threshold = 4
health_history_limit = 20
stale_lock_secs = 600
snapshot_every = 50

[breaker]
recovery_threshold = 2
deployment_threshold = 7

[registry]
kind = "docker"
location = "ghcr.io/acme/paste"
attempts = 5
retry_delay_ms = 100

[deploy]
command = "./scripts/deploy.sh"
timeout_secs = 60
"#;

#[test]
fn empty_file_keeps_engine_defaults() {
    let settings = Settings::parse("").unwrap();
    assert_eq!(settings.guard_config(), GuardConfig::default());
    assert!(matches!(settings.resolver(), ResolverRouter::Local(_)));
}

#[test]
fn full_file_maps_into_guard_config() {
    let settings = Settings::parse(FULL).unwrap();
    let config = settings.guard_config();
    assert_eq!(config.recovery_trigger_threshold, 4);
    assert_eq!(config.health_history_limit, 20);
    assert_eq!(config.stale_lock_secs, 600);
    assert_eq!(config.snapshot_every, 50);
    assert_eq!(config.recovery_threshold, 2);
    assert_eq!(config.deployment_threshold, 7);
    assert_eq!(config.default_location.as_deref(), Some("ghcr.io/acme/paste"));
    assert!(matches!(settings.resolver(), ResolverRouter::Docker(_)));
    assert_eq!(settings.deploy.command.as_deref(), Some("./scripts/deploy.sh"));
}

#[yare::parameterized(
    zero_threshold = { "[breaker]\ndeployment_threshold = 0", "breaker.deployment_threshold" },
    zero_attempts = { "[registry]\nattempts = 0", "registry.attempts" },
    zero_history = { "health_history_limit = 0", "health_history_limit" },
)]
fn zero_limits_are_rejected(text: &str, key: &str) {
    let err = Settings::parse(text).unwrap_err();
    assert!(err.contains(key), "{err}");
}

#[yare::parameterized(
    unknown_key = { "recovery_threshold = 3" },
    unknown_kind = { "[registry]\nkind = \"s3\"" },
    wrong_type = { "snapshot_every = \"often\"" },
)]
fn malformed_files_are_rejected(text: &str) {
    assert!(Settings::parse(text).is_err());
}

#[test]
fn missing_file_is_default() {
    let dir = tempfile::tempdir().unwrap();
    let settings = Settings::load(&dir.path().join("config.toml")).unwrap();
    assert_eq!(settings, Settings::default());
}

#[test]
fn unreadable_config_names_the_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("config.toml");
    std::fs::write(&path, "[deploy]\ntimeout_secs = -1\n").unwrap();
    let err = Settings::load(&path).unwrap_err();
    assert!(err.to_string().contains("config.toml"), "{err}");
}
