// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dg_core::test_support::test_digest;
use std::os::unix::fs::PermissionsExt;
use yare::parameterized;

/// Write an executable stand-in for `docker` that prints `stderr` and exits
/// with `code`.
fn fake_docker(dir: &std::path::Path, code: i32, stderr: &str) -> String {
    let path = dir.join("docker");
    std::fs::write(&path, format!("#!/bin/sh\necho '{stderr}' >&2\nexit {code}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path.to_string_lossy().into_owned()
}

fn quick(program: String) -> DockerResolver {
    DockerResolver::new(2, Duration::from_millis(1)).with_program(program)
}

#[parameterized(
    not_found = { "ERROR: ghcr.io/acme/paste@sha256:00: not found", true },
    manifest_unknown = { "MANIFEST_UNKNOWN: manifest unknown", true },
    auth = { "unauthorized: authentication required", false },
    network = { "dial tcp: lookup ghcr.io: no such host", false },
)]
fn classifies_stderr(stderr: &str, missing: bool) {
    assert_eq!(is_missing_manifest(stderr), missing);
}

#[tokio::test]
async fn successful_inspect_is_found() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = quick(fake_docker(dir.path(), 0, ""));
    let resolution = resolver.resolve("ghcr.io/acme/paste", &test_digest(1)).await.unwrap();
    assert_eq!(resolution, Resolution::Found);
}

#[tokio::test]
async fn missing_manifest_is_missing_after_retries() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = quick(fake_docker(dir.path(), 1, "manifest unknown"));
    let resolution = resolver.resolve("ghcr.io/acme/paste", &test_digest(1)).await.unwrap();
    assert_eq!(resolution, Resolution::Missing);
}

#[tokio::test]
async fn other_failures_are_unreachable() {
    let dir = tempfile::tempdir().unwrap();
    let resolver = quick(fake_docker(dir.path(), 1, "connection refused"));
    let err = resolver.resolve("ghcr.io/acme/paste", &test_digest(1)).await.unwrap_err();
    assert!(err.to_string().contains("connection refused"));
}

#[tokio::test]
async fn missing_binary_is_unreachable() {
    let resolver = quick("dg-no-such-docker".to_string());
    let result = resolver.resolve("ghcr.io/acme/paste", &test_digest(1)).await;
    assert!(matches!(result, Err(ResolveError::Unreachable(_))));
}

#[tokio::test]
async fn local_resolver_defers_to_registry() {
    let resolution = LocalResolver.resolve("anything", &test_digest(1)).await.unwrap();
    assert_eq!(resolution, Resolution::Unverified);
}

#[tokio::test]
async fn fake_resolver_tracks_published_artifacts() {
    let fake = FakeResolver::new();
    fake.publish("reg/app", &test_digest(1));
    assert_eq!(fake.resolve("reg/app", &test_digest(1)).await.unwrap(), Resolution::Found);
    assert_eq!(fake.resolve("reg/app", &test_digest(2)).await.unwrap(), Resolution::Missing);
    fake.set_unreachable(true);
    assert!(fake.resolve("reg/app", &test_digest(1)).await.is_err());
    assert_eq!(fake.lookups().len(), 3);
}

#[test]
fn unreachable_maps_to_guard_error_kind() {
    let err: dg_core::GuardError = ResolveError::Unreachable("offline".to_string()).into();
    assert_eq!(err.kind(), dg_core::ErrorKind::RegistryUnreachable);
}

#[tokio::test]
async fn docker_resolver_needs_a_location() {
    let result = DockerResolver::default().resolve("  ", &test_digest(1)).await;
    let err: dg_core::GuardError = result.unwrap_err().into();
    assert_eq!(err.kind(), dg_core::ErrorKind::Validation);
}
