// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Shared test helpers for use across crates.
//!
//! Gated behind `#[cfg(any(test, feature = "test-support"))]`.

use crate::{Digest, LockHolder};

/// Deterministic well-formed digest: the byte `seed` repeated 32 times.
pub fn test_digest(seed: u8) -> Digest {
    let hex = format!("{seed:02x}").repeat(32);
    Digest::parse(&format!("sha256:{hex}")).unwrap_or_else(|_| Digest::of_bytes(&[seed]))
}

pub fn holder(holder_id: &str, run_id: &str, acquired_at_ms: u64) -> LockHolder {
    LockHolder {
        holder_id: holder_id.to_string(),
        run_id: run_id.to_string(),
        acquired_at_ms,
        emergency_override: false,
        overridden_holder: None,
    }
}

// ── Proptest strategies ─────────────────────────────────────────────────

pub mod strategies {
    use crate::{ArtifactStatus, Digest, HealthStatus, Track};
    use proptest::prelude::*;

    pub fn arb_digest() -> impl Strategy<Value = Digest> {
        "[0-9a-f]{64}".prop_filter_map("valid digest", |hex| {
            Digest::parse(&format!("sha256:{hex}")).ok()
        })
    }

    pub fn arb_artifact_status() -> impl Strategy<Value = ArtifactStatus> {
        prop_oneof![
            Just(ArtifactStatus::Built),
            Just(ArtifactStatus::Testing),
            Just(ArtifactStatus::Deployable),
            Just(ArtifactStatus::Failed),
            Just(ArtifactStatus::Deployed),
        ]
    }

    pub fn arb_track() -> impl Strategy<Value = Track> {
        prop_oneof![Just(Track::Recovery), Just(Track::Deployment)]
    }

    pub fn arb_health_status() -> impl Strategy<Value = HealthStatus> {
        prop_oneof![
            Just(HealthStatus::Healthy),
            Just(HealthStatus::Degraded),
            Just(HealthStatus::Unhealthy),
        ]
    }
}
