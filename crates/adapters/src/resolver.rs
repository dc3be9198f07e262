// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact resolution against the external artifact store

use crate::subprocess::{run_with_timeout, RunError, RESOLVE_TIMEOUT};
use async_trait::async_trait;
use dg_core::Digest;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, info, warn};

/// Answer from the artifact store
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resolution {
    Found,
    Missing,
    /// No external store to ask; the registry record is authoritative
    Unverified,
}

#[derive(Debug, Clone, Error)]
pub enum ResolveError {
    #[error("no artifact store location for {0}")]
    NoLocation(String),
    #[error("artifact store unreachable: {0}")]
    Unreachable(String),
}

impl From<ResolveError> for dg_core::GuardError {
    fn from(e: ResolveError) -> Self {
        match e {
            ResolveError::NoLocation(what) => {
                dg_core::GuardError::Validation(format!("no artifact store location for {what}"))
            }
            ResolveError::Unreachable(msg) => dg_core::GuardError::RegistryUnreachable(msg),
        }
    }
}

/// Looks up whether `location@digest` exists in the artifact store.
#[async_trait]
pub trait ArtifactResolver: Clone + Send + Sync + 'static {
    async fn resolve(&self, location: &str, digest: &Digest) -> Result<Resolution, ResolveError>;
}

/// Resolves through `docker buildx imagetools inspect`.
///
/// Registries can take a while to make a freshly pushed manifest visible, so
/// both "missing" and transport failures are retried with exponential
/// backoff before giving up.
#[derive(Debug, Clone)]
pub struct DockerResolver {
    program: String,
    attempts: u32,
    retry_delay: Duration,
    timeout: Duration,
}

impl Default for DockerResolver {
    fn default() -> Self {
        Self::new(3, Duration::from_secs(2))
    }
}

enum Attempt {
    Found,
    Missing(String),
    Failed(String),
}

impl DockerResolver {
    pub fn new(attempts: u32, retry_delay: Duration) -> Self {
        Self { program: "docker".to_string(), attempts: attempts.max(1), retry_delay, timeout: RESOLVE_TIMEOUT }
    }

    /// Use a different executable in place of `docker`
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    async fn attempt(&self, reference: &str) -> Attempt {
        let mut cmd = Command::new(&self.program);
        cmd.args(["buildx", "imagetools", "inspect", reference]);
        match run_with_timeout(cmd, self.timeout, "imagetools inspect").await {
            Ok(output) if output.status.success() => Attempt::Found,
            Ok(output) => {
                let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
                if is_missing_manifest(&stderr) {
                    Attempt::Missing(stderr)
                } else {
                    Attempt::Failed(stderr)
                }
            }
            Err(RunError::Spawn(e)) => Attempt::Failed(format!("cannot run {}: {e}", self.program)),
            Err(e @ RunError::Timeout(_)) => Attempt::Failed(e.to_string()),
        }
    }
}

fn is_missing_manifest(stderr: &str) -> bool {
    let lower = stderr.to_ascii_lowercase();
    lower.contains("not found") || lower.contains("manifest unknown")
}

#[async_trait]
impl ArtifactResolver for DockerResolver {
    async fn resolve(&self, location: &str, digest: &Digest) -> Result<Resolution, ResolveError> {
        if location.trim().is_empty() {
            return Err(ResolveError::NoLocation(digest.short().to_string()));
        }
        let reference = format!("{location}@{digest}");
        let mut delay = self.retry_delay;
        let mut last = Attempt::Failed(String::new());
        for attempt in 1..=self.attempts {
            last = self.attempt(&reference).await;
            match &last {
                Attempt::Found => {
                    info!(%reference, attempt, "artifact resolved");
                    return Ok(Resolution::Found);
                }
                Attempt::Missing(msg) | Attempt::Failed(msg) => {
                    debug!(%reference, attempt, error = %msg, "artifact lookup failed");
                }
            }
            if attempt < self.attempts {
                tokio::time::sleep(delay).await;
                delay = delay.saturating_mul(2);
            }
        }
        match last {
            Attempt::Missing(_) => Ok(Resolution::Missing),
            Attempt::Failed(msg) => {
                warn!(%reference, attempts = self.attempts, error = %msg, "artifact store unreachable");
                Err(ResolveError::Unreachable(msg))
            }
            Attempt::Found => Ok(Resolution::Found),
        }
    }
}

/// For setups without an external registry
#[derive(Debug, Clone, Copy, Default)]
pub struct LocalResolver;

#[async_trait]
impl ArtifactResolver for LocalResolver {
    async fn resolve(&self, _location: &str, _digest: &Digest) -> Result<Resolution, ResolveError> {
        Ok(Resolution::Unverified)
    }
}

/// Resolver selected by configuration
#[derive(Debug, Clone)]
pub enum ResolverRouter {
    Docker(DockerResolver),
    Local(LocalResolver),
}

#[async_trait]
impl ArtifactResolver for ResolverRouter {
    async fn resolve(&self, location: &str, digest: &Digest) -> Result<Resolution, ResolveError> {
        match self {
            ResolverRouter::Docker(r) => r.resolve(location, digest).await,
            ResolverRouter::Local(r) => r.resolve(location, digest).await,
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{ArtifactResolver, Resolution, ResolveError};
    use async_trait::async_trait;
    use dg_core::Digest;
    use parking_lot::Mutex;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[derive(Default)]
    struct FakeResolverState {
        known: HashSet<String>,
        unreachable: bool,
        unverified: bool,
        lookups: Vec<String>,
    }

    /// In-memory artifact store for tests
    #[derive(Clone, Default)]
    pub struct FakeResolver {
        inner: Arc<Mutex<FakeResolverState>>,
    }

    impl FakeResolver {
        pub fn new() -> Self {
            Self::default()
        }

        /// Make `location@digest` resolvable
        pub fn publish(&self, location: &str, digest: &Digest) {
            self.inner.lock().known.insert(format!("{location}@{digest}"));
        }

        pub fn set_unreachable(&self, unreachable: bool) {
            self.inner.lock().unreachable = unreachable;
        }

        /// Behave like [`super::LocalResolver`]
        pub fn set_unverified(&self, unverified: bool) {
            self.inner.lock().unverified = unverified;
        }

        pub fn lookups(&self) -> Vec<String> {
            self.inner.lock().lookups.clone()
        }
    }

    #[async_trait]
    impl ArtifactResolver for FakeResolver {
        async fn resolve(&self, location: &str, digest: &Digest) -> Result<Resolution, ResolveError> {
            let mut inner = self.inner.lock();
            let reference = format!("{location}@{digest}");
            inner.lookups.push(reference.clone());
            if inner.unreachable {
                return Err(ResolveError::Unreachable("fake registry offline".to_string()));
            }
            if inner.unverified {
                return Ok(Resolution::Unverified);
            }
            Ok(if inner.known.contains(&reference) { Resolution::Found } else { Resolution::Missing })
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::FakeResolver;

#[cfg(test)]
#[path = "resolver_tests.rs"]
mod tests;
