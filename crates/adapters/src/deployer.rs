// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The deploy step: rolls a target out to the running environment

use crate::subprocess::{run_with_timeout, RunError};
use async_trait::async_trait;
use dg_core::DeployTarget;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

#[derive(Debug, Clone, Error)]
pub enum DeployError {
    #[error("no deploy command configured")]
    NotConfigured,
    #[error("deploy command could not start: {0}")]
    Spawn(String),
    #[error("deploy timed out after {}s", .0.as_secs())]
    Timeout(Duration),
    #[error("deploy exited with {}: {stderr}", .code.map_or("signal".to_string(), |c| format!("code {c}")))]
    Failed { code: Option<i32>, stderr: String },
}

#[async_trait]
pub trait Deployer: Clone + Send + Sync + 'static {
    async fn deploy(&self, target: &DeployTarget, run_id: &str) -> Result<(), DeployError>;
}

/// Runs a configured shell command. The target is passed in the environment
/// as `DG_DIGEST` or `DG_DEPLOY_FILE`, together with `DG_RUN_ID`.
#[derive(Debug, Clone)]
pub struct CommandDeployer {
    command: Option<String>,
    timeout: Duration,
}

impl CommandDeployer {
    pub fn new(command: Option<String>, timeout: Duration) -> Self {
        Self { command, timeout }
    }
}

/// Keep the tail of stderr; deploy scripts can be chatty
fn stderr_tail(bytes: &[u8]) -> String {
    let text = String::from_utf8_lossy(bytes);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(20);
    lines[start..].join("\n")
}

#[async_trait]
impl Deployer for CommandDeployer {
    async fn deploy(&self, target: &DeployTarget, run_id: &str) -> Result<(), DeployError> {
        let Some(command) = &self.command else {
            return Err(DeployError::NotConfigured);
        };
        let mut cmd = Command::new("sh");
        cmd.arg("-c").arg(command).env("DG_RUN_ID", run_id);
        match target {
            DeployTarget::Digest { digest } => cmd.env("DG_DIGEST", digest.as_str()),
            DeployTarget::File { path } => cmd.env("DG_DEPLOY_FILE", path),
        };
        tracing::info!(%target, run_id, "running deploy command");
        match run_with_timeout(cmd, self.timeout, "deploy").await {
            Ok(output) if output.status.success() => Ok(()),
            Ok(output) => Err(DeployError::Failed {
                code: output.status.code(),
                stderr: stderr_tail(&output.stderr),
            }),
            Err(RunError::Spawn(e)) => Err(DeployError::Spawn(e.to_string())),
            Err(RunError::Timeout(d)) => Err(DeployError::Timeout(d)),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
#[cfg_attr(coverage_nightly, coverage(off))]
mod fake {
    use super::{DeployError, Deployer};
    use async_trait::async_trait;
    use dg_core::DeployTarget;
    use parking_lot::Mutex;
    use std::collections::VecDeque;
    use std::sync::Arc;
    use tokio::sync::Notify;

    /// Recorded deploy invocation
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub struct DeployCall {
        pub target: DeployTarget,
        pub run_id: String,
    }

    #[derive(Default)]
    struct FakeDeployerState {
        calls: Vec<DeployCall>,
        outcomes: VecDeque<Result<(), DeployError>>,
    }

    /// Deployer that records calls and returns scripted outcomes (default: success)
    #[derive(Clone, Default)]
    pub struct FakeDeployer {
        inner: Arc<Mutex<FakeDeployerState>>,
        gate: Option<Arc<Notify>>,
    }

    impl FakeDeployer {
        pub fn new() -> Self {
            Self::default()
        }

        /// Queue the outcome of the next deploy
        pub fn push_outcome(&self, outcome: Result<(), DeployError>) {
            self.inner.lock().outcomes.push_back(outcome);
        }

        /// Hold every deploy until the returned `Notify` is signalled
        pub fn gated(mut self) -> (Self, Arc<Notify>) {
            let gate = Arc::new(Notify::new());
            self.gate = Some(Arc::clone(&gate));
            (self, gate)
        }

        pub fn calls(&self) -> Vec<DeployCall> {
            self.inner.lock().calls.clone()
        }
    }

    #[async_trait]
    impl Deployer for FakeDeployer {
        async fn deploy(&self, target: &DeployTarget, run_id: &str) -> Result<(), DeployError> {
            self.inner
                .lock()
                .calls
                .push(DeployCall { target: target.clone(), run_id: run_id.to_string() });
            if let Some(gate) = &self.gate {
                gate.notified().await;
            }
            self.inner.lock().outcomes.pop_front().unwrap_or(Ok(()))
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub use fake::{DeployCall, FakeDeployer};

#[cfg(test)]
#[path = "deployer_tests.rs"]
mod tests;
