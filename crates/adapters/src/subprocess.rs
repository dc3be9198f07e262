// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Running external commands with a hard deadline

use std::process::Output;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;

/// Per-attempt deadline for a registry lookup
pub const RESOLVE_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum RunError {
    #[error("failed to start: {0}")]
    Spawn(#[source] std::io::Error),
    #[error("timed out after {}s", .0.as_secs())]
    Timeout(Duration),
}

/// Run `cmd` to completion, capturing output, killing it after `timeout`.
pub async fn run_with_timeout(
    mut cmd: Command,
    timeout: Duration,
    description: &str,
) -> Result<Output, RunError> {
    cmd.kill_on_drop(true);
    let child = cmd.output();
    match tokio::time::timeout(timeout, child).await {
        Ok(Ok(output)) => Ok(output),
        Ok(Err(e)) => {
            tracing::warn!(description, error = %e, "command failed to start");
            Err(RunError::Spawn(e))
        }
        Err(_) => {
            tracing::warn!(description, timeout_secs = timeout.as_secs(), "command timed out");
            Err(RunError::Timeout(timeout))
        }
    }
}
