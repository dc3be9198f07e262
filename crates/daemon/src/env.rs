// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Protocol version (from Cargo.toml and the build's git hash)
pub const PROTOCOL_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

/// Resolve state directory: DG_STATE_DIR > XDG_STATE_HOME/dg > ~/.local/state/dg
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    match std::env::var("DG_STATE_DIR") {
        Ok(dir) if !dir.is_empty() => return Ok(PathBuf::from(dir)),
        _ => {}
    }
    match std::env::var("XDG_STATE_HOME") {
        Ok(xdg) if !xdg.is_empty() => return Ok(PathBuf::from(xdg).join("dg")),
        _ => {}
    }
    let home = dirs::home_dir().ok_or(LifecycleError::NoStateDir)?;
    Ok(home.join(".local/state/dg"))
}

/// Default IPC timeout
pub fn ipc_timeout() -> Duration {
    millis_var("DG_IPC_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Log filter directive (`DG_LOG`, default `info`)
pub fn log_filter() -> String {
    std::env::var("DG_LOG").ok().filter(|s| !s.is_empty()).unwrap_or_else(|| "info".to_string())
}

/// Log to stderr instead of `daemon.log`
pub fn log_to_stderr() -> bool {
    std::env::var("DG_LOG_STDERR").is_ok_and(|v| v == "1" || v == "true")
}

fn millis_var(name: &str) -> Option<Duration> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
