// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Environment knobs shared with the daemon.

use std::path::PathBuf;
use std::time::Duration;

/// Must match the daemon's version string exactly
pub const PROTOCOL_VERSION: &str = concat!(env!("CARGO_PKG_VERSION"), "+", env!("BUILD_GIT_HASH"));

/// Resolve state directory: DG_STATE_DIR > XDG_STATE_HOME/dg > ~/.local/state/dg
pub fn state_dir() -> Option<PathBuf> {
    if let Some(dir) = non_empty("DG_STATE_DIR") {
        return Some(PathBuf::from(dir));
    }
    if let Some(xdg) = non_empty("XDG_STATE_HOME") {
        return Some(PathBuf::from(xdg).join("dg"));
    }
    dirs::home_dir().map(|home| home.join(".local/state/dg"))
}

/// Timeout for queries and short mutations
pub fn ipc_timeout() -> Duration {
    millis_var("DG_IPC_TIMEOUT_MS").unwrap_or(Duration::from_secs(5))
}

/// Timeout for requests that run a deploy
pub fn action_timeout() -> Duration {
    millis_var("DG_ACTION_TIMEOUT_MS").unwrap_or(Duration::from_secs(20 * 60))
}

/// Actor recorded in the audit log when `--actor` is not given
pub fn default_actor() -> String {
    non_empty("DG_ACTOR").or_else(|| non_empty("USER")).unwrap_or_else(|| "cli".to_string())
}

fn non_empty(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|s| !s.is_empty())
}

fn millis_var(key: &str) -> Option<Duration> {
    non_empty(key).and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}

#[cfg(test)]
#[path = "env_tests.rs"]
mod tests;
