// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Starting and stopping the background daemon.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};

use nix::sys::signal::{kill, Signal};
use nix::unistd::Pid;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;

use super::{ClientError, DaemonClient};
use crate::env;

/// Startup handshake budget: the daemon replays its journal before READY
const START_TIMEOUT: Duration = Duration::from_secs(30);

const STOP_POLL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub enum StartResult {
    Started { pid: Option<u32> },
    AlreadyRunning { version: String },
}

/// Start `dgd` in the background and wait until it accepts requests.
pub async fn daemon_start() -> Result<StartResult, ClientError> {
    if let Ok(client) = DaemonClient::connect() {
        match client.hello().await {
            Ok(version) => return Ok(StartResult::AlreadyRunning { version }),
            Err(e) if e.is_not_running() => {}
            Err(e) => return Err(e),
        }
    }

    let mut child = Command::new(find_dgd_binary())
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .process_group(0)
        .spawn()
        .map_err(|e| ClientError::DaemonStartFailed(format!("could not run dgd: {e}")))?;
    let pid = child.id();

    let Some(stdout) = child.stdout.take() else {
        return Err(ClientError::DaemonStartFailed("no stdout from dgd".to_string()));
    };
    let mut lines = BufReader::new(stdout).lines();
    let ready = tokio::time::timeout(START_TIMEOUT, lines.next_line())
        .await
        .map_err(|_| ClientError::Timeout(START_TIMEOUT))?;

    match ready {
        Ok(Some(line)) if line.trim() == "READY" => Ok(StartResult::Started { pid }),
        _ => {
            let status = child.wait().await?;
            let log = env::state_dir()
                .map(|d| d.join("daemon.log").display().to_string())
                .unwrap_or_else(|| "daemon.log".to_string());
            Err(ClientError::DaemonStartFailed(format!("dgd exited with {status}; see {log}")))
        }
    }
}

/// Ask the daemon to shut down and wait for its socket to go away.
///
/// Returns false when no daemon was running.
pub async fn daemon_stop() -> Result<bool, ClientError> {
    let client = match DaemonClient::connect() {
        Ok(client) => client,
        Err(e) if e.is_not_running() => return Ok(false),
        Err(e) => return Err(e),
    };
    match client.shutdown().await {
        Ok(()) => {}
        Err(e) if e.is_not_running() => return Ok(false),
        Err(e) => return Err(e),
    }

    if wait_for_exit(&client.socket_path, env::ipc_timeout()).await {
        return Ok(true);
    }

    // Daemon acknowledged but is stuck draining; signal it directly.
    if let Some(pid) = read_daemon_pid() {
        let _ = kill(Pid::from_raw(pid), Signal::SIGTERM);
        if wait_for_exit(&client.socket_path, env::ipc_timeout()).await {
            return Ok(true);
        }
    }
    Err(ClientError::Timeout(env::ipc_timeout()))
}

async fn wait_for_exit(socket_path: &Path, budget: Duration) -> bool {
    let deadline = Instant::now() + budget;
    while socket_path.exists() {
        if Instant::now() >= deadline {
            return false;
        }
        tokio::time::sleep(STOP_POLL).await;
    }
    true
}

/// Pid recorded by the running daemon in its lock file.
fn read_daemon_pid() -> Option<i32> {
    let path = env::state_dir()?.join("daemon.pid");
    std::fs::read_to_string(path).ok()?.trim().parse().ok()
}

/// Locate the daemon binary: `DG_DAEMON_BIN`, then next to this executable,
/// then `PATH`.
pub(crate) fn find_dgd_binary() -> PathBuf {
    if let Some(path) = std::env::var_os("DG_DAEMON_BIN").filter(|p| !p.is_empty()) {
        return PathBuf::from(path);
    }
    if let Some(sibling) = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(|dir| dir.join("dgd")))
        .filter(|path| path.exists())
    {
        return sibling;
    }
    PathBuf::from("dgd")
}
