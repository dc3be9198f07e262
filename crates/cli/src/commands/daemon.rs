// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dg daemon` - Daemon management commands

use anyhow::{anyhow, Result};
use clap::{Args, Subcommand};
use tokio::process::Command;

use crate::client::{daemon_start, daemon_stop, DaemonClient, StartResult};
use crate::env::PROTOCOL_VERSION;
use crate::exit_error::{codes, ExitError};
use crate::output::{breaker_line, client_error, format_or_json, lock_line, OutputFormat};

#[derive(Args)]
pub struct DaemonArgs {
    #[command(subcommand)]
    pub command: DaemonCommand,
}

#[derive(Subcommand)]
pub enum DaemonCommand {
    /// Start the daemon (background unless --foreground)
    Start {
        /// Run in foreground, logging to stderr
        #[arg(long)]
        foreground: bool,
    },
    /// Stop the daemon
    Stop,
    /// Check daemon status
    Status,
}

pub async fn handle(command: DaemonCommand, format: OutputFormat) -> Result<()> {
    match command {
        DaemonCommand::Start { foreground } => start(foreground, format).await,
        DaemonCommand::Stop => stop(format).await,
        DaemonCommand::Status => status(format).await,
    }
}

async fn start(foreground: bool, format: OutputFormat) -> Result<()> {
    if foreground {
        let dgd = crate::client::find_dgd_binary();
        let status = Command::new(&dgd).arg("--foreground").status().await?;
        if !status.success() {
            return Err(anyhow!("Daemon exited with status: {}", status));
        }
        return Ok(());
    }

    match daemon_start().await.map_err(|e| client_error(e, format))? {
        StartResult::Started { pid } => {
            let obj = serde_json::json!({ "status": "started", "pid": pid });
            format_or_json(format, &obj, || println!("Daemon started"))
        }
        StartResult::AlreadyRunning { version } => {
            let obj = serde_json::json!({ "status": "already_running", "version": version });
            format_or_json(format, &obj, || println!("Daemon already running ({version})"))
        }
    }
}

async fn stop(format: OutputFormat) -> Result<()> {
    let stopped = daemon_stop().await.map_err(|e| client_error(e, format))?;
    let obj = serde_json::json!({ "stopped": stopped });
    format_or_json(format, &obj, || {
        if stopped {
            println!("Daemon stopped")
        } else {
            println!("Daemon not running")
        }
    })
}

async fn status(format: OutputFormat) -> Result<()> {
    let not_running = || -> Result<()> {
        let obj = serde_json::json!({ "status": "not_running" });
        format_or_json(format, &obj, || println!("Daemon not running"))?;
        Err(ExitError::new(codes::DAEMON_NOT_RUNNING, "daemon not running").into())
    };

    let client = match DaemonClient::connect() {
        Ok(client) => client,
        Err(e) if e.is_not_running() => return not_running(),
        Err(e) => return Err(client_error(e, format)),
    };
    let status = match client.status().await {
        Ok(status) => status,
        Err(e) if e.is_not_running() => return not_running(),
        Err(e) => return Err(client_error(e, format)),
    };

    format_or_json(format, &status, || {
        println!("Status: running (pid {})", status.pid);
        println!("Version: {}", status.version);
        if status.version != PROTOCOL_VERSION {
            println!("  (this CLI is {PROTOCOL_VERSION}; restart the daemon to match)");
        }
        println!("Uptime: {}", format_uptime(status.uptime_secs));
        println!("State: {}", status.state_dir.display());
        println!("Journal seq: {}", status.write_seq);
        println!("Artifacts: {}", status.artifacts);
        for b in &status.breakers {
            println!("Breaker {}", breaker_line(b));
        }
        println!("Deployment lock: {}", lock_line(&status.lock));
    })
}

fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let mins = (secs % 3600) / 60;
    let secs = secs % 60;

    if hours > 0 {
        format!("{}h {}m {}s", hours, mins, secs)
    } else if mins > 0 {
        format!("{}m {}s", mins, secs)
    } else {
        format!("{}s", secs)
    }
}

#[cfg(test)]
#[path = "daemon_tests.rs"]
mod tests;
