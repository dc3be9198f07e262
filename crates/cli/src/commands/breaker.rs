// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dg breaker` - Circuit breaker commands

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use dg_core::{BreakerEvent, BreakerStatus, RecoveryHistory, ThresholdCheck, Track, TrackCheck};

use super::connect;
use crate::color;
use crate::exit_error::{codes, ExitError};
use crate::output::{
    breaker_line, client_error, format_or_json, format_time_ago, handle_list, write_json_file,
    OutputFormat,
};

#[derive(Args)]
pub struct BreakerArgs {
    #[command(subcommand)]
    pub command: BreakerCommand,
}

#[derive(Subcommand)]
pub enum BreakerCommand {
    /// Show breaker state for both tracks
    Status {
        #[arg(long)]
        track: Option<Track>,
        /// Also write the full export to this file
        #[arg(long)]
        export: Option<PathBuf>,
    },
    /// Evaluate thresholds and open any track over its limit (exit 10 if open)
    Check {
        #[arg(long)]
        track: Option<Track>,
    },
    /// Open the breaker manually
    Open {
        #[arg(long)]
        track: Option<Track>,
        #[arg(long)]
        reason: String,
    },
    /// Close the breaker, resetting failure counts unless --keep-failures
    Close {
        #[arg(long)]
        track: Option<Track>,
        #[arg(long)]
        keep_failures: bool,
        /// Close even while a deployment lock is held
        #[arg(long)]
        force: bool,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Set the recovery failure threshold
    Threshold {
        value: u32,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Set the deployment failure threshold
    DeploymentThreshold {
        value: u32,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Count a failure against a track
    Failure {
        #[arg(long)]
        track: Track,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Show the breaker event trail
    Events {
        #[arg(long)]
        track: Option<Track>,
    },
    /// Show recovery history
    History,
    /// Write breaker state, history, events and threshold status as JSON
    Export { path: PathBuf },
}

pub async fn handle(command: BreakerCommand, format: OutputFormat, actor: &str) -> Result<()> {
    let client = connect(format)?;
    let fail = |e| client_error(e, format);

    match command {
        BreakerCommand::Status { track, export } => {
            let breakers = client.breaker_status(track).await.map_err(fail)?;
            format_or_json(format, &breakers, || print_breakers(&breakers))?;
            if let Some(path) = export {
                let data = client.breaker_export().await.map_err(fail)?;
                write_json_file(&path, &data)?;
                if format == OutputFormat::Text {
                    println!("Exported to {}", path.display());
                }
            }
        }

        BreakerCommand::Check { track } => {
            let checks = client.breaker_check(track, actor).await.map_err(fail)?;
            format_or_json(format, &checks, || print_checks(&checks))?;
            if checks.iter().any(|c| c.check.is_open()) {
                return Err(ExitError::new(
                    codes::DECISION_REFUSED,
                    "circuit breaker open: failure threshold exceeded",
                )
                .into());
            }
        }

        BreakerCommand::Open { track, reason } => {
            let breakers = client.breaker_open(track, &reason, actor).await.map_err(fail)?;
            format_or_json(format, &breakers, || print_breakers(&breakers))?;
        }

        BreakerCommand::Close { track, keep_failures, force, reason } => {
            let breakers = client
                .breaker_close(track, keep_failures, force, reason, actor)
                .await
                .map_err(fail)?;
            format_or_json(format, &breakers, || print_breakers(&breakers))?;
        }

        BreakerCommand::Threshold { value, reason } => {
            let breakers =
                client.set_threshold(Track::Recovery, value, reason, actor).await.map_err(fail)?;
            format_or_json(format, &breakers, || print_breakers(&breakers))?;
        }

        BreakerCommand::DeploymentThreshold { value, reason } => {
            let breakers =
                client.set_threshold(Track::Deployment, value, reason, actor).await.map_err(fail)?;
            format_or_json(format, &breakers, || print_breakers(&breakers))?;
        }

        BreakerCommand::Failure { track, reason } => {
            let breakers = client.breaker_failure(track, reason, actor).await.map_err(fail)?;
            format_or_json(format, &breakers, || print_breakers(&breakers))?;
        }

        BreakerCommand::Events { track } => {
            let events = client.breaker_events(track).await.map_err(fail)?;
            handle_list(format, &events, "No breaker events recorded.", write_events)?;
        }

        BreakerCommand::History => {
            let history = client.recovery_history().await.map_err(fail)?;
            format_or_json(format, &history, || {
                write_history(&history, &mut std::io::stdout())
            })?;
        }

        BreakerCommand::Export { path } => {
            let data = client.breaker_export().await.map_err(fail)?;
            write_json_file(&path, &data)?;
            let obj = serde_json::json!({ "exported": path });
            format_or_json(format, &obj, || println!("Exported to {}", path.display()))?;
        }
    }
    Ok(())
}

fn print_breakers(breakers: &[BreakerStatus]) {
    for b in breakers {
        println!("{}", breaker_line(b));
    }
}

fn print_checks(checks: &[TrackCheck]) {
    for c in checks {
        let verdict = match c.check {
            ThresholdCheck::WithinLimits => color::good("within limits"),
            ThresholdCheck::Opened { newly_opened: true } => color::bad("exceeded, opened now"),
            ThresholdCheck::Opened { newly_opened: false } => color::bad("exceeded, already open"),
        };
        println!("{:<11} {verdict}", c.track.to_string());
    }
}

fn write_events(events: &[BreakerEvent], out: &mut dyn Write) {
    for e in events {
        let _ = writeln!(
            out,
            "{:<10} {:<11} {:<18} {}/{}{}{}",
            format_time_ago(e.at_ms),
            e.track.to_string(),
            e.kind.to_string(),
            e.failure_count,
            e.threshold,
            e.actor.as_deref().map(|a| format!(" by {a}")).unwrap_or_default(),
            e.reason.as_deref().map(|r| format!(": {r}")).unwrap_or_default(),
        );
    }
}

fn write_history(history: &RecoveryHistory, out: &mut dyn Write) {
    match history.last_trigger {
        Some(ref t) => {
            let _ = writeln!(out, "Last recovery trigger: {} ({})", format_time_ago(t.at_ms), t.reason);
        }
        None => {
            let _ = writeln!(out, "Last recovery trigger: never");
        }
    }
    match history.last_completion {
        Some(ref c) => {
            let outcome = if c.success { color::good("succeeded") } else { color::bad("failed") };
            let session = c.session.as_deref().map(|s| format!(", session {s}")).unwrap_or_default();
            let _ = writeln!(
                out,
                "Last recovery: {outcome} {}{session}",
                format_time_ago(c.at_ms)
            );
        }
        None => {
            let _ = writeln!(out, "Last recovery: never");
        }
    }
    match history.last_redeploy {
        Some(ref r) => {
            let outcome = match r.success {
                Some(true) => color::good("succeeded"),
                Some(false) => color::bad("failed"),
                None => color::warn("in progress"),
            };
            let _ = writeln!(
                out,
                "Last redeployment: {} {outcome} {} (run {})",
                r.target,
                format_time_ago(r.started_at_ms),
                r.run_id
            );
        }
        None => {
            let _ = writeln!(out, "Last redeployment: never");
        }
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
