// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dg orchestrate` - Health evaluation, recovery and deploy decisions

use std::io::Write;

use anyhow::Result;
use clap::{ArgGroup, Args, Subcommand};
use dg_core::{HealthHistory, HealthStatus, RollbackMode};

use super::{connect, run_id};
use crate::client::RollbackArgs;
use crate::color;
use crate::exit_error::{codes, ExitError};
use crate::output::{
    client_error, format_or_json, format_time_ago, print_decision, print_issues, write_context,
    OutputFormat,
};

#[derive(Args)]
pub struct OrchestrateArgs {
    #[command(subcommand)]
    pub command: OrchestrateCommand,
}

#[derive(Subcommand)]
pub enum OrchestrateCommand {
    /// Record a health check and decide whether recovery is needed
    EvaluateHealth {
        /// healthy, degraded or unhealthy
        #[arg(long)]
        status: HealthStatus,
        #[arg(long)]
        details: Option<String>,
    },
    /// Request recovery manually
    TriggerRecovery {
        #[arg(long)]
        reason: String,
    },
    /// Report how a recovery attempt ended
    #[command(group(ArgGroup::new("outcome").required(true).args(["success", "failed"])))]
    ReportRecovery {
        #[arg(long)]
        success: bool,
        #[arg(long)]
        failed: bool,
        #[arg(long)]
        session: Option<String>,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Redeploy a known artifact by digest
    TriggerRedeploy {
        #[arg(long)]
        digest: String,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        run_id: Option<String>,
        /// Take over the deployment lock (requires --reason)
        #[arg(long)]
        emergency: bool,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Roll back to the backup, a specific digest, or a deploy file
    Rollback {
        /// latest-backup, specific-digest or file-based
        #[arg(long = "target")]
        mode: RollbackMode,
        #[arg(long)]
        digest: Option<String>,
        #[arg(long)]
        file: Option<String>,
        #[arg(long)]
        location: Option<String>,
        #[arg(long)]
        run_id: Option<String>,
        #[arg(long)]
        reason: Option<String>,
        /// Deploy even though the deployment breaker is open
        #[arg(long)]
        override_breaker: bool,
        #[arg(long)]
        emergency: bool,
    },
    /// Cross-check breaker, lock and deployment state (exit 1 on warnings)
    Consistency,
    /// Show recent health checks
    Health,
}

pub async fn handle(command: OrchestrateCommand, format: OutputFormat, actor: &str) -> Result<()> {
    let client = connect(format)?;
    let fail = |e| client_error(e, format);

    match command {
        OrchestrateCommand::EvaluateHealth { status, details } => {
            let report = client.evaluate_health(status, details, actor).await.map_err(fail)?;
            print_decision(format, &report)
        }

        OrchestrateCommand::TriggerRecovery { reason } => {
            let report = client.trigger_recovery(&reason, actor).await.map_err(fail)?;
            print_decision(format, &report)
        }

        OrchestrateCommand::ReportRecovery { success, failed: _, session, reason } => {
            let report =
                client.report_recovery(success, session, reason, actor).await.map_err(fail)?;
            print_decision(format, &report)
        }

        OrchestrateCommand::TriggerRedeploy { digest, location, run_id: given, emergency, reason } => {
            let run = run_id(given);
            let report = client
                .redeploy(&digest, location, &run, emergency, reason, actor)
                .await
                .map_err(fail)?;
            print_decision(format, &report)
        }

        OrchestrateCommand::Rollback {
            mode,
            digest,
            file,
            location,
            run_id: given,
            reason,
            override_breaker,
            emergency,
        } => {
            let args = RollbackArgs {
                mode,
                digest,
                file,
                location,
                run_id: run_id(given),
                reason,
                override_breaker,
                emergency,
            };
            let report = client.rollback(args, actor).await.map_err(fail)?;
            print_decision(format, &report)
        }

        OrchestrateCommand::Consistency => {
            let report = client.consistency().await.map_err(fail)?;
            format_or_json(format, &report, || {
                if report.consistent {
                    println!("State is {}", color::good("consistent"));
                } else {
                    println!("State has {}", color::warn("inconsistencies"));
                }
                print_issues(&report.issues, &mut std::io::stdout());
                println!();
                write_context(&report.context, &mut std::io::stdout());
            })?;
            if report.consistent {
                Ok(())
            } else {
                Err(ExitError::new(codes::GENERIC, "state is inconsistent").into())
            }
        }

        OrchestrateCommand::Health => {
            let history = client.health_history().await.map_err(fail)?;
            format_or_json(format, &history, || write_health(&history, &mut std::io::stdout()))
        }
    }
}

fn write_health(history: &HealthHistory, out: &mut dyn Write) {
    if history.is_empty() {
        let _ = writeln!(out, "No health checks recorded.");
        return;
    }
    for r in history.records() {
        let status = r.status.to_string();
        let status = match r.status {
            HealthStatus::Healthy => color::good(&status),
            HealthStatus::Degraded => color::warn(&status),
            HealthStatus::Unhealthy => color::bad(&status),
        };
        let details = r.details.as_deref().map(|d| format!("  {d}")).unwrap_or_default();
        let _ = writeln!(out, "{:<10} {status}{details}", format_time_ago(r.at_ms));
    }
    let _ = writeln!(
        out,
        "{} consecutive non-healthy (keeping last {})",
        history.consecutive_degraded(),
        history.limit()
    );
}

#[cfg(test)]
#[path = "orchestrate_tests.rs"]
mod tests;
