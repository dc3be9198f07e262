// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dg: deploy-guard CLI.
//!
//! Every command is one request to the `dgd` daemon, which owns the
//! artifact registry, circuit breaker, deployment lock and audit log.

mod client;
mod color;
mod commands;
mod env;
mod exit_error;
mod output;

use std::process::ExitCode;

use clap::{Parser, Subcommand};

use crate::commands::artifact::ArtifactArgs;
use crate::commands::audit::AuditArgs;
use crate::commands::breaker::BreakerArgs;
use crate::commands::daemon::DaemonArgs;
use crate::commands::lock::LockArgs;
use crate::commands::orchestrate::OrchestrateArgs;
use crate::exit_error::{codes, ExitError};
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "dg",
    version = env::PROTOCOL_VERSION,
    about = "Deployment safety guard: artifacts, circuit breaker, deployment lock",
    styles = color::styles(),
)]
struct Cli {
    /// Output format
    #[arg(short = 'o', long = "output", value_enum, default_value_t, global = true)]
    output: OutputFormat,

    /// Shorthand for --output json
    #[arg(long, global = true)]
    json: bool,

    /// Who is acting, for the audit log (default: $DG_ACTOR or $USER)
    #[arg(long, global = true)]
    actor: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Artifact registry
    Artifact(ArtifactArgs),
    /// Circuit breaker
    Breaker(BreakerArgs),
    /// Deployment lock
    Lock(LockArgs),
    /// Health evaluation, recovery, redeploy and rollback decisions
    Orchestrate(OrchestrateArgs),
    /// Audit log
    Audit(AuditArgs),
    /// Daemon management
    Daemon(DaemonArgs),
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let format = if cli.json { OutputFormat::Json } else { cli.output };
    let actor = cli.actor.filter(|a| !a.trim().is_empty()).unwrap_or_else(env::default_actor);

    match cli.command {
        Commands::Artifact(args) => commands::artifact::handle(args.command, format, &actor).await,
        Commands::Breaker(args) => commands::breaker::handle(args.command, format, &actor).await,
        Commands::Lock(args) => commands::lock::handle(args.command, format, &actor).await,
        Commands::Orchestrate(args) => {
            commands::orchestrate::handle(args.command, format, &actor).await
        }
        Commands::Audit(args) => commands::audit::handle(args.command, format).await,
        Commands::Daemon(args) => commands::daemon::handle(args.command, format).await,
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let code = e.downcast_ref::<ExitError>().map_or(codes::GENERIC, |e| e.code);
            eprintln!("Error: {e}");
            ExitCode::from(u8::try_from(code).unwrap_or(1))
        }
    }
}
