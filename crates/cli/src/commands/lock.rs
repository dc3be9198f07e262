// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dg lock` - Deployment lock commands

use anyhow::Result;
use clap::{Args, Subcommand};
use dg_core::AcquireOutcome;

use super::{connect, run_id};
use crate::exit_error::{codes, ExitError};
use crate::output::{client_error, format_or_json, lock_line, OutputFormat};

#[derive(Args)]
pub struct LockArgs {
    #[command(subcommand)]
    pub command: LockCommand,
}

#[derive(Subcommand)]
pub enum LockCommand {
    /// Claim the deployment lock (exit 4 if another run holds it)
    Acquire {
        /// Holder identity (defaults to the actor)
        #[arg(long)]
        holder: Option<String>,
        #[arg(long)]
        run_id: Option<String>,
        /// Take the lock over from the current holder (requires --reason)
        #[arg(long)]
        emergency: bool,
        #[arg(long)]
        reason: Option<String>,
    },
    /// Release the lock held by this holder
    Release {
        #[arg(long)]
        holder: Option<String>,
    },
    /// Show the current holder
    Status,
    /// Administratively clear a stuck lock regardless of holder
    Clear {
        #[arg(long)]
        reason: String,
    },
}

pub async fn handle(command: LockCommand, format: OutputFormat, actor: &str) -> Result<()> {
    let client = connect(format)?;
    let fail = |e| client_error(e, format);

    match command {
        LockCommand::Acquire { holder, run_id: given, emergency, reason } => {
            let holder = holder.unwrap_or_else(|| actor.to_string());
            let run = run_id(given);
            let outcome =
                client.lock_acquire(&holder, &run, emergency, reason).await.map_err(fail)?;
            format_or_json(format, &outcome, || match outcome {
                AcquireOutcome::Locked { ref status, ref overridden } => {
                    println!("Lock acquired: {}", lock_line(status));
                    if let Some(previous) = overridden {
                        println!("Overrode {} (run {})", previous.holder_id, previous.run_id);
                    }
                }
                AcquireOutcome::Conflict { ref holder, age_ms } => println!(
                    "Lock held by {} (run {}) for {}",
                    holder.holder_id,
                    holder.run_id,
                    dg_core::format_elapsed_ms(age_ms)
                ),
            })?;
            if let AcquireOutcome::Conflict { holder, .. } = outcome {
                return Err(ExitError::new(
                    codes::CONFLICT,
                    format!("deployment lock is held by {}", holder.holder_id),
                )
                .into());
            }
        }

        LockCommand::Release { holder } => {
            let holder = holder.unwrap_or_else(|| actor.to_string());
            let released = client.lock_release(&holder).await.map_err(fail)?;
            format_or_json(format, &released, || {
                println!("Lock released by {} (run {})", released.holder_id, released.run_id)
            })?;
        }

        LockCommand::Status => {
            let status = client.lock_status().await.map_err(fail)?;
            format_or_json(format, &status, || println!("Deployment lock: {}", lock_line(&status)))?;
        }

        LockCommand::Clear { reason } => {
            let cleared = client.lock_clear(Some(reason), actor).await.map_err(fail)?;
            let obj = serde_json::json!({ "cleared": cleared });
            format_or_json(format, &obj, || match cleared {
                Some(ref holder) => {
                    println!("Cleared lock held by {} (run {})", holder.holder_id, holder.run_id)
                }
                None => println!("Lock was not held"),
            })?;
        }
    }
    Ok(())
}
