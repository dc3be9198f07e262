// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! `dg audit` - Audit log commands

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{Args, Subcommand};
use dg_core::{AuditEntry, AuditOutcome};

use super::connect;
use crate::color;
use crate::output::{client_error, format_or_json, format_time_ago, handle_list, write_json_file, OutputFormat};

#[derive(Args)]
pub struct AuditArgs {
    #[command(subcommand)]
    pub command: AuditCommand,
}

#[derive(Subcommand)]
pub enum AuditCommand {
    /// Show recent audit entries, newest first
    List {
        #[arg(short = 'n', long, default_value = "20")]
        limit: usize,
        /// Show all entries
        #[arg(long, conflicts_with = "limit")]
        no_limit: bool,
    },
    /// Write the whole audit log, oldest first, as JSON
    Export { path: PathBuf },
}

pub async fn handle(command: AuditCommand, format: OutputFormat) -> Result<()> {
    let client = connect(format)?;
    let fail = |e| client_error(e, format);

    match command {
        AuditCommand::List { limit, no_limit } => {
            let entries =
                client.audit_log(if no_limit { None } else { Some(limit) }).await.map_err(fail)?;
            handle_list(format, &entries, "No audit entries.", write_entries)?;
        }
        AuditCommand::Export { path } => {
            let mut entries = client.audit_log(None).await.map_err(fail)?;
            entries.reverse();
            write_json_file(&path, &entries)?;
            let obj = serde_json::json!({ "exported": path, "entries": entries.len() });
            format_or_json(format, &obj, || {
                println!("Exported {} entries to {}", entries.len(), path.display())
            })?;
        }
    }
    Ok(())
}

fn write_entries(entries: &[AuditEntry], out: &mut dyn Write) {
    for e in entries {
        let outcome = e.outcome.to_string();
        let outcome = match e.outcome {
            AuditOutcome::Success => color::good(&outcome),
            AuditOutcome::Override => color::warn(&outcome),
            AuditOutcome::Failure | AuditOutcome::Blocked => color::bad(&outcome),
        };
        let kind = e.error_kind.map(|k| format!(" ({k})")).unwrap_or_default();
        let _ = writeln!(
            out,
            "{} {:<10} {:<20} {:<12} {outcome}{kind}",
            color::muted(e.id.as_str()),
            format_time_ago(e.at_ms),
            e.action,
            e.actor,
        );
    }
}
