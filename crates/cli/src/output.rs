// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write;

use clap::ValueEnum;
use dg_core::{
    BreakerState, BreakerStatus, DecisionReport, IssueSeverity, LockStatus, StateContext,
};
use serde::Serialize;

use crate::client::ClientError;
use crate::color;
use crate::exit_error::{codes, ExitError};

#[cfg(test)]
#[path = "output_tests.rs"]
mod tests;

#[derive(Clone, Copy, Debug, Default, PartialEq, ValueEnum)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Format a timestamp as relative time (e.g., "5s ago", "2m ago")
pub fn format_time_ago(epoch_ms: u64) -> String {
    if epoch_ms == 0 {
        return "-".to_string();
    }
    let now_ms = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64;
    format!("{} ago", dg_core::format_elapsed_ms(now_ms.saturating_sub(epoch_ms)))
}

/// One-line summary of a breaker track
pub fn breaker_line(b: &BreakerStatus) -> String {
    let state = match b.state {
        BreakerState::Closed => color::good("closed"),
        BreakerState::Open => color::bad("open"),
    };
    let mut line = format!(
        "{:<11} {} ({}/{} failures)",
        b.track.to_string(),
        state,
        b.failure_count,
        b.threshold
    );
    if let (Some(by), Some(at)) = (b.opened_by, b.opened_at_ms) {
        line.push_str(&format!(", opened {} by {by}", format_time_ago(at)));
    }
    if let Some(ref reason) = b.open_reason {
        line.push_str(&format!(": {reason}"));
    }
    line
}

/// One-line summary of the deployment lock
pub fn lock_line(lock: &LockStatus) -> String {
    match (&lock.holder_id, &lock.run_id) {
        (Some(holder), Some(run)) if lock.held => {
            let age = lock.age_ms.map(dg_core::format_elapsed_ms).unwrap_or_else(|| "-".into());
            let emergency = if lock.emergency_override { " (emergency override)" } else { "" };
            format!("held by {holder} (run {run}) for {age}{emergency}")
        }
        _ => color::good("free"),
    }
}

/// Render breaker, lock and artifact state for an operator
pub fn write_context(ctx: &StateContext, out: &mut dyn Write) {
    let _ = writeln!(out, "{}", color::header("Circuit breaker:"));
    for b in &ctx.breakers {
        let _ = writeln!(out, "  {}", breaker_line(b));
    }
    let _ = writeln!(out, "{} {}", color::header("Deployment lock:"), lock_line(&ctx.lock));
    if let Some(ref a) = ctx.artifact {
        let _ = writeln!(
            out,
            "{} {} (revision {}, {})",
            color::header("Artifact:"),
            a.digest.short(),
            a.revision,
            a.status
        );
    }
    if ctx.consecutive_degraded > 0 {
        let _ = writeln!(
            out,
            "{} {} consecutive non-healthy checks",
            color::header("Health:"),
            ctx.consecutive_degraded
        );
    }
}

/// Report a failed daemon call and convert it into an exit error.
///
/// JSON mode prints the error object (with state context) on stdout so
/// scripts can parse it; text mode prints the context on stderr.
pub fn client_error(err: ClientError, format: OutputFormat) -> anyhow::Error {
    let exit = ExitError::from(&err);
    if let ClientError::Rejected { kind, message, context } = &err {
        match format {
            OutputFormat::Json => {
                let obj = serde_json::json!({
                    "error": kind,
                    "message": message,
                    "context": context,
                });
                if let Ok(text) = serde_json::to_string_pretty(&obj) {
                    println!("{text}");
                }
            }
            OutputFormat::Text => {
                if let Some(ctx) = context {
                    write_context(ctx, &mut std::io::stderr());
                }
            }
        }
    }
    exit.into()
}

/// Print a decision report; refusals become exit code 10.
pub fn print_decision(format: OutputFormat, report: &DecisionReport) -> anyhow::Result<()> {
    format_or_json(format, report, || {
        let decision = report.decision.to_string();
        let decision =
            if report.decision.proceeds() { color::good(&decision) } else { color::bad(&decision) };
        println!("Decision: {decision}");
        println!("Reason: {}", report.reason);
        if let Some(ref target) = report.target {
            println!("Target: {target}");
        }
        match report.deployed {
            Some(true) => println!("Deploy: {}", color::good("succeeded")),
            Some(false) => println!("Deploy: {}", color::bad("failed")),
            None => {}
        }
        println!("Audit: {}", color::muted(report.audit_id.as_str()));
        if !report.decision.proceeds() {
            println!();
            write_context(&report.context, &mut std::io::stdout());
        }
    })?;
    if report.decision.proceeds() {
        Ok(())
    } else {
        Err(ExitError::new(codes::DECISION_REFUSED, format!("decision: {}", report.decision)).into())
    }
}

/// Print consistency issues, one per line
pub fn print_issues(issues: &[dg_core::ConsistencyIssue], out: &mut dyn Write) {
    for issue in issues {
        let severity = match issue.severity {
            IssueSeverity::Warning => color::warn("warning"),
            IssueSeverity::Info => color::muted("info"),
        };
        let _ = writeln!(out, "  [{severity}] {}: {}", issue.component, issue.message);
    }
}

/// Print a list in text or JSON format, with a message when empty.
pub fn handle_list<T: Serialize>(
    format: OutputFormat,
    items: &[T],
    empty_msg: &str,
    render_text: impl FnOnce(&[T], &mut dyn Write),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(items)?);
        }
        OutputFormat::Text => {
            if items.is_empty() {
                println!("{}", empty_msg);
            } else {
                render_text(items, &mut std::io::stdout());
            }
        }
    }
    Ok(())
}

/// Print data as JSON, or run the text renderer.
pub fn format_or_json<T: Serialize>(
    format: OutputFormat,
    data: &T,
    text_fn: impl FnOnce(),
) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(data)?);
        }
        OutputFormat::Text => {
            text_fn();
        }
    }
    Ok(())
}

/// Write pretty JSON to a file
pub fn write_json_file<T: Serialize>(path: &std::path::Path, data: &T) -> anyhow::Result<()> {
    let text = serde_json::to_string_pretty(data)?;
    std::fs::write(path, text + "\n")
        .map_err(|e| anyhow::anyhow!("failed to write {}: {}", path.display(), e))
}
