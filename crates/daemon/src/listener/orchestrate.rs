// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Orchestrator request handlers.
//!
//! Every orchestrator operation answers with a decision report, including
//! refusals. Only malformed input and state store failures surface as
//! errors.

use dg_core::{DecisionReport, GuardError, HealthStatus};
use dg_engine::{RedeployRequest, RollbackRequest};
use dg_wire::Response;
use tracing::info;

use super::ListenCtx;

fn decision(ctx: &ListenCtx, result: Result<DecisionReport, GuardError>) -> Response {
    ctx.respond(result, None, |report| {
        info!(
            decision = %report.decision,
            audit_id = %report.audit_id,
            deployed = ?report.deployed,
            "{}",
            report.reason
        );
        Response::Decision { report: Box::new(report) }
    })
}

pub(super) fn handle_health(
    ctx: &ListenCtx,
    status: HealthStatus,
    details: Option<String>,
    at_ms: Option<u64>,
    actor: &str,
) -> Response {
    decision(ctx, ctx.guard.evaluate_health(status, details, at_ms, actor))
}

pub(super) fn handle_trigger_recovery(ctx: &ListenCtx, reason: &str, actor: &str) -> Response {
    decision(ctx, ctx.guard.trigger_recovery(actor, reason))
}

pub(super) fn handle_report_recovery(
    ctx: &ListenCtx,
    success: bool,
    session: Option<String>,
    reason: Option<String>,
    actor: &str,
) -> Response {
    decision(ctx, ctx.guard.report_recovery(success, session, reason, actor))
}

pub(super) async fn handle_redeploy(ctx: &ListenCtx, req: RedeployRequest) -> Response {
    decision(ctx, ctx.guard.redeploy(req).await)
}

pub(super) async fn handle_rollback(ctx: &ListenCtx, req: RollbackRequest) -> Response {
    decision(ctx, ctx.guard.rollback(req).await)
}
