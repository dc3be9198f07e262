// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment lock request handlers.

use dg_core::AcquireOutcome;
use dg_engine::AcquireRequest;
use dg_wire::Response;
use tracing::{info, warn};

use super::ListenCtx;

pub(super) fn handle_acquire(ctx: &ListenCtx, req: AcquireRequest) -> Response {
    let result = ctx.guard.acquire_lock(req);
    ctx.respond(result, None, |outcome| {
        match &outcome {
            AcquireOutcome::Locked { overridden: Some(previous), .. } => {
                warn!(overridden = %previous.holder_id, "deployment lock taken over")
            }
            AcquireOutcome::Conflict { holder, age_ms } => {
                info!(holder = %holder.holder_id, age_ms, "deployment lock contended")
            }
            AcquireOutcome::Locked { .. } => {}
        }
        Response::LockAcquired { outcome }
    })
}

pub(super) fn handle_release(ctx: &ListenCtx, holder_id: &str) -> Response {
    let result = ctx.guard.release_lock(holder_id);
    ctx.respond(result, None, |holder| Response::LockReleased { holder })
}

pub(super) fn handle_clear(ctx: &ListenCtx, actor: &str, reason: Option<&str>) -> Response {
    let result = ctx.guard.clear_lock(actor, reason);
    ctx.respond(result, None, |holder| {
        if let Some(ref holder) = holder {
            info!(holder = %holder.holder_id, actor, "deployment lock cleared");
        }
        Response::LockCleared { holder }
    })
}
