// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Circuit breaker request handlers.

use dg_core::Track;
use dg_wire::Response;

use super::ListenCtx;

pub(super) fn handle_failure(
    ctx: &ListenCtx,
    track: Track,
    reason: Option<String>,
    actor: &str,
) -> Response {
    let result = ctx.guard.record_failure(track, reason, actor);
    ctx.respond(result, None, |status| Response::Breakers { breakers: vec![status] })
}

pub(super) fn handle_check(ctx: &ListenCtx, track: Option<Track>, actor: &str) -> Response {
    let result = ctx.guard.check_thresholds(track, actor);
    ctx.respond(result, None, |checks| Response::ThresholdChecks { checks })
}

pub(super) fn handle_open(
    ctx: &ListenCtx,
    track: Option<Track>,
    reason: &str,
    actor: &str,
) -> Response {
    let result = ctx.guard.open_breaker(track, reason, actor);
    ctx.respond(result, None, |breakers| Response::Breakers { breakers })
}

pub(super) fn handle_close(
    ctx: &ListenCtx,
    track: Option<Track>,
    reset_failures: bool,
    force: bool,
    reason: Option<&str>,
    actor: &str,
) -> Response {
    let result = ctx.guard.close_breaker(track, reset_failures, force, reason, actor);
    ctx.respond(result, None, |breakers| Response::Breakers { breakers })
}

pub(super) fn handle_threshold(
    ctx: &ListenCtx,
    track: Track,
    threshold: u32,
    reason: Option<&str>,
    actor: &str,
) -> Response {
    let result = ctx.guard.set_threshold(track, threshold, reason, actor);
    ctx.respond(result, None, |status| Response::Breakers { breakers: vec![status] })
}
