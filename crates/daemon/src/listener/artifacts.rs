// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Artifact registry request handlers.

use dg_engine::{RecordArtifact, StatusUpdate, TestResultInput};
use dg_wire::Response;
use tracing::info;

use super::ListenCtx;

pub(super) fn handle_record(
    ctx: &ListenCtx,
    revision: String,
    digest: String,
    location: Option<String>,
    at_ms: Option<u64>,
    actor: String,
) -> Response {
    let named = digest.clone();
    let result =
        ctx.guard.record_artifact(RecordArtifact { revision, digest, location, at_ms, actor });
    ctx.respond(result, Some(&named), |artifact| {
        info!(digest = %artifact.digest, revision = %artifact.revision, "artifact recorded");
        Response::Artifact { artifact: Box::new(artifact) }
    })
}

pub(super) async fn handle_validate(
    ctx: &ListenCtx,
    digest: String,
    location: Option<String>,
) -> Response {
    let result = ctx.guard.validate_digest(&digest, location.as_deref()).await;
    ctx.respond(result, Some(&digest), |validation| Response::DigestValidation { validation })
}

pub(super) fn handle_update_status(ctx: &ListenCtx, update: StatusUpdate) -> Response {
    let named = update.digest.clone();
    let result = ctx.guard.update_status(update);
    ctx.respond(result, Some(&named), |artifact| {
        info!(digest = %artifact.digest, status = %artifact.status, "artifact status updated");
        Response::Artifact { artifact: Box::new(artifact) }
    })
}

pub(super) fn handle_test_result(ctx: &ListenCtx, input: TestResultInput) -> Response {
    let named = input.digest.clone();
    let result = ctx.guard.record_test_result(input);
    ctx.respond(result, Some(&named), |artifact| Response::Artifact { artifact: Box::new(artifact) })
}
