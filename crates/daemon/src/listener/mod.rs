// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Listener task for handling socket I/O.
//!
//! The Listener runs in a spawned task, accepting connections and
//! handling each one in its own task. Every mutation goes through the
//! shared guard, which serializes it against all others.

mod artifacts;
mod breaker;
mod lock;
mod orchestrate;
mod query;

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use dg_core::GuardError;
use dg_wire::{self as wire, DaemonStatus, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::net::UnixListener;
use tokio::sync::Notify;
use tracing::{debug, error, info, warn};

use crate::env::{ipc_timeout, PROTOCOL_VERSION};
use crate::lifecycle::DaemonGuard;

/// Shared daemon context for all request handlers.
pub(crate) struct ListenCtx {
    pub guard: Arc<DaemonGuard>,
    pub state_dir: PathBuf,
    pub start_time: Instant,
    pub shutdown: Arc<Notify>,
}

impl ListenCtx {
    /// Map an engine result to a response. Errors carry the current
    /// breaker, lock and (when named) artifact state.
    fn respond<T>(
        &self,
        result: Result<T, GuardError>,
        digest: Option<&str>,
        ok: impl FnOnce(T) -> Response,
    ) -> Response {
        match result {
            Ok(value) => ok(value),
            Err(e) => {
                debug!(kind = %e.kind(), error = %e, "request failed");
                Response::from_error(&e, Some(self.guard.context(digest)))
            }
        }
    }
}

/// Listener task for accepting socket connections.
pub(crate) struct Listener {
    unix: UnixListener,
    ctx: Arc<ListenCtx>,
}

/// Errors from connection handling.
#[derive(Debug, Error)]
pub(crate) enum ConnectionError {
    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),
}

impl Listener {
    pub fn new(unix: UnixListener, ctx: Arc<ListenCtx>) -> Self {
        Self { unix, ctx }
    }

    /// Run the listener loop, spawning a task for each connection.
    pub async fn run(self) {
        loop {
            match self.unix.accept().await {
                Ok((stream, _)) => {
                    let ctx = Arc::clone(&self.ctx);
                    tokio::spawn(async move {
                        let (reader, writer) = stream.into_split();
                        if let Err(e) = handle_connection(reader, writer, &ctx).await {
                            log_connection_error(e);
                        }
                    });
                }
                Err(e) => error!("Unix accept error: {}", e),
            }
        }
    }
}

fn log_connection_error(e: ConnectionError) {
    match e {
        ConnectionError::Protocol(ProtocolError::ConnectionClosed) => {
            debug!("Client disconnected")
        }
        ConnectionError::Protocol(ProtocolError::Timeout) => {
            warn!("Connection timeout")
        }
        _ => error!("Connection error: {}", e),
    }
}

/// Handle a single client connection: one request, one response.
///
/// The handler always runs to completion, even if the client goes away
/// mid-request. A deploy that has started must still record its outcome
/// and release the deployment lock.
async fn handle_connection<R, W>(
    mut reader: R,
    mut writer: W,
    ctx: &ListenCtx,
) -> Result<(), ConnectionError>
where
    R: AsyncRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    let request = wire::read_request(&mut reader, ipc_timeout()).await?;

    // Log queries at debug level (frequent polling), other requests at info
    if matches!(request, Request::Query { .. } | Request::Ping | Request::Hello { .. }) {
        debug!(request = ?request, "received query");
    } else {
        info!(request = ?request, "received request");
    }

    let response = handle_request(request, ctx).await;
    debug!("Sending response: {:?}", response);

    wire::write_response(&mut writer, &response, ipc_timeout()).await?;
    Ok(())
}

/// Handle a single request and return a response.
pub(crate) async fn handle_request(request: Request, ctx: &ListenCtx) -> Response {
    match request {
        Request::Ping => Response::Pong,

        Request::Hello { version } => {
            if version != PROTOCOL_VERSION {
                warn!(client = %version, daemon = PROTOCOL_VERSION, "client version mismatch");
            }
            Response::Hello { version: PROTOCOL_VERSION.to_string() }
        }

        Request::Query { query } => query::handle_query(ctx, query),

        Request::Shutdown => {
            ctx.shutdown.notify_one();
            Response::ShuttingDown
        }

        Request::Status => handle_status(ctx),

        Request::RecordArtifact { revision, digest, location, at_ms, actor } => {
            artifacts::handle_record(ctx, revision, digest, location, at_ms, actor)
        }

        Request::ValidateDigest { digest, location } => {
            artifacts::handle_validate(ctx, digest, location).await
        }

        Request::UpdateStatus { digest, status, at_ms, force, reason, actor } => {
            artifacts::handle_update_status(
                ctx,
                dg_engine::StatusUpdate { digest, status, at_ms, force, reason, actor },
            )
        }

        Request::RecordTestResult { digest, test_type, status, at_ms, details, actor } => {
            artifacts::handle_test_result(
                ctx,
                dg_engine::TestResultInput { digest, test_type, status, at_ms, details, actor },
            )
        }

        Request::BreakerFailure { track, reason, actor } => {
            breaker::handle_failure(ctx, track, reason, &actor)
        }

        Request::BreakerCheck { track, actor } => breaker::handle_check(ctx, track, &actor),

        Request::BreakerOpen { track, reason, actor } => {
            breaker::handle_open(ctx, track, &reason, &actor)
        }

        Request::BreakerClose { track, keep_failures, force, reason, actor } => {
            breaker::handle_close(ctx, track, !keep_failures, force, reason.as_deref(), &actor)
        }

        Request::SetThreshold { track, threshold, reason, actor } => {
            breaker::handle_threshold(ctx, track, threshold, reason.as_deref(), &actor)
        }

        Request::LockAcquire { holder_id, run_id, emergency, reason } => lock::handle_acquire(
            ctx,
            dg_engine::AcquireRequest { holder_id, run_id, emergency, reason },
        ),

        Request::LockRelease { holder_id } => lock::handle_release(ctx, &holder_id),

        Request::LockClear { reason, actor } => lock::handle_clear(ctx, &actor, reason.as_deref()),

        Request::EvaluateHealth { status, details, at_ms, actor } => {
            orchestrate::handle_health(ctx, status, details, at_ms, &actor)
        }

        Request::TriggerRecovery { reason, actor } => {
            orchestrate::handle_trigger_recovery(ctx, &reason, &actor)
        }

        Request::ReportRecovery { success, session, reason, actor } => {
            orchestrate::handle_report_recovery(ctx, success, session, reason, &actor)
        }

        Request::Redeploy { digest, location, run_id, emergency, reason, actor } => {
            orchestrate::handle_redeploy(
                ctx,
                dg_engine::RedeployRequest { digest, location, actor, run_id, emergency, reason },
            )
            .await
        }

        Request::Rollback {
            mode,
            digest,
            file,
            location,
            run_id,
            reason,
            override_breaker,
            emergency,
            actor,
        } => {
            orchestrate::handle_rollback(
                ctx,
                dg_engine::RollbackRequest {
                    mode,
                    digest,
                    file,
                    location,
                    actor,
                    run_id,
                    reason,
                    override_breaker,
                    emergency,
                },
            )
            .await
        }
    }
}

fn handle_status(ctx: &ListenCtx) -> Response {
    let guard = &ctx.guard;
    let context = guard.context(None);
    let artifacts = guard.ledger().read(|state| state.artifacts.len());
    Response::Status {
        status: Box::new(DaemonStatus {
            version: PROTOCOL_VERSION.to_string(),
            pid: std::process::id(),
            uptime_secs: ctx.start_time.elapsed().as_secs(),
            state_dir: ctx.state_dir.clone(),
            write_seq: guard.ledger().write_seq(),
            artifacts,
            breakers: context.breakers,
            lock: context.lock,
        }),
    }
}

#[cfg(test)]
pub(crate) fn test_ctx(dir: &std::path::Path, settings: &crate::settings::Settings) -> ListenCtx {
    use dg_core::SystemClock;
    use dg_engine::{Guard, Ledger};
    use dg_storage::{MemoryStore, StateStore};

    let config = settings.guard_config();
    let store: Arc<dyn StateStore> = Arc::new(MemoryStore::new());
    let ledger = Ledger::open(store, &config).unwrap();
    let guard = Guard::new(ledger, settings.resolver(), settings.deployer(), SystemClock, config);
    ListenCtx {
        guard: Arc::new(guard),
        state_dir: dir.to_path_buf(),
        start_time: Instant::now(),
        shutdown: Arc::new(Notify::new()),
    }
}

#[cfg(test)]
#[path = "../listener_tests/mod.rs"]
mod tests;
