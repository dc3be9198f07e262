// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon client: one request/response exchange per call.

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::time::Duration;

use dg_core::{ErrorKind, StateContext};
use dg_wire::{self as wire, ProtocolError, Request, Response};
use thiserror::Error;
use tokio::net::UnixStream;

use crate::env;

#[path = "client_lifecycle.rs"]
mod lifecycle;
#[path = "client_queries.rs"]
mod queries;

pub use lifecycle::{daemon_start, daemon_stop, StartResult};
pub use queries::RollbackArgs;
pub(crate) use lifecycle::find_dgd_binary;

/// Errors talking to the daemon
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("Daemon not running (start it with `dg daemon start`)")]
    DaemonNotRunning,

    #[error("Could not determine state directory")]
    NoStateDir,

    #[error("Failed to start daemon: {0}")]
    DaemonStartFailed(String),

    #[error("Timed out after {0:?} waiting for the daemon")]
    Timeout(Duration),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("{message}")]
    Rejected { kind: Option<ErrorKind>, message: String, context: Option<Box<StateContext>> },

    #[error("Unexpected response from daemon: {0}")]
    UnexpectedResponse(String),
}

impl ClientError {
    /// Whether the error means no daemon is listening
    pub fn is_not_running(&self) -> bool {
        match self {
            ClientError::DaemonNotRunning => true,
            ClientError::Io(e) => {
                matches!(e.kind(), IoErrorKind::NotFound | IoErrorKind::ConnectionRefused)
            }
            ClientError::Protocol(ProtocolError::ConnectionClosed) => true,
            _ => false,
        }
    }
}

/// Client for the daemon's Unix socket
#[derive(Debug, Clone)]
pub struct DaemonClient {
    socket_path: PathBuf,
}

impl DaemonClient {
    /// Client for the daemon of the configured state directory.
    ///
    /// Fails fast when no socket exists; a stale socket surfaces as
    /// [`ClientError::DaemonNotRunning`] on the first request.
    pub fn connect() -> Result<Self, ClientError> {
        let state_dir = env::state_dir().ok_or(ClientError::NoStateDir)?;
        Self::at(&state_dir.join("daemon.sock"))
    }

    pub fn at(socket_path: &Path) -> Result<Self, ClientError> {
        if !socket_path.exists() {
            return Err(ClientError::DaemonNotRunning);
        }
        Ok(Self { socket_path: socket_path.to_path_buf() })
    }

    /// Send a request and wait for its response.
    ///
    /// Deploy-executing requests wait up to the action timeout; everything
    /// else uses the IPC timeout.
    pub async fn send(&self, request: &Request) -> Result<Response, ClientError> {
        let timeout =
            if request.runs_deploy() { env::action_timeout() } else { env::ipc_timeout() };
        match tokio::time::timeout(timeout, self.exchange(request)).await {
            Ok(result) => result,
            Err(_) => Err(ClientError::Timeout(timeout)),
        }
    }

    async fn exchange(&self, request: &Request) -> Result<Response, ClientError> {
        let stream = UnixStream::connect(&self.socket_path).await.map_err(|e| {
            if matches!(e.kind(), IoErrorKind::NotFound | IoErrorKind::ConnectionRefused) {
                ClientError::DaemonNotRunning
            } else {
                ClientError::Io(e)
            }
        })?;
        let (mut reader, mut writer) = stream.into_split();
        let data = wire::encode(request)?;
        wire::write_message(&mut writer, &data).await?;
        let bytes = wire::read_message(&mut reader).await?;
        Ok(wire::decode(&bytes)?)
    }

    /// Turn an error (or unexpected) response into a client error
    pub(crate) fn reject<T>(response: Response) -> Result<T, ClientError> {
        match response {
            Response::Error { kind, message, context } => {
                Err(ClientError::Rejected { kind, message, context })
            }
            other => Err(ClientError::UnexpectedResponse(format!("{other:?}"))),
        }
    }

    /// Exchange versions with the daemon
    pub async fn hello(&self) -> Result<String, ClientError> {
        let request = Request::Hello { version: env::PROTOCOL_VERSION.to_string() };
        match self.send(&request).await? {
            Response::Hello { version } => Ok(version),
            other => Self::reject(other),
        }
    }
}

#[cfg(test)]
#[path = "client_tests.rs"]
mod tests;
