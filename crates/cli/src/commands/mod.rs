// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! CLI command implementations

pub mod artifact;
pub mod audit;
pub mod breaker;
pub mod daemon;
pub mod lock;
pub mod orchestrate;

use crate::client::DaemonClient;
use crate::output::{client_error, OutputFormat};

/// Connect to the running daemon, reporting "not running" with its exit code
pub(crate) fn connect(format: OutputFormat) -> anyhow::Result<DaemonClient> {
    DaemonClient::connect().map_err(|e| client_error(e, format))
}

/// Run id for a deploy or lock claim: given, from CI, or fresh
pub(crate) fn run_id(given: Option<String>) -> String {
    given
        .or_else(|| std::env::var("GITHUB_RUN_ID").ok().filter(|s| !s.is_empty()))
        .unwrap_or_else(|| format!("run-{}", uuid::Uuid::new_v4().simple()))
}
