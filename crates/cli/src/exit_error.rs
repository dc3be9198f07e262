// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Custom error type that carries a process exit code.
//!
//! Commands return `ExitError` instead of calling `std::process::exit()`
//! directly, allowing `main()` to handle process termination.

use std::fmt;

use dg_core::ErrorKind;

use crate::client::ClientError;

/// Process exit codes scripted callers branch on
pub mod codes {
    pub const GENERIC: i32 = 1;
    pub const VALIDATION: i32 = 2;
    pub const NOT_FOUND: i32 = 3;
    pub const CONFLICT: i32 = 4;
    pub const REGISTRY_UNREACHABLE: i32 = 5;
    pub const INVALID_TRANSITION: i32 = 6;
    pub const STATE_STORE: i32 = 7;
    pub const NOT_OWNER: i32 = 8;
    /// The orchestrator refused: blocked, escalated or breaker opened
    pub const DECISION_REFUSED: i32 = 10;
    pub const DAEMON_NOT_RUNNING: i32 = 11;
}

pub fn code_for_kind(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::Validation => codes::VALIDATION,
        ErrorKind::NotFound => codes::NOT_FOUND,
        ErrorKind::Conflict => codes::CONFLICT,
        ErrorKind::RegistryUnreachable => codes::REGISTRY_UNREACHABLE,
        ErrorKind::InvalidTransition => codes::INVALID_TRANSITION,
        ErrorKind::StateStore => codes::STATE_STORE,
        ErrorKind::NotOwner => codes::NOT_OWNER,
    }
}

#[derive(Debug)]
pub struct ExitError {
    pub code: i32,
    pub message: String,
}

impl ExitError {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self { code, message: message.into() }
    }
}

impl From<&ClientError> for ExitError {
    fn from(err: &ClientError) -> Self {
        let code = match err {
            ClientError::Rejected { kind: Some(kind), .. } => code_for_kind(*kind),
            e if e.is_not_running() => codes::DAEMON_NOT_RUNNING,
            _ => codes::GENERIC,
        };
        Self::new(code, err.to_string())
    }
}

impl fmt::Display for ExitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for ExitError {}

#[cfg(test)]
#[path = "exit_error_tests.rs"]
mod tests;
