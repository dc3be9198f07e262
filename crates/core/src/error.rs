// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared by every component

use crate::artifact::ArtifactStatus;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Stable classification of a [`GuardError`], carried over the wire and
/// mapped to process exit codes by the CLI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    NotOwner,
    InvalidTransition,
    RegistryUnreachable,
    StateStore,
}

crate::simple_display! {
    ErrorKind {
        Validation => "validation",
        NotFound => "not_found",
        Conflict => "conflict",
        NotOwner => "not_owner",
        InvalidTransition => "invalid_transition",
        RegistryUnreachable => "registry_unreachable",
        StateStore => "state_store",
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GuardError {
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("not found: {0}")]
    NotFound(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("lock is held by '{holder}', not '{requester}'")]
    NotOwner { holder: String, requester: String },

    #[error("illegal status transition {from} -> {to}")]
    InvalidTransition { from: ArtifactStatus, to: ArtifactStatus },

    #[error("artifact registry unreachable: {0}")]
    RegistryUnreachable(String),

    #[error("state store failure: {0}")]
    StateStore(String),
}

impl GuardError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            GuardError::Validation(_) => ErrorKind::Validation,
            GuardError::NotFound(_) => ErrorKind::NotFound,
            GuardError::Conflict(_) => ErrorKind::Conflict,
            GuardError::NotOwner { .. } => ErrorKind::NotOwner,
            GuardError::InvalidTransition { .. } => ErrorKind::InvalidTransition,
            GuardError::RegistryUnreachable(_) => ErrorKind::RegistryUnreachable,
            GuardError::StateStore(_) => ErrorKind::StateStore,
        }
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        GuardError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        GuardError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        GuardError::Conflict(msg.into())
    }
}
