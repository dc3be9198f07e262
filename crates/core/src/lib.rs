// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! dg-core: Domain types for the deploy-guard safety layer

pub mod macros;

pub mod artifact;
pub mod audit;
pub mod breaker;
pub mod clock;
pub mod context;
pub mod decision;
pub mod deployment;
pub mod digest;
pub mod error;
pub mod event;
pub mod health;
pub mod id;
pub mod lock;
pub mod manual;
pub mod report;
pub mod time_fmt;

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

pub use artifact::{Artifact, ArtifactStatus, TestResult, TestStatus};
pub use audit::{AuditEntry, AuditId, AuditOutcome};
pub use breaker::{
    BreakerEvent, BreakerEventKind, BreakerState, BreakerStatus, BreakerTrack, OpenedBy,
    ThresholdCheck, Track,
};
pub use clock::{Clock, FakeClock, SystemClock};
pub use context::{ArtifactSummary, StateContext};
pub use decision::Decision;
pub use deployment::{
    DeployTarget, DeploymentPointers, RecoveryCompletion, RecoveryHistory, RecoveryTrigger,
    RedeployRecord, RollbackMode,
};
pub use digest::{is_valid_digest, Digest};
pub use error::{ErrorKind, GuardError};
pub use event::Event;
pub use health::{HealthHistory, HealthRecord, HealthStatus};
pub use id::short;
pub use lock::{AcquireOutcome, LockHolder, LockStatus};
pub use manual::{validate_manual_action, Sensitivity};
pub use report::{
    BreakerExport, ConsistencyIssue, ConsistencyReport, DecisionReport, DigestValidation,
    IssueSeverity, ThresholdStatus, TrackCheck,
};
pub use time_fmt::{format_elapsed, format_elapsed_ms};
