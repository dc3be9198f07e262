// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Outbound orchestrator decisions

use crate::error::ErrorKind;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Decision {
    Allow,
    TriggerRecovery,
    TriggerRedeploy,
    OpenCircuit,
    Blocked,
    BlockedManualInterventionRequired,
    EscalateRedeploymentBlocked,
    Escalate,
    RetryNotPermitted,
}

crate::simple_display! {
    Decision {
        Allow => "allow",
        TriggerRecovery => "trigger-recovery",
        TriggerRedeploy => "trigger-redeploy",
        OpenCircuit => "open-circuit",
        Blocked => "blocked",
        BlockedManualInterventionRequired => "blocked-manual-intervention-required",
        EscalateRedeploymentBlocked => "escalate-redeployment-blocked",
        Escalate => "escalate",
        RetryNotPermitted => "retry-not-permitted",
    }
}

impl Decision {
    /// Whether the pipeline may carry on (possibly with the triggered action)
    pub fn proceeds(self) -> bool {
        matches!(self, Decision::Allow | Decision::TriggerRecovery | Decision::TriggerRedeploy)
    }

    /// Outbound decision for an operation that failed with `kind`.
    ///
    /// Caller-side problems block; infrastructure problems escalate to a human.
    pub fn for_error(kind: ErrorKind) -> Decision {
        match kind {
            ErrorKind::Validation
            | ErrorKind::NotFound
            | ErrorKind::Conflict
            | ErrorKind::NotOwner
            | ErrorKind::InvalidTransition => Decision::Blocked,
            ErrorKind::RegistryUnreachable | ErrorKind::StateStore => Decision::Escalate,
        }
    }
}
