// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Deployment lock: single-holder mutual exclusion for redeploy/rollback.
//!
//! There is no automatic expiry. An orphaned lock stays held until an
//! operator clears it.

use serde::{Deserialize, Serialize};

/// The current holder of the deployment lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockHolder {
    pub holder_id: String,
    pub run_id: String,
    pub acquired_at_ms: u64,
    /// Set only when acquisition displaced an existing holder
    #[serde(default)]
    pub emergency_override: bool,
    /// Holder that was displaced by the emergency override
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overridden_holder: Option<String>,
}

impl LockHolder {
    pub fn age_ms(&self, now_ms: u64) -> u64 {
        now_ms.saturating_sub(self.acquired_at_ms)
    }

    /// Same holder and same run, i.e. a retried acquire
    pub fn is_same_claim(&self, holder_id: &str, run_id: &str) -> bool {
        self.holder_id == holder_id && self.run_id == run_id
    }
}

/// Read-only view of the lock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LockStatus {
    pub held: bool,
    #[serde(default)]
    pub holder_id: Option<String>,
    #[serde(default)]
    pub run_id: Option<String>,
    #[serde(default)]
    pub acquired_at_ms: Option<u64>,
    #[serde(default)]
    pub age_ms: Option<u64>,
    #[serde(default)]
    pub emergency_override: bool,
}

impl LockStatus {
    pub fn from_holder(holder: Option<&LockHolder>, now_ms: u64) -> Self {
        match holder {
            Some(h) => Self {
                held: true,
                holder_id: Some(h.holder_id.clone()),
                run_id: Some(h.run_id.clone()),
                acquired_at_ms: Some(h.acquired_at_ms),
                age_ms: Some(h.age_ms(now_ms)),
                emergency_override: h.emergency_override,
            },
            None => Self::unheld(),
        }
    }

    pub fn unheld() -> Self {
        Self {
            held: false,
            holder_id: None,
            run_id: None,
            acquired_at_ms: None,
            age_ms: None,
            emergency_override: false,
        }
    }
}

/// Result of an acquire attempt. Contention is an outcome, not an error.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum AcquireOutcome {
    Locked {
        status: LockStatus,
        /// Holder displaced by an emergency override
        #[serde(default, skip_serializing_if = "Option::is_none")]
        overridden: Option<LockHolder>,
    },
    Conflict {
        holder: LockHolder,
        age_ms: u64,
    },
}

impl AcquireOutcome {
    pub fn is_locked(&self) -> bool {
        matches!(self, AcquireOutcome::Locked { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn holder() -> LockHolder {
        LockHolder {
            holder_id: "opA".to_string(),
            run_id: "run1".to_string(),
            acquired_at_ms: 10_000,
            emergency_override: false,
            overridden_holder: None,
        }
    }

    #[test]
    fn status_reports_age() {
        let status = LockStatus::from_holder(Some(&holder()), 70_000);
        assert!(status.held);
        assert_eq!(status.holder_id.as_deref(), Some("opA"));
        assert_eq!(status.age_ms, Some(60_000));
    }

    #[test]
    fn age_never_underflows() {
        assert_eq!(holder().age_ms(0), 0);
    }

    #[test]
    fn unheld_status_has_no_holder() {
        let status = LockStatus::from_holder(None, 1);
        assert!(!status.held);
        assert!(status.holder_id.is_none());
    }

    #[test]
    fn same_claim_requires_holder_and_run() {
        let h = holder();
        assert!(h.is_same_claim("opA", "run1"));
        assert!(!h.is_same_claim("opA", "run2"));
        assert!(!h.is_same_claim("opB", "run1"));
    }
}
