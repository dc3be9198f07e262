// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Parameter checks for operator-initiated actions

use crate::error::GuardError;

pub const MIN_REASON_CHARS: usize = 5;
pub const MIN_SENSITIVE_REASON_CHARS: usize = 20;

/// Whether an action bypasses a safety rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Sensitivity {
    Routine,
    /// Emergency override, breaker override, forced status, file-based rollback
    Bypass,
}

/// Require a named actor and a reason long enough for the action.
pub fn validate_manual_action(
    actor: &str,
    reason: Option<&str>,
    sensitivity: Sensitivity,
) -> Result<(), GuardError> {
    if actor.trim().is_empty() {
        return Err(GuardError::validation("actor must not be empty"));
    }
    let min = match sensitivity {
        Sensitivity::Routine => MIN_REASON_CHARS,
        Sensitivity::Bypass => MIN_SENSITIVE_REASON_CHARS,
    };
    let len = reason.map(|r| r.trim().chars().count()).unwrap_or(0);
    if len < min {
        let what = match sensitivity {
            Sensitivity::Routine => "manual actions",
            Sensitivity::Bypass => "safety bypasses",
        };
        return Err(GuardError::Validation(format!(
            "{what} require a reason of at least {min} characters"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use yare::parameterized;

    #[parameterized(
        routine_ok = { "alice", Some("rotate"), Sensitivity::Routine, true },
        routine_short = { "alice", Some("why"), Sensitivity::Routine, false },
        routine_missing = { "alice", None, Sensitivity::Routine, false },
        blank_actor = { "  ", Some("a perfectly fine reason"), Sensitivity::Routine, false },
        bypass_short = { "alice", Some("prod is down"), Sensitivity::Bypass, false },
        bypass_ok = { "alice", Some("prod is down, backup image verified"), Sensitivity::Bypass, true },
        whitespace_padding = { "alice", Some("   ab   "), Sensitivity::Routine, false },
    )]
    fn reason_rules(actor: &str, reason: Option<&str>, sensitivity: Sensitivity, ok: bool) {
        assert_eq!(validate_manual_action(actor, reason, sensitivity).is_ok(), ok);
    }
}
