// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Cross-component consistency report

use crate::guard::Guard;
use dg_adapters::{ArtifactResolver, Deployer};
use dg_core::{
    format_elapsed_ms, ArtifactStatus, Clock, ConsistencyIssue, ConsistencyReport, IssueSeverity,
    OpenedBy, Track,
};
use dg_storage::MaterializedState;

fn issue(severity: IssueSeverity, component: &str, message: String) -> ConsistencyIssue {
    ConsistencyIssue { severity, component: component.to_string(), message }
}

fn inspect(state: &MaterializedState, now_ms: u64, stale_lock_ms: u64) -> Vec<ConsistencyIssue> {
    let mut issues = Vec::new();

    for track in Track::ALL {
        let b = state.breaker(track);
        let component = format!("breaker.{track}");
        if !b.is_open() && b.over_threshold() {
            issues.push(issue(
                IssueSeverity::Warning,
                &component,
                format!(
                    "closed with {} failures at threshold {}; run `dg breaker check` to open it",
                    b.failure_count, b.threshold
                ),
            ));
        }
        if b.is_open() && b.opened_by == Some(OpenedBy::Auto) && !b.over_threshold() {
            issues.push(issue(
                IssueSeverity::Info,
                &component,
                format!(
                    "opened automatically but {} failures is now below threshold {}",
                    b.failure_count, b.threshold
                ),
            ));
        }
    }

    let pointers = &state.deployment;
    if pointers.backup_matches_current() {
        issues.push(issue(
            IssueSeverity::Warning,
            "deployment",
            "backup equals the current deployment; a latest-backup rollback would change nothing"
                .to_string(),
        ));
    }
    if let Some(current) = &pointers.current {
        match state.artifact(current.as_str()) {
            None => issues.push(issue(
                IssueSeverity::Warning,
                "deployment",
                format!("current deployment {} is not in the artifact registry", current.short()),
            )),
            Some(a) if a.status != ArtifactStatus::Deployed => issues.push(issue(
                IssueSeverity::Warning,
                "deployment",
                format!("current deployment {} has status {}", current.short(), a.status),
            )),
            Some(_) => {}
        }
    }

    if let Some(holder) = &state.lock {
        let age = holder.age_ms(now_ms);
        if age >= stale_lock_ms {
            issues.push(issue(
                IssueSeverity::Warning,
                "lock",
                format!(
                    "held by {} (run {}) for {}; consider clearing stuck deployment lock",
                    holder.holder_id,
                    holder.run_id,
                    format_elapsed_ms(age)
                ),
            ));
        }
    }

    if let Some(last) = &state.recovery.last_redeploy {
        let running = state.lock.as_ref().is_some_and(|h| h.run_id == last.run_id);
        if last.success.is_none() && !running {
            issues.push(issue(
                IssueSeverity::Warning,
                "redeploy",
                format!("run {} started a deploy that never finished", last.run_id),
            ));
        }
    }

    issues
}

impl<R: ArtifactResolver, D: Deployer, C: Clock> Guard<R, D, C> {
    /// Read-only check that the components agree with each other
    pub fn consistency(&self) -> ConsistencyReport {
        let now = self.now();
        let stale_ms = self.config.stale_lock_secs.saturating_mul(1000);
        self.ledger.read(|state| {
            let issues = inspect(state, now, stale_ms);
            let consistent = !issues.iter().any(|i| i.severity == IssueSeverity::Warning);
            ConsistencyReport { consistent, issues, context: state.context(now, None) }
        })
    }
}
