// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Lock, health, deployment pointer, and recovery bookkeeping

use super::MaterializedState;
use dg_core::{Event, RecoveryCompletion, RecoveryTrigger, RedeployRecord};

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::DeploymentRecorded { digest, at_ms } => {
            state.deployment.record_deployed(digest, *at_ms);
        }

        Event::LockAcquired { holder } => {
            state.lock = Some(holder.clone());
        }

        Event::LockReleased { holder_id, .. } => {
            if state.lock.as_ref().is_some_and(|h| &h.holder_id == holder_id) {
                state.lock = None;
            }
        }

        Event::LockCleared { .. } => {
            state.lock = None;
        }

        Event::HealthRecorded { record, .. } => {
            state.health.record(record.clone());
        }

        Event::RecoveryTriggered { reason, at_ms } => {
            state.recovery.last_trigger =
                Some(RecoveryTrigger { at_ms: *at_ms, reason: reason.clone() });
        }

        Event::RecoveryCompleted { success, session, at_ms } => {
            state.recovery.last_completion =
                Some(RecoveryCompletion { at_ms: *at_ms, success: *success, session: session.clone() });
        }

        Event::RedeployStarted { target, run_id, at_ms } => {
            state.recovery.last_redeploy = Some(RedeployRecord {
                started_at_ms: *at_ms,
                target: target.clone(),
                run_id: run_id.clone(),
                success: None,
                finished_at_ms: None,
            });
        }

        Event::RedeployFinished { run_id, success, at_ms } => {
            if let Some(record) = state.recovery.last_redeploy.as_mut() {
                if &record.run_id == run_id {
                    record.success = Some(*success);
                    record.finished_at_ms = Some(*at_ms);
                }
            }
        }

        _ => {}
    }
}
