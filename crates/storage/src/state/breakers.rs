// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::MaterializedState;
use dg_core::{BreakerEvent, BreakerEventKind, BreakerState, Event};

pub(super) fn apply(state: &mut MaterializedState, event: &Event) {
    match event {
        Event::BreakerFailureRecorded { track, failure_count, reason, at_ms } => {
            let t = state.breaker_mut(*track);
            let crossed = t.failure_count < t.threshold && *failure_count >= t.threshold;
            t.failure_count = *failure_count;
            t.last_failure_at_ms = Some(*at_ms);
            t.last_failure_reason = reason.clone();
            if crossed {
                let trail = BreakerEvent {
                    at_ms: *at_ms,
                    track: *track,
                    kind: BreakerEventKind::ThresholdBreached,
                    failure_count: t.failure_count,
                    threshold: t.threshold,
                    reason: reason.clone(),
                    actor: None,
                };
                t.push_event(trail);
            }
        }

        Event::BreakerOpened { track, by, reason, actor, at_ms } => {
            let t = state.breaker_mut(*track);
            if !t.is_open() {
                t.state = BreakerState::Open;
                t.opened_at_ms = Some(*at_ms);
                t.opened_by = Some(*by);
                t.open_reason = Some(reason.clone());
                let trail = BreakerEvent {
                    at_ms: *at_ms,
                    track: *track,
                    kind: BreakerEventKind::Opened,
                    failure_count: t.failure_count,
                    threshold: t.threshold,
                    reason: Some(reason.clone()),
                    actor: actor.clone(),
                };
                t.push_event(trail);
            }
        }

        Event::BreakerClosed { track, reset_failures, actor, at_ms } => {
            let t = state.breaker_mut(*track);
            if *reset_failures {
                t.failure_count = 0;
            }
            if t.is_open() {
                t.state = BreakerState::Closed;
                t.opened_at_ms = None;
                t.opened_by = None;
                t.open_reason = None;
                let trail = BreakerEvent {
                    at_ms: *at_ms,
                    track: *track,
                    kind: BreakerEventKind::Closed,
                    failure_count: t.failure_count,
                    threshold: t.threshold,
                    reason: None,
                    actor: Some(actor.clone()),
                };
                t.push_event(trail);
            }
        }

        Event::BreakerThresholdSet { track, threshold, actor, at_ms } => {
            let t = state.breaker_mut(*track);
            let threshold = (*threshold).max(1);
            if t.threshold != threshold {
                t.threshold = threshold;
                let trail = BreakerEvent {
                    at_ms: *at_ms,
                    track: *track,
                    kind: BreakerEventKind::ThresholdChanged,
                    failure_count: t.failure_count,
                    threshold,
                    reason: None,
                    actor: Some(actor.clone()),
                };
                t.push_event(trail);
            }
        }

        _ => {}
    }
}
