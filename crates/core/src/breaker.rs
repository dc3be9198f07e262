// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Dual-track circuit breaker state.
//!
//! The recovery and deployment tracks are fully independent: a string of
//! failed recoveries never blocks ordinary deployments and vice versa.

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const RECOVERY_THRESHOLD_DEFAULT: u32 = 3;
pub const DEPLOYMENT_THRESHOLD_DEFAULT: u32 = 5;

/// Most recent trail events kept per track
pub const EVENT_TRAIL_LIMIT: usize = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Track {
    Recovery,
    Deployment,
}

crate::simple_display! {
    Track {
        Recovery => "recovery",
        Deployment => "deployment",
    }
}

crate::parse_enum! {
    Track, "breaker track" {
        "recovery" => Recovery,
        "deployment" => Deployment,
    }
}

impl Track {
    pub const ALL: [Track; 2] = [Track::Recovery, Track::Deployment];

    /// Resolve an optional track filter into the tracks it covers
    pub fn selected(track: Option<Track>) -> Vec<Track> {
        match track {
            Some(t) => vec![t],
            None => Track::ALL.to_vec(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
}

crate::simple_display! {
    BreakerState {
        Closed => "closed",
        Open => "open",
    }
}

/// Who opened a track
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OpenedBy {
    /// Failure count reached the threshold
    Auto,
    /// An operator ran `open`
    Manual,
}

crate::simple_display! {
    OpenedBy {
        Auto => "auto",
        Manual => "manual",
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerEventKind {
    ThresholdBreached,
    Opened,
    Closed,
    ThresholdChanged,
}

crate::simple_display! {
    BreakerEventKind {
        ThresholdBreached => "threshold_breached",
        Opened => "opened",
        Closed => "closed",
        ThresholdChanged => "threshold_changed",
    }
}

/// One entry of the breaker-specific audit trail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerEvent {
    pub at_ms: u64,
    pub track: Track,
    pub kind: BreakerEventKind,
    pub failure_count: u32,
    pub threshold: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub actor: Option<String>,
}

/// Full persisted state of one breaker track.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerTrack {
    pub track: Track,
    pub state: BreakerState,
    pub failure_count: u32,
    pub threshold: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_failure_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opened_by: Option<OpenedBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub open_reason: Option<String>,
    #[serde(default)]
    pub events: VecDeque<BreakerEvent>,
}

impl BreakerTrack {
    pub fn new(track: Track, threshold: u32) -> Self {
        Self {
            track,
            state: BreakerState::Closed,
            failure_count: 0,
            threshold: threshold.max(1),
            last_failure_at_ms: None,
            last_failure_reason: None,
            opened_at_ms: None,
            opened_by: None,
            open_reason: None,
            events: VecDeque::new(),
        }
    }

    pub fn is_open(&self) -> bool {
        self.state == BreakerState::Open
    }

    pub fn over_threshold(&self) -> bool {
        self.failure_count >= self.threshold
    }

    /// Append to the trail, evicting the oldest beyond [`EVENT_TRAIL_LIMIT`]
    pub fn push_event(&mut self, event: BreakerEvent) {
        self.events.push_back(event);
        while self.events.len() > EVENT_TRAIL_LIMIT {
            self.events.pop_front();
        }
    }

    pub fn status(&self) -> BreakerStatus {
        BreakerStatus {
            track: self.track,
            state: self.state,
            failure_count: self.failure_count,
            threshold: self.threshold,
            last_failure_at_ms: self.last_failure_at_ms,
            opened_at_ms: self.opened_at_ms,
            opened_by: self.opened_by,
            open_reason: self.open_reason.clone(),
        }
    }
}

/// Read-only view of a track, as returned by `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakerStatus {
    pub track: Track,
    pub state: BreakerState,
    pub failure_count: u32,
    pub threshold: u32,
    #[serde(default)]
    pub last_failure_at_ms: Option<u64>,
    #[serde(default)]
    pub opened_at_ms: Option<u64>,
    #[serde(default)]
    pub opened_by: Option<OpenedBy>,
    #[serde(default)]
    pub open_reason: Option<String>,
}

/// Outcome of a threshold evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "result", rename_all = "snake_case")]
pub enum ThresholdCheck {
    WithinLimits,
    /// Over threshold. `newly_opened` is false when the track was already open.
    Opened { newly_opened: bool },
}

impl ThresholdCheck {
    pub fn is_open(self) -> bool {
        matches!(self, ThresholdCheck::Opened { .. })
    }
}

#[cfg(test)]
#[path = "breaker_tests.rs"]
mod tests;
