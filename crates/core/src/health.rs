// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Bounded health history with a consecutive-degraded counter

use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub const HEALTH_HISTORY_LIMIT_DEFAULT: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

crate::simple_display! {
    HealthStatus {
        Healthy => "healthy",
        Degraded => "degraded",
        Unhealthy => "unhealthy",
    }
}

crate::parse_enum! {
    HealthStatus, "health status" {
        "healthy" => Healthy,
        "degraded" => Degraded,
        "unhealthy" => Unhealthy,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthRecord {
    pub at_ms: u64,
    pub status: HealthStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<String>,
}

/// The N most recent health records, oldest first.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HealthHistory {
    records: VecDeque<HealthRecord>,
    limit: usize,
    consecutive_degraded: u32,
}

impl Default for HealthHistory {
    fn default() -> Self {
        Self::new(HEALTH_HISTORY_LIMIT_DEFAULT)
    }
}

impl HealthHistory {
    pub fn new(limit: usize) -> Self {
        Self { records: VecDeque::new(), limit: limit.max(1), consecutive_degraded: 0 }
    }

    /// Append a record, evicting the oldest beyond the limit.
    ///
    /// Returns the updated consecutive-degraded count: incremented for
    /// degraded or unhealthy, reset to zero for healthy.
    pub fn record(&mut self, record: HealthRecord) -> u32 {
        self.consecutive_degraded = match record.status {
            HealthStatus::Healthy => 0,
            HealthStatus::Degraded | HealthStatus::Unhealthy => {
                self.consecutive_degraded.saturating_add(1)
            }
        };
        self.records.push_back(record);
        self.evict();
        self.consecutive_degraded
    }

    /// Count that would result from recording `status` next
    pub fn next_consecutive(&self, status: HealthStatus) -> u32 {
        match status {
            HealthStatus::Healthy => 0,
            _ => self.consecutive_degraded.saturating_add(1),
        }
    }

    pub fn consecutive_degraded(&self) -> u32 {
        self.consecutive_degraded
    }

    pub fn records(&self) -> impl Iterator<Item = &HealthRecord> {
        self.records.iter()
    }

    pub fn latest(&self) -> Option<&HealthRecord> {
        self.records.back()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Change the bound, evicting immediately if the history is now too long
    pub fn set_limit(&mut self, limit: usize) {
        self.limit = limit.max(1);
        self.evict();
    }

    fn evict(&mut self) {
        while self.records.len() > self.limit {
            self.records.pop_front();
        }
    }
}

#[cfg(test)]
#[path = "health_tests.rs"]
mod tests;
