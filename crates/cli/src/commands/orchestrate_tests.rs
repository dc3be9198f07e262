// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use dg_core::HealthRecord;
use serial_test::serial;

#[test]
#[serial]
fn health_lists_records_and_streak() {
    std::env::set_var("NO_COLOR", "1");
    let mut history = HealthHistory::new(5);
    for status in [HealthStatus::Healthy, HealthStatus::Degraded, HealthStatus::Unhealthy] {
        history.record(HealthRecord { at_ms: 0, status, details: None });
    }
    history.record(HealthRecord {
        at_ms: 0,
        status: HealthStatus::Degraded,
        details: Some("p95 latency 2.1s".to_string()),
    });

    let mut out = Vec::new();
    write_health(&history, &mut out);
    let text = String::from_utf8(out).unwrap();
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[3].ends_with("degraded  p95 latency 2.1s"), "{}", lines[3]);
    assert_eq!(lines[4], "3 consecutive non-healthy (keeping last 5)");
}

#[test]
fn empty_health_history() {
    let mut out = Vec::new();
    write_health(&HealthHistory::new(10), &mut out);
    assert_eq!(String::from_utf8(out).unwrap(), "No health checks recorded.\n");
}
