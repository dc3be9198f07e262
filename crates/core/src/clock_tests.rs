// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn system_clock_is_past_2020() {
    assert!(SystemClock.epoch_ms() > 1_577_836_800_000);
}

#[test]
fn fake_clock_advances_by_duration() {
    let clock = FakeClock::at(5_000);
    clock.advance(Duration::from_secs(90));
    assert_eq!(clock.epoch_ms(), 95_000);
}

#[test]
fn fake_clock_clones_share_time() {
    let a = FakeClock::new();
    let b = a.clone();
    b.set_epoch_ms(42);
    assert_eq!(a.epoch_ms(), 42);
}
