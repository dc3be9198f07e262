// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use serial_test::serial;

fn force_color() {
    std::env::set_var("COLOR", "1");
    std::env::remove_var("NO_COLOR");
}

#[test]
#[serial]
fn styles_returns_styled_when_color_forced() {
    force_color();
    let debug = format!("{:?}", styles());
    assert_ne!(debug, format!("{:?}", clap::builder::styling::Styles::plain()));
}

#[test]
#[serial]
fn styles_returns_plain_when_no_color() {
    std::env::set_var("NO_COLOR", "1");
    std::env::remove_var("COLOR");
    let debug = format!("{:?}", styles());
    assert_eq!(debug, format!("{:?}", clap::builder::styling::Styles::plain()));
}

#[test]
#[serial]
fn helpers_produce_palette_codes_when_forced() {
    force_color();
    assert!(header("foo").contains("\x1b[38;5;74m"));
    assert!(good("closed").contains("\x1b[38;5;108m"));
    assert!(warn("stale").contains("\x1b[38;5;179m"));
    let open = bad("open");
    assert!(open.contains("\x1b[38;5;167m"));
    assert!(open.ends_with("\x1b[0m"));
}

#[test]
#[serial]
fn helpers_plain_when_no_color() {
    std::env::set_var("NO_COLOR", "1");
    std::env::remove_var("COLOR");
    assert_eq!(header("foo"), "foo");
    assert_eq!(muted("dim"), "dim");
    assert_eq!(bad("open"), "open");
}

#[test]
#[serial]
fn no_color_overrides_force() {
    std::env::set_var("NO_COLOR", "1");
    std::env::set_var("COLOR", "1");
    assert!(!should_colorize());
    std::env::remove_var("NO_COLOR");
    std::env::remove_var("COLOR");
}
