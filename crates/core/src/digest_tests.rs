// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use proptest::prelude::*;
use yare::parameterized;

const GOOD: &str = "sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef";

#[parameterized(
    empty = { "" },
    prefix_only = { "sha256:" },
    no_prefix = { "0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef" },
    wrong_algorithm = { "sha512:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef" },
    uppercase_hex = { "sha256:0123456789ABCDEF0123456789abcdef0123456789abcdef0123456789abcdef" },
    too_short = { "sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcde" },
    too_long = { "sha256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef0" },
    non_hex = { "sha256:g123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef" },
    uppercase_prefix = { "SHA256:0123456789abcdef0123456789abcdef0123456789abcdef0123456789abcdef" },
)]
fn rejects_malformed(input: &str) {
    assert!(!is_valid_digest(input));
    assert!(matches!(Digest::parse(input), Err(GuardError::Validation(_))));
}

#[test]
fn accepts_well_formed() {
    assert!(is_valid_digest(GOOD));
    let d = Digest::parse(GOOD).unwrap();
    assert_eq!(d.as_str(), GOOD);
    assert_eq!(d.hex().len(), 64);
    assert_eq!(d.short(), "sha256:0123456789ab");
}

#[test]
fn parse_trims_surrounding_whitespace() {
    let d = Digest::parse(&format!("  {GOOD}\n")).unwrap();
    assert_eq!(d.as_str(), GOOD);
}

#[test]
fn hashes_known_content() {
    // sha256("") is a well-known constant
    let d = Digest::of_bytes(b"");
    assert_eq!(
        d.as_str(),
        "sha256:e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
    );
}

#[test]
fn reader_and_bytes_agree() {
    let data = vec![7u8; 20_000];
    let from_reader = Digest::of_reader(std::io::Cursor::new(&data)).unwrap();
    assert_eq!(from_reader, Digest::of_bytes(&data));
}

#[test]
fn deserialize_rejects_malformed() {
    let err = serde_json::from_str::<Digest>("\"sha256:nope\"");
    assert!(err.is_err());
    let ok: Digest = serde_json::from_str(&format!("\"{GOOD}\"")).unwrap();
    assert_eq!(ok.as_str(), GOOD);
}

proptest! {
    #[test]
    fn any_lowercase_hex_of_right_length_is_valid(hex in "[0-9a-f]{64}") {
        let digest = format!("sha256:{hex}");
        prop_assert!(is_valid_digest(&digest));
    }

    #[test]
    fn validity_matches_pattern(s in "\\PC{0,80}") {
        let expected = s.len() == 71
            && s.starts_with("sha256:")
            && s[7..].chars().all(|c| c.is_ascii_digit() || ('a'..='f').contains(&c));
        prop_assert_eq!(is_valid_digest(&s), expected);
    }

    #[test]
    fn wrong_length_hex_is_invalid(hex in "[0-9a-f]{0,63}|[0-9a-f]{65,80}") {
        let digest = format!("sha256:{hex}");
        prop_assert!(!is_valid_digest(&digest));
    }
}
