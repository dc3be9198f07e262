// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Content digests: `sha256:` followed by 64 lowercase hex characters.

use crate::error::GuardError;
use serde::{Deserialize, Serialize};
use sha2::{Digest as _, Sha256};
use std::fmt;
use std::io::{self, Read};
use std::str::FromStr;

pub const DIGEST_PREFIX: &str = "sha256:";
pub const DIGEST_HEX_LEN: usize = 64;

/// True iff `s` is `sha256:` followed by exactly 64 lowercase hex characters.
pub fn is_valid_digest(s: &str) -> bool {
    s.strip_prefix(DIGEST_PREFIX).is_some_and(|hex| {
        hex.len() == DIGEST_HEX_LEN && hex.bytes().all(|b| matches!(b, b'0'..=b'9' | b'a'..=b'f'))
    })
}

/// A format-validated content digest.
///
/// Deserialization re-validates, so a `Digest` read back from the journal
/// or the wire is always well-formed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Digest(String);

impl Digest {
    pub fn parse(s: &str) -> Result<Self, GuardError> {
        let trimmed = s.trim();
        if is_valid_digest(trimmed) {
            Ok(Self(trimmed.to_string()))
        } else {
            Err(GuardError::Validation(format!(
                "invalid digest '{trimmed}': expected {DIGEST_PREFIX} followed by {DIGEST_HEX_LEN} lowercase hex characters"
            )))
        }
    }

    /// Digest of an in-memory byte slice
    pub fn of_bytes(bytes: &[u8]) -> Self {
        Self(format!("{DIGEST_PREFIX}{:x}", Sha256::digest(bytes)))
    }

    /// Digest of everything readable from `reader`, streamed in chunks
    pub fn of_reader(mut reader: impl Read) -> io::Result<Self> {
        let mut hasher = Sha256::new();
        let mut buf = [0u8; 8192];
        loop {
            let n = reader.read(&mut buf)?;
            if n == 0 {
                break;
            }
            hasher.update(&buf[..n]);
        }
        Ok(Self(format!("{DIGEST_PREFIX}{:x}", hasher.finalize())))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The hex part, without the algorithm prefix
    pub fn hex(&self) -> &str {
        &self.0[DIGEST_PREFIX.len()..]
    }

    /// Abbreviated form for log lines: `sha256:0123456789ab`
    pub fn short(&self) -> &str {
        &self.0[..DIGEST_PREFIX.len() + 12]
    }
}

impl TryFrom<String> for Digest {
    type Error = GuardError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<Digest> for String {
    fn from(d: Digest) -> Self {
        d.0
    }
}

impl FromStr for Digest {
    type Err = GuardError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl std::borrow::Borrow<str> for Digest {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl AsRef<str> for Digest {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

#[cfg(test)]
#[path = "digest_tests.rs"]
mod tests;
