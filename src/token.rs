// src/token.rs

use std::fmt;
use std::str::FromStr;
use ulid::Ulid;

/// Length of a ULID's canonical Crockford-base32 text form.
pub const TOKEN_LEN: usize = 26;

/// A fresh, per-attempt identifier minted from a time-ordered 128-bit
/// random value (a ULID), textually encoded.
/// Always exactly `TOKEN_LEN` Crockford-base32 characters, distinct in
/// shape from a record (see `record.rs`, which always starts with `{`).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LeaseToken(String);

impl LeaseToken {
    /// Mint a fresh token unique to this coordinator attempt.
    pub fn new() -> Self {
        LeaseToken(Ulid::new().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if `raw` has the shape of a lease token.
    pub fn looks_like_token(raw: &str) -> bool {
        raw.len() == TOKEN_LEN && raw.bytes().all(|b| is_crockford_base32(b))
    }
}

fn is_crockford_base32(b: u8) -> bool {
    matches!(b, b'0'..=b'9' | b'A'..=b'Z' | b'a'..=b'z')
}

impl Default for LeaseToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for LeaseToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for LeaseToken {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if Self::looks_like_token(s) {
            Ok(LeaseToken(s.to_string()))
        } else {
            Err(())
        }
    }
}
