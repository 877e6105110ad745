// src/fingerprint.rs

use base64::{engine::general_purpose::STANDARD, Engine as _};
use sha2::{Digest, Sha256};
use std::fmt;

/// Textual identity of a payload: `base64_std(SHA-256(payload))`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Fingerprint(String);

impl Fingerprint {
    /// Compute the fingerprint of the given payload bytes.
    pub fn of(payload: &[u8]) -> Self {
        let digest = Sha256::digest(payload);
        Fingerprint(STANDARD.encode(digest))
    }

    /// Borrow the underlying textual encoding.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Wrap an already-encoded fingerprint string (used when decoding a
    /// stored record).
    pub fn from_encoded(s: impl Into<String>) -> Self {
        Fingerprint(s.into())
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deterministic() {
        let a = Fingerprint::of(b"hello");
        let b = Fingerprint::of(b"hello");
        assert_eq!(a, b);
    }

    #[test]
    fn distinguishes_distinct_payloads() {
        let a = Fingerprint::of(b"hello");
        let b = Fingerprint::of(b"goodbye");
        assert_ne!(a, b);
    }

    #[test]
    fn encodes_as_standard_base64() {
        let fp = Fingerprint::of(b"hello");
        // SHA-256("hello") is a fixed, well-known digest.
        assert_eq!(fp.as_str(), "LPJNul+wow4m6DsqxbninhsWHlwfp0JecwQzYpOLmCQ=");
    }
}
