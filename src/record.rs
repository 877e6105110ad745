// src/record.rs

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde::{Deserialize, Serialize};

use crate::error::IdemError;
use crate::fingerprint::Fingerprint;
use crate::token::LeaseToken;

/// Completed-record wire shape.
/// - `request`: payload fingerprint
/// - `response`: base64 of the result bytes (empty means zero-length result)
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Record {
    pub request: String,
    pub response: String,
}

impl Record {
    /// Build a record from a fingerprint and the raw result bytes.
    pub fn new(fingerprint: &Fingerprint, result: &[u8]) -> Self {
        Record {
            request: fingerprint.as_str().to_string(),
            response: STANDARD.encode(result),
        }
    }

    /// Byte-exact comparison against a fingerprint; no normalization.
    pub fn fingerprint_matches(&self, fingerprint: &Fingerprint) -> bool {
        &self.stored_fingerprint() == fingerprint
    }

    /// Reconstruct the typed `Fingerprint` stored in `request`.
    pub fn stored_fingerprint(&self) -> Fingerprint {
        Fingerprint::from_encoded(self.request.clone())
    }

    /// Decode the base64 response field into result bytes.
    /// Empty string decodes to zero-length result; anything else malformed fails loudly.
    pub fn decode_response(&self) -> Result<Vec<u8>, IdemError> {
        if self.response.is_empty() {
            return Ok(Vec::new());
        }
        STANDARD
            .decode(&self.response)
            .map_err(|e| IdemError::Decode(format!("invalid base64 response: {e}")))
    }

    /// Serialize to the text form stored in the remote slot.
    /// Always starts with `{`, which disambiguates it from a lease token.
    pub fn encode(&self) -> String {
        serde_json::to_string(self).expect("Record serialization is infallible")
    }

    /// Parse the text form. Fails loudly on malformed input.
    pub fn parse(raw: &str) -> Result<Self, IdemError> {
        serde_json::from_str(raw).map_err(|e| IdemError::Decode(format!("invalid record JSON: {e}")))
    }
}

/// What currently occupies a key's single slot in the remote store.
#[derive(Debug, Clone)]
pub enum RemoteSlot {
    Absent,
    Token(LeaseToken),
    Record(Record),
}

impl RemoteSlot {
    /// Parse a raw value previously returned by `load_or_store`. `None`
    /// means the key was absent (the script's "stored" branch).
    pub fn parse(raw: Option<&str>) -> Result<Self, IdemError> {
        let raw = match raw {
            None => return Ok(RemoteSlot::Absent),
            Some(r) => r,
        };

        if LeaseToken::looks_like_token(raw) {
            return Ok(RemoteSlot::Token(
                raw.parse().map_err(|_| IdemError::Malformed(raw.to_string()))?,
            ));
        }

        if raw.starts_with('{') {
            return Record::parse(raw).map(RemoteSlot::Record);
        }

        Err(IdemError::Malformed(raw.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_round_trips() {
        let fp = Fingerprint::of(b"hello");
        let record = Record::new(&fp, b"world");
        let encoded = record.encode();
        let decoded = Record::parse(&encoded).unwrap();
        assert_eq!(decoded, record);
        assert_eq!(decoded.decode_response().unwrap(), b"world");
    }

    #[test]
    fn empty_response_decodes_to_empty_bytes() {
        let record = Record {
            request: "fp".to_string(),
            response: String::new(),
        };
        assert_eq!(record.decode_response().unwrap(), Vec::<u8>::new());
    }

    #[test]
    fn malformed_response_fails_loudly() {
        let record = Record {
            request: "fp".to_string(),
            response: "not valid base64!!".to_string(),
        };
        assert!(record.decode_response().is_err());
    }

    #[test]
    fn slot_parses_absent() {
        assert!(matches!(RemoteSlot::parse(None).unwrap(), RemoteSlot::Absent));
    }

    #[test]
    fn slot_parses_token() {
        let token = LeaseToken::new();
        let slot = RemoteSlot::parse(Some(token.as_str())).unwrap();
        assert!(matches!(slot, RemoteSlot::Token(t) if t == token));
    }

    #[test]
    fn slot_parses_record() {
        let fp = Fingerprint::of(b"p");
        let record = Record::new(&fp, b"r");
        let slot = RemoteSlot::parse(Some(&record.encode())).unwrap();
        match slot {
            RemoteSlot::Record(r) => assert_eq!(r, record),
            _ => panic!("expected record"),
        }
    }

    #[test]
    fn slot_rejects_garbage() {
        assert!(RemoteSlot::parse(Some("not a token or a record")).is_err());
    }

    #[test]
    fn fingerprint_matches_reconstructs_typed_fingerprint_from_the_wire_string() {
        let fp = Fingerprint::of(b"payload");
        let record = Record::new(&fp, b"result");
        assert_eq!(record.stored_fingerprint(), fp);
        assert!(record.fingerprint_matches(&fp));

        let other = Fingerprint::of(b"different payload");
        assert!(!record.fingerprint_matches(&other));
    }
}
