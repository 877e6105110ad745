// src/error.rs

use std::error::Error as StdError;

/// Error taxonomy surfaced at the coordinator boundary.
/// Not retried internally; retry policy is the caller's.
#[derive(Debug, thiserror::Error)]
pub enum IdemError {
    #[error("idempotency key must not be empty")]
    EmptyKey,

    #[error("request is already in flight for this key")]
    InFlight,

    #[error("request payload does not match the original request stored for this key")]
    Mismatch,

    #[error("lease lost or lock conflict while committing the result")]
    LeaseInvalid,

    #[error("work function failed: {0}")]
    Work(#[source] Box<dyn StdError + Send + Sync>),

    #[error("stored value is neither a lease token nor a valid record: {0}")]
    Malformed(String),

    #[error("failed to decode stored record: {0}")]
    Decode(String),

    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("operation was cancelled")]
    Cancelled,
}

impl IdemError {
    /// Wrap an arbitrary work-function error.
    pub fn work<E: StdError + Send + Sync + 'static>(err: E) -> Self {
        IdemError::Work(Box::new(err))
    }
}
