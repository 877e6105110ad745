// src/lib.rs

//! # Distributed idempotency coordinator, backed by Redis
//!
//! Guarantees a side-effectful operation runs at most once per
//! idempotency key across a fleet of processes sharing a Redis-class
//! store. Concurrent callers with the same key and payload get the
//! cached result; callers with the same key but a different payload
//! are rejected.
//!
//! - [`Coordinator::do_idempotent`]: the untyped, byte-oriented core.
//! - [`TypedCoordinator`]: a typed convenience layer over it.

mod config;
mod conn;
mod coordinator;
mod error;
mod fingerprint;
mod keymutex;
mod lease;
mod metrics;
mod record;
mod scripts;
mod token;
mod typed;

pub use config::CoordinatorConfig;
pub use conn::{connect, RedisConnConfig};
pub use coordinator::{Coordinator, CoordinatorShutdown};
pub use error::IdemError;
pub use fingerprint::Fingerprint;
pub use metrics::{Metrics, NoopMetrics, Outcome};
pub use record::Record;
pub use token::LeaseToken;
pub use typed::TypedCoordinator;

pub use tokio_util::sync::CancellationToken;
