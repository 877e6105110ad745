// src/metrics.rs

/// Classified outcome of a single coordinator attempt, used to drive
/// the pluggable metrics hook.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// Result served from an already-committed record.
    Shared,
    /// This call executed the work function and committed the record.
    Written,
    /// A concurrent caller holds the lease; in-flight error returned.
    InFlight,
    /// Stored record's fingerprint did not match the payload.
    Mismatch,
    /// A CAS lost the race against another writer.
    LeaseLost,
    /// The work function itself returned an error.
    WorkFailed,
}

/// Pluggable counter interface. Installing a backend (Prometheus,
/// StatsD, whatever) is the caller's concern; this crate ships only
/// the trait and a no-op default.
#[cfg_attr(test, mockall::automock)]
pub trait Metrics: Send + Sync {
    fn incr(&self, outcome: Outcome);
}

/// Default `Metrics` implementation: does nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopMetrics;

impl Metrics for NoopMetrics {
    fn incr(&self, _outcome: Outcome) {}
}
