// src/config.rs

use std::sync::Arc;
use std::time::Duration;

use crate::metrics::{Metrics, NoopMetrics};

/// Coordinator tuning knobs.
/// - `new()`/`Default` gives sane values, `with_*` overrides them.
#[derive(Clone)]
pub struct CoordinatorConfig {
    /// TTL applied while the slot holds a lease token. Default: 10 seconds.
    pub lock_ttl: Duration,

    /// TTL applied while the slot holds a completed record. Default: 24 hours.
    pub keep_ttl: Duration,

    /// Fraction of `lock_ttl` between lease-refresh ticks. Default: 0.7.
    pub refresh_ratio: f64,

    /// How often the local key-mutex registry sweeps idle entries. Default: 5 minutes.
    pub mutex_sweep_interval: Duration,

    /// Idle time before a zero-refcount mutex entry is evicted. Default: 10 minutes.
    pub mutex_idle_threshold: Duration,

    pub(crate) metrics: Arc<dyn Metrics>,
}

impl CoordinatorConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_lock_ttl(mut self, ttl: Duration) -> Self {
        self.lock_ttl = ttl;
        self
    }

    pub fn with_keep_ttl(mut self, ttl: Duration) -> Self {
        self.keep_ttl = ttl;
        self
    }

    pub fn with_refresh_ratio(mut self, ratio: f64) -> Self {
        self.refresh_ratio = ratio;
        self
    }

    pub fn with_mutex_sweep_interval(mut self, interval: Duration) -> Self {
        self.mutex_sweep_interval = interval;
        self
    }

    pub fn with_mutex_idle_threshold(mut self, threshold: Duration) -> Self {
        self.mutex_idle_threshold = threshold;
        self
    }

    pub fn with_metrics(mut self, metrics: Arc<dyn Metrics>) -> Self {
        self.metrics = metrics;
        self
    }

    /// Duration between lease-refresh ticks: `lock_ttl * refresh_ratio`.
    pub fn refresh_interval(&self) -> Duration {
        self.lock_ttl.mul_f64(self.refresh_ratio)
    }
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        CoordinatorConfig {
            lock_ttl: Duration::from_secs(10),
            keep_ttl: Duration::from_secs(24 * 60 * 60),
            refresh_ratio: 0.7,
            mutex_sweep_interval: Duration::from_secs(5 * 60),
            mutex_idle_threshold: Duration::from_secs(10 * 60),
            metrics: Arc::new(NoopMetrics),
        }
    }
}
