// src/keymutex.rs

use colored::*;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex as StdMutex};
use std::time::{Duration, Instant};
use tokio::sync::Mutex as AsyncMutex;
use tokio_util::sync::CancellationToken;

/// One entry in the registry: the per-key mutex plus eviction bookkeeping.
struct Entry {
    lock: Arc<AsyncMutex<()>>,
    refs: AtomicUsize,
    last_use: StdMutex<Instant>,
}

/// Process-local mutex keyed by idempotency key.
/// Serializes same-key callers before they race on the remote store.
/// Ref-counted and swept on an idle interval so distinct keys don't leak memory.
pub struct KeyMutexRegistry {
    entries: StdMutex<HashMap<String, Arc<Entry>>>,
}

impl KeyMutexRegistry {
    pub fn new() -> Arc<Self> {
        Arc::new(KeyMutexRegistry {
            entries: StdMutex::new(HashMap::new()),
        })
    }

    /// Acquire the mutex for `key`, blocking until it is free.
    /// The returned guard releases the lock and decrements the refcount on drop.
    pub async fn acquire(self: &Arc<Self>, key: &str) -> KeyGuard {
        let entry = {
            let mut entries = self.entries.lock().unwrap();
            let entry = entries
                .entry(key.to_string())
                .or_insert_with(|| {
                    Arc::new(Entry {
                        lock: Arc::new(AsyncMutex::new(())),
                        refs: AtomicUsize::new(0),
                        last_use: StdMutex::new(Instant::now()),
                    })
                })
                .clone();
            entry.refs.fetch_add(1, Ordering::SeqCst);
            *entry.last_use.lock().unwrap() = Instant::now();
            entry
        };

        let permit = Arc::clone(&entry.lock).lock_owned().await;

        KeyGuard {
            entry,
            _permit: permit,
        }
    }

    /// Spawn the background sweep that evicts idle, zero-refcount entries.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        sweep_interval: Duration,
        idle_threshold: Duration,
        token: CancellationToken,
    ) -> tokio::task::JoinHandle<()> {
        let registry = Arc::clone(self);
        tokio::spawn(async move {
            println!("{} local key-mutex sweeper", "Start".green().bold());
            loop {
                tokio::select! {
                    _ = tokio::time::sleep(sweep_interval) => {
                        registry.sweep(idle_threshold);
                    }
                    _ = token.cancelled() => {
                        println!("{} key-mutex sweeper shutting down...", "Shutdown".red().bold());
                        break;
                    }
                }
            }
        })
    }

    fn sweep(&self, idle_threshold: Duration) {
        let mut entries = self.entries.lock().unwrap();
        let now = Instant::now();
        entries.retain(|_, entry| {
            let idle = now.duration_since(*entry.last_use.lock().unwrap());
            // Never remove entries with non-zero refcount.
            entry.refs.load(Ordering::SeqCst) != 0 || idle < idle_threshold
        });
    }

    #[cfg(test)]
    fn len(&self) -> usize {
        self.entries.lock().unwrap().len()
    }
}

/// RAII handle returned by `acquire`. Dropping it releases the local
/// mutex and decrements the entry's refcount.
pub struct KeyGuard {
    entry: Arc<Entry>,
    _permit: tokio::sync::OwnedMutexGuard<()>,
}

impl Drop for KeyGuard {
    fn drop(&mut self) {
        self.entry.refs.fetch_sub(1, Ordering::SeqCst);
        *self.entry.last_use.lock().unwrap() = Instant::now();
    }
}
