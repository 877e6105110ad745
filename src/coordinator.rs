// src/coordinator.rs

use std::future::Future;
use std::sync::Arc;

use colored::*;
use redis::aio::MultiplexedConnection;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::CoordinatorConfig;
use crate::error::IdemError;
use crate::fingerprint::Fingerprint;
use crate::keymutex::KeyMutexRegistry;
use crate::lease::{self, LeaseOutcome};
use crate::metrics::Outcome;
use crate::record::{Record, RemoteSlot};
use crate::scripts;
use crate::token::LeaseToken;

/// Orchestrates the at-most-once coordination algorithm over a single
/// Redis-class remote store.
/// Owns: redis connection, config, local per-key mutex registry.
#[derive(Clone)]
pub struct Coordinator {
    conn: MultiplexedConnection,
    config: CoordinatorConfig,
    mutexes: Arc<KeyMutexRegistry>,
}

impl Coordinator {
    /// Build a coordinator over an existing connection.
    /// Spawns the local-mutex sweeper and returns a shutdown handle for it.
    pub fn new(conn: MultiplexedConnection, config: CoordinatorConfig) -> (Self, CoordinatorShutdown) {
        let mutexes = KeyMutexRegistry::new();
        let sweep_token = CancellationToken::new();
        let sweep_handle = mutexes.spawn_sweeper(
            config.mutex_sweep_interval,
            config.mutex_idle_threshold,
            sweep_token.clone(),
        );
        (
            Coordinator {
                conn,
                config,
                mutexes,
            },
            CoordinatorShutdown {
                token: sweep_token,
                sweep_handle,
            },
        )
    }

    /// Run `work` at most once for `key`. Returns `(result, shared)`:
    /// `shared` is true if the result came from an existing record.
    /// `work` gets a cancellation token derived from `ctx`.
    pub async fn do_idempotent<F, Fut>(
        &self,
        ctx: CancellationToken,
        key: &str,
        payload: &[u8],
        work: F,
    ) -> Result<(Vec<u8>, bool), IdemError>
    where
        F: FnOnce(CancellationToken, Vec<u8>) -> Fut,
        Fut: Future<Output = Result<Vec<u8>, IdemError>> + Send,
    {
        // Step 1: reject empty key without touching the remote store.
        if key.is_empty() {
            return Err(IdemError::EmptyKey);
        }

        // Step 2: acquire the local mutex for this key; released on
        // every exit path via the guard's Drop impl.
        let _guard = self.mutexes.acquire(key).await;

        let fp = Fingerprint::of(payload);
        let lock_ttl_ms = self.config.lock_ttl.as_millis() as u64;
        let keep_ttl_ms = self.config.keep_ttl.as_millis() as u64;

        // Step 3: mint a fresh lease token.
        let token = LeaseToken::new();

        // Step 4: load_or_store(key, token, lockTTL).
        let mut conn = self.conn.clone();
        let loaded = scripts::load_or_store(&mut conn, key, token.as_str(), lock_ttl_ms).await?;

        if loaded.loaded {
            // Step 5: someone else's value is already there.
            return self.handle_existing(loaded.value.as_deref(), &fp);
        }

        // Step 6: we are the writer.
        tracing::debug!(key, token = %token, "acquired lease, running work function");

        let refresh_conn = self.conn.clone();
        let refresh_interval = self.config.refresh_interval();
        let payload_owned = payload.to_vec();

        let outcome = lease::run_with_lease(
            refresh_conn,
            key,
            &token,
            lock_ttl_ms,
            refresh_interval,
            ctx,
            move |work_ctx| work(work_ctx, payload_owned),
        )
        .await;

        match outcome {
            LeaseOutcome::Cancelled => {
                lease::spawn_detached_cleanup(self.conn.clone(), key.to_string(), token);
                self.config.metrics.incr(Outcome::WorkFailed);
                Err(IdemError::Cancelled)
            }
            LeaseOutcome::Finished(Err(err)) => {
                lease::spawn_detached_cleanup(self.conn.clone(), key.to_string(), token);
                self.config.metrics.incr(Outcome::WorkFailed);
                Err(err)
            }
            LeaseOutcome::Finished(Ok(result)) => {
                self.commit(key, &token, &fp, result, lock_ttl_ms, keep_ttl_ms)
                    .await
            }
        }
    }

    fn handle_existing(
        &self,
        value: Option<&str>,
        fp: &Fingerprint,
    ) -> Result<(Vec<u8>, bool), IdemError> {
        match RemoteSlot::parse(value)? {
            RemoteSlot::Token(_) => {
                self.config.metrics.incr(Outcome::InFlight);
                Err(IdemError::InFlight)
            }
            RemoteSlot::Record(record) => {
                if !record.fingerprint_matches(fp) {
                    self.config.metrics.incr(Outcome::Mismatch);
                    return Err(IdemError::Mismatch);
                }
                let bytes = record.decode_response()?;
                self.config.metrics.incr(Outcome::Shared);
                Ok((bytes, true))
            }
            RemoteSlot::Absent => {
                // load_or_store reported "loaded" but the value parsed to nothing.
                self.config.metrics.incr(Outcome::WorkFailed);
                Err(IdemError::Malformed("empty value on loaded slot".to_string()))
            }
        }
    }

    async fn commit(
        &self,
        key: &str,
        token: &LeaseToken,
        fp: &Fingerprint,
        result: Vec<u8>,
        lock_ttl_ms: u64,
        keep_ttl_ms: u64,
    ) -> Result<(Vec<u8>, bool), IdemError> {
        let mut conn = self.conn.clone();

        // Defend against a boundary-case expiry between the last
        // refresh tick and commit.
        if !scripts::cas_extend(&mut conn, key, token.as_str(), lock_ttl_ms).await? {
            self.config.metrics.incr(Outcome::LeaseLost);
            return Err(IdemError::LeaseInvalid);
        }

        let record = Record::new(fp, &result);
        let committed = scripts::cas_swap(&mut conn, key, token.as_str(), &record.encode(), keep_ttl_ms).await?;

        if !committed {
            self.config.metrics.incr(Outcome::LeaseLost);
            return Err(IdemError::LeaseInvalid);
        }

        self.config.metrics.incr(Outcome::Written);
        Ok((result, false))
    }
}

/// Handle for stopping the background local-mutex sweeper.
/// Holds its `JoinHandle` so shutdown can wait for it to actually exit.
pub struct CoordinatorShutdown {
    token: CancellationToken,
    sweep_handle: JoinHandle<()>,
}

impl CoordinatorShutdown {
    /// Signal the sweeper to stop and wait for it to actually exit.
    pub async fn shutdown(self) {
        println!("{} coordinator sweeper", "Shutdown".red().bold());
        self.token.cancel();
        let _ = self.sweep_handle.await;
        println!("{} coordinator sweeper shut down.", "Done".green().bold());
    }
}
