// src/lease.rs

use colored::*;
use redis::aio::MultiplexedConnection;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::IdemError;
use crate::scripts;
use crate::token::LeaseToken;

/// Outcome of racing the work function against lease refresh and
/// caller cancellation.
pub enum LeaseOutcome<T> {
    /// The work function completed before the caller's context was cancelled.
    Finished(Result<T, IdemError>),
    /// The caller's context was cancelled before the work function completed.
    Cancelled,
}

/// Run `work` to completion while a background ticker extends the
/// lease on `key` every `refresh_interval`, racing the whole thing
/// against `caller_token` being cancelled.
/// A mismatch on a refresh tick means the lease is already lost; the
/// loop stops extending and lets the commit attempt surface the error.
pub async fn run_with_lease<F, Fut, T>(
    mut refresh_conn: MultiplexedConnection,
    key: &str,
    token: &LeaseToken,
    lock_ttl_ms: u64,
    refresh_interval: Duration,
    caller_token: CancellationToken,
    work: F,
) -> LeaseOutcome<T>
where
    F: FnOnce(CancellationToken) -> Fut,
    Fut: Future<Output = Result<T, IdemError>> + Send,
{
    let refresh_cancel = CancellationToken::new();
    let refresh_key = key.to_string();
    let refresh_token = token.clone();
    let refresh_guard = refresh_cancel.clone();

    let refresh_handle = tokio::spawn(async move {
        loop {
            tokio::select! {
                _ = tokio::time::sleep(refresh_interval) => {
                    match scripts::cas_extend(&mut refresh_conn, &refresh_key, refresh_token.as_str(), lock_ttl_ms).await {
                        Ok(true) => {
                            tracing::debug!(key = %refresh_key, "lease extended");
                        }
                        Ok(false) => {
                            tracing::warn!(key = %refresh_key, "lease extend mismatch, lease lost");
                            break;
                        }
                        Err(err) => {
                            tracing::warn!(key = %refresh_key, error = %err, "lease extend failed");
                        }
                    }
                }
                _ = refresh_guard.cancelled() => {
                    break;
                }
            }
        }
    });

    let work_fut = work(caller_token.clone());
    let outcome = tokio::select! {
        res = work_fut => LeaseOutcome::Finished(res),
        _ = caller_token.cancelled() => LeaseOutcome::Cancelled,
    };

    refresh_cancel.cancel();
    let _ = refresh_handle.await;

    outcome
}

/// Delete the lease token under `key` on a detached task, so cleanup
/// still reaches the remote store even after the caller has given up.
pub fn spawn_detached_cleanup(mut conn: MultiplexedConnection, key: String, token: LeaseToken) {
    tokio::spawn(async move {
        match scripts::cas_delete(&mut conn, &key, token.as_str()).await {
            Ok(true) => {
                tracing::debug!(key = %key, "lease released");
            }
            Ok(false) => {
                tracing::debug!(key = %key, "lease cleanup no-op (already replaced)");
            }
            Err(err) => {
                println!(
                    "{} lease cleanup for {} failed: {}",
                    "Error".red().bold(),
                    key,
                    err
                );
            }
        }
    });
}
