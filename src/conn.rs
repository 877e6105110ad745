// src/conn.rs

use redis::aio::MultiplexedConnection;
use redis::Client;
use std::time::Duration;

use crate::error::IdemError;

/// Redis connection config.
/// - `redis_url`: Redis server URL
#[derive(Debug, Clone)]
pub struct RedisConnConfig {
    pub redis_url: String,
}

impl Default for RedisConnConfig {
    fn default() -> Self {
        RedisConnConfig {
            redis_url: "redis://127.0.0.1/".to_string(),
        }
    }
}

impl RedisConnConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_url(mut self, url: &str) -> Self {
        self.redis_url = url.to_string();
        self
    }
}

/// Open a multiplexed async connection, retrying the initial handshake
/// a bounded number of times.
pub async fn connect(config: &RedisConnConfig) -> Result<MultiplexedConnection, IdemError> {
    let client = Client::open(config.redis_url.clone())?;
    connect_with_retry(&client).await
}

async fn connect_with_retry(client: &Client) -> Result<MultiplexedConnection, IdemError> {
    let max_attempts = 6;
    let wait = Duration::from_secs(10);
    let mut attempts = 0;

    loop {
        match client.get_multiplexed_async_connection().await {
            Ok(conn) => return Ok(conn),
            Err(err) => {
                attempts += 1;
                if attempts >= max_attempts {
                    return Err(IdemError::Redis(err));
                }
                tracing::warn!(
                    attempt = attempts,
                    max_attempts,
                    wait_secs = wait.as_secs(),
                    error = %err,
                    "redis connection failed, retrying"
                );
                tokio::time::sleep(wait).await;
            }
        }
    }
}
