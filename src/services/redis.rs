//! Redis integration service implementation
//!
//! Holds buffered counters (event view counts) under the configured key
//! prefix until the background flusher drains them into the store.

use redis::{AsyncCommands, Client, RedisResult};
use tracing::{debug, warn};

use crate::config::settings::RedisConfig;
use crate::utils::errors::{CampusWallError, Result};

/// Redis service for buffered counters
#[derive(Clone, Debug)]
pub struct RedisService {
    client: Client,
    prefix: String,
    ttl_seconds: u64,
}

impl RedisService {
    /// Create a new RedisService instance
    pub fn new(config: &RedisConfig) -> Result<Self> {
        let client = Client::open(config.url.as_str()).map_err(CampusWallError::Redis)?;

        Ok(Self {
            client,
            prefix: config.prefix.clone(),
            ttl_seconds: config.ttl_seconds,
        })
    }

    /// Get Redis connection
    async fn get_connection(&self) -> Result<redis::aio::Connection> {
        self.client.get_async_connection().await.map_err(CampusWallError::Redis)
    }

    /// Key with the configured prefix applied
    pub fn full_key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }

    /// Remove the configured prefix from a key returned by [`Self::keys`]
    pub fn strip_prefix<'a>(&self, full_key: &'a str) -> &'a str {
        full_key.strip_prefix(self.prefix.as_str()).unwrap_or(full_key)
    }

    /// Increment a counter by `amount`, refreshing its TTL
    ///
    /// The TTL bounds how long counts survive when nothing drains them.
    pub async fn increment_by(&self, key: &str, amount: i64) -> Result<i64> {
        let mut conn = self.get_connection().await?;
        let full_key = self.full_key(key);

        let (value,): (i64,) = redis::pipe()
            .atomic()
            .incr(&full_key, amount)
            .expire(&full_key, self.ttl_seconds as i64)
            .ignore()
            .query_async(&mut conn)
            .await
            .map_err(CampusWallError::Redis)?;

        debug!(key = %full_key, value = value, ttl = self.ttl_seconds, "Counter incremented");
        Ok(value)
    }

    /// Read a counter and delete it in one step
    ///
    /// Increments that land after the read start a fresh counter, so nothing
    /// is counted twice or lost between flushes.
    pub async fn take_counter(&self, key: &str) -> Result<i64> {
        let mut conn = self.get_connection().await?;
        let full_key = self.full_key(key);

        let value: Option<i64> = redis::cmd("GETDEL")
            .arg(&full_key)
            .query_async(&mut conn)
            .await
            .map_err(CampusWallError::Redis)?;

        Ok(value.unwrap_or(0))
    }

    /// Get all keys matching a pattern, prefix included
    pub async fn keys(&self, pattern: &str) -> Result<Vec<String>> {
        let mut conn = self.get_connection().await?;
        let full_pattern = self.full_key(pattern);

        let keys: Vec<String> = conn.keys(&full_pattern).await.map_err(CampusWallError::Redis)?;

        debug!(pattern = %full_pattern, count = keys.len(), "Keys retrieved by pattern");
        Ok(keys)
    }

    /// Health check for Redis connection
    pub async fn health_check(&self) -> Result<bool> {
        match self.get_connection().await {
            Ok(mut conn) => {
                let result: RedisResult<String> = redis::cmd("PING").query_async(&mut conn).await;
                match result {
                    Ok(response) => {
                        debug!(response = %response, "Redis health check successful");
                        Ok(response == "PONG")
                    }
                    Err(e) => {
                        warn!(error = %e, "Redis health check failed");
                        Ok(false)
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "Redis connection failed");
                Ok(false)
            }
        }
    }
}
