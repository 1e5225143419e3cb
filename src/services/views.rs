//! Event view counting
//!
//! Views are buffered in Redis when it is available and drained into the
//! event store by a background task; otherwise each view goes straight to
//! the store.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

use crate::database::EventStore;
use crate::services::redis::RedisService;
use crate::utils::errors::Result;

const VIEW_KEY_PREFIX: &str = "event:views:";

#[derive(Clone)]
pub struct ViewCounter {
    events: Arc<dyn EventStore>,
    buffer: Option<RedisService>,
}

impl ViewCounter {
    pub fn new(events: Arc<dyn EventStore>, buffer: Option<RedisService>) -> Self {
        Self { events, buffer }
    }

    pub fn is_buffered(&self) -> bool {
        self.buffer.is_some()
    }

    /// Count one view of `event_id`; failures are logged and swallowed
    pub async fn record_view(&self, event_id: i64) {
        if let Some(redis) = &self.buffer {
            match redis.increment_by(&view_key(event_id), 1).await {
                Ok(_) => return,
                Err(e) => warn!(event_id = event_id, error = %e, "View buffer unavailable, writing directly"),
            }
        }

        if let Err(e) = self.events.add_views(event_id, 1).await {
            warn!(event_id = event_id, error = %e, "Failed to record event view");
        }
    }

    /// Drain buffered counts into the store, returning the number of views moved
    pub async fn flush(&self) -> Result<i64> {
        let redis = match &self.buffer {
            Some(redis) => redis,
            None => return Ok(0),
        };

        let mut moved = 0;
        for full_key in redis.keys(&format!("{}*", VIEW_KEY_PREFIX)).await? {
            let key = redis.strip_prefix(&full_key).to_string();
            let event_id = match parse_view_key(&key) {
                Some(id) => id,
                None => {
                    warn!(key = %full_key, "Skipping malformed view key");
                    continue;
                }
            };

            let views = redis.take_counter(&key).await?;
            if views <= 0 {
                continue;
            }

            if let Err(e) = self.events.add_views(event_id, views).await {
                // Put the views back so the next flush retries them
                error!(event_id = event_id, views = views, error = %e, "Failed to flush view count");
                redis.increment_by(&key, views).await?;
                continue;
            }
            moved += views;
        }

        if moved > 0 {
            debug!(views = moved, "Flushed buffered view counts");
        }
        Ok(moved)
    }

    /// Flush every `interval` until `shutdown` flips, then flush once more
    pub fn spawn_flusher(self, interval: Duration, mut shutdown: watch::Receiver<bool>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        if let Err(e) = self.flush().await {
                            warn!(error = %e, "View count flush failed");
                        }
                    }
                    changed = shutdown.changed() => {
                        if changed.is_err() || *shutdown.borrow() {
                            break;
                        }
                    }
                }
            }

            match self.flush().await {
                Ok(views) => info!(views = views, "Final view count flush completed"),
                Err(e) => error!(error = %e, "Final view count flush failed"),
            }
        })
    }
}

fn view_key(event_id: i64) -> String {
    format!("{}{}", VIEW_KEY_PREFIX, event_id)
}

fn parse_view_key(key: &str) -> Option<i64> {
    key.strip_prefix(VIEW_KEY_PREFIX)?.parse().ok()
}
