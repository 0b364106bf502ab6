//! Work queue access for thumbnail jobs
//!
//! Jobs are JSON strings on a Redis list, popped with `BLPOP`.

use crate::error::Result;
use async_trait::async_trait;
use redis::aio::ConnectionManager;
use std::time::Duration;
use tracing::info;

/// Source of raw job messages
#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Pop one message, waiting at most `timeout`. `Ok(None)` means the
    /// wait elapsed without a message.
    async fn pop(&mut self, timeout: Duration) -> Result<Option<String>>;
}

/// Redis list-backed queue
pub struct RedisJobQueue {
    conn: ConnectionManager,
    queue_name: String,
}

impl RedisJobQueue {
    /// Connect and ping once; failure here is fatal for the worker
    pub async fn connect(redis_url: &str, queue_name: impl Into<String>) -> Result<Self> {
        let client = redis::Client::open(redis_url)?;
        let mut conn = ConnectionManager::new(client).await?;

        redis::cmd("PING")
            .query_async::<_, String>(&mut conn)
            .await?;

        let queue_name = queue_name.into();
        info!(queue = %queue_name, "Connected to Redis job queue");

        Ok(Self { conn, queue_name })
    }
}

#[async_trait]
impl JobQueue for RedisJobQueue {
    async fn pop(&mut self, timeout: Duration) -> Result<Option<String>> {
        // BLPOP 0 would block forever
        let timeout_secs = timeout.as_secs().max(1);

        let reply: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(&self.queue_name)
            .arg(timeout_secs)
            .query_async(&mut self.conn)
            .await?;

        Ok(reply.map(|(_queue, payload)| payload))
    }
}
