//! Redis list backed queue (RPUSH / BLPOP).

use crate::error::QueueError;
use crate::queue::JobQueue;
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use std::time::Duration;
use tracing::{debug, info};

/// Headroom added to the client response timeout on top of the longest BLPOP
/// wait, so the server-side timeout always fires first.
const RESPONSE_TIMEOUT_MARGIN: Duration = Duration::from_secs(5);

pub struct RedisListQueue {
    redis: ConnectionManager,
    name: String,
}

impl RedisListQueue {
    pub fn new(redis: ConnectionManager, name: impl Into<String>) -> Self {
        Self {
            redis,
            name: name.into(),
        }
    }

    /// Open a connection manager suitable for blocking pops of up to
    /// `max_block`, verify it with PING and return it.
    pub async fn connect(url: &str, max_block: Duration) -> Result<ConnectionManager, QueueError> {
        let client = redis::Client::open(url)?;
        let config = ConnectionManagerConfig::new()
            .set_response_timeout(Some(max_block + RESPONSE_TIMEOUT_MARGIN));
        let mut manager = ConnectionManager::new_with_config(client, config).await?;

        let _: String = redis::cmd("PING").query_async(&mut manager).await?;
        info!("Connected to Redis");

        Ok(manager)
    }

    /// Another queue on the same connection, e.g. a dead-letter list.
    pub fn sibling(&self, name: impl Into<String>) -> Self {
        Self::new(self.redis.clone(), name)
    }
}

#[async_trait]
impl JobQueue for RedisListQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn push(&self, payload: &str) -> Result<(), QueueError> {
        let mut conn = self.redis.clone();
        let len: i64 = redis::cmd("RPUSH")
            .arg(&self.name)
            .arg(payload)
            .query_async(&mut conn)
            .await?;

        debug!(queue = %self.name, len, "Enqueued payload");
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        let mut conn = self.redis.clone();
        // BLPOP accepts fractional seconds; 0 would block forever.
        let wait = timeout.as_secs_f64().max(0.001);
        let popped: Option<(String, String)> = redis::cmd("BLPOP")
            .arg(&self.name)
            .arg(wait)
            .query_async(&mut conn)
            .await?;

        Ok(popped.map(|(_, payload)| payload))
    }

    async fn len(&self) -> Result<usize, QueueError> {
        let mut conn = self.redis.clone();
        let len: usize = redis::cmd("LLEN")
            .arg(&self.name)
            .query_async(&mut conn)
            .await?;
        Ok(len)
    }

    async fn ping(&self) -> Result<(), QueueError> {
        let mut conn = self.redis.clone();
        let _: String = redis::cmd("PING").query_async(&mut conn).await?;
        Ok(())
    }
}
