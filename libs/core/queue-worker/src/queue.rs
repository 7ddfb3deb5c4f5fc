//! List-like job queues.
//!
//! A queue is a named FIFO of opaque string payloads. Producers push to the
//! tail, consumers pop from the head with a bounded wait so the caller can
//! observe shutdown between receives.

use crate::error::QueueError;
use async_trait::async_trait;
use std::collections::VecDeque;
use std::time::Duration;
use tokio::sync::{Mutex, Notify};
use tokio::time::Instant;

#[async_trait]
pub trait JobQueue: Send + Sync {
    /// Queue name, used for logs and metric labels.
    fn name(&self) -> &str;

    /// Append a payload to the tail of the queue.
    async fn push(&self, payload: &str) -> Result<(), QueueError>;

    /// Remove the head of the queue, waiting at most `timeout` for one to
    /// arrive. `Ok(None)` means the wait elapsed with nothing to deliver.
    async fn pop(&self, timeout: Duration) -> Result<Option<String>, QueueError>;

    /// Number of pending payloads.
    async fn len(&self) -> Result<usize, QueueError>;

    /// Connectivity check for readiness probes.
    async fn ping(&self) -> Result<(), QueueError> {
        self.len().await.map(|_| ())
    }
}

/// In-process queue with the same contract as the Redis list queue.
///
/// Used by tests and by local runs without Redis.
pub struct MemoryQueue {
    name: String,
    items: Mutex<VecDeque<String>>,
    notify: Notify,
}

impl MemoryQueue {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            items: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
        }
    }

    /// Snapshot of the pending payloads, head first.
    pub async fn snapshot(&self) -> Vec<String> {
        self.items.lock().await.iter().cloned().collect()
    }
}

#[async_trait]
impl JobQueue for MemoryQueue {
    fn name(&self) -> &str {
        &self.name
    }

    async fn push(&self, payload: &str) -> Result<(), QueueError> {
        self.items.lock().await.push_back(payload.to_string());
        self.notify.notify_one();
        Ok(())
    }

    async fn pop(&self, timeout: Duration) -> Result<Option<String>, QueueError> {
        let deadline = Instant::now() + timeout;
        loop {
            if let Some(item) = self.items.lock().await.pop_front() {
                return Ok(Some(item));
            }

            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return Ok(None);
            }
            if tokio::time::timeout(remaining, self.notify.notified())
                .await
                .is_err()
            {
                return Ok(None);
            }
        }
    }

    async fn len(&self) -> Result<usize, QueueError> {
        Ok(self.items.lock().await.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_fifo_order() {
        let queue = MemoryQueue::new("test");
        queue.push("a").await.unwrap();
        queue.push("b").await.unwrap();

        assert_eq!(queue.len().await.unwrap(), 2);
        assert_eq!(queue.pop(Duration::ZERO).await.unwrap().as_deref(), Some("a"));
        assert_eq!(queue.pop(Duration::ZERO).await.unwrap().as_deref(), Some("b"));
        assert_eq!(queue.pop(Duration::ZERO).await.unwrap(), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_pop_times_out_when_empty() {
        let queue = MemoryQueue::new("test");
        let started = Instant::now();
        assert_eq!(queue.pop(Duration::from_secs(2)).await.unwrap(), None);
        assert!(started.elapsed() >= Duration::from_secs(2));
    }

    #[tokio::test]
    async fn test_pop_wakes_on_push() {
        let queue = Arc::new(MemoryQueue::new("test"));
        let consumer = Arc::clone(&queue);
        let handle = tokio::spawn(async move { consumer.pop(Duration::from_secs(5)).await });

        tokio::time::sleep(Duration::from_millis(20)).await;
        queue.push("late").await.unwrap();

        let popped = handle.await.unwrap().unwrap();
        assert_eq!(popped.as_deref(), Some("late"));
    }
}
