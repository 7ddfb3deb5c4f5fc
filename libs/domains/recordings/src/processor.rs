use std::sync::Arc;

use async_trait::async_trait;
use queue_worker::{QueueError, QueueProcessor};

use crate::models::QueueMessage;
use crate::service::RecordingService;

/// Applies ingestion queue messages to the vector index.
pub struct IngestionProcessor {
    service: Arc<RecordingService>,
}

impl IngestionProcessor {
    pub fn new(service: Arc<RecordingService>) -> Self {
        Self { service }
    }
}

#[async_trait]
impl QueueProcessor<QueueMessage> for IngestionProcessor {
    async fn process(&self, message: &QueueMessage) -> Result<(), QueueError> {
        let job = message.clone().into_job()?;
        self.service.apply(&job).await?;
        Ok(())
    }

    fn name(&self) -> &'static str {
        "recordings_ingestion"
    }

    async fn health_check(&self) -> Result<bool, QueueError> {
        Ok(self.service.repository().health_check().await.is_ok())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::WeightedVectorBuilder;
    use crate::error::RecordingError;
    use crate::memory::InMemoryRepository;
    use crate::models::ChannelFilter;
    use crate::repository::MockRecordingRepository;
    use crate::test_support::WordProvider;
    use queue_worker::{JobQueue, MemoryQueue, Outcome, QueueWorker, WorkerConfig};
    use std::time::Duration;
    use tokio::sync::watch;

    struct Harness {
        worker: QueueWorker<QueueMessage, IngestionProcessor>,
        queue: Arc<MemoryQueue>,
        repository: Arc<InMemoryRepository>,
        service: Arc<RecordingService>,
    }

    async fn harness(config: WorkerConfig) -> Harness {
        let queue = Arc::new(MemoryQueue::new(config.queue_name.clone()));
        let repository = Arc::new(InMemoryRepository::new("recordings"));
        let service = Arc::new(RecordingService::new(
            queue.clone(),
            WeightedVectorBuilder::new(Arc::new(WordProvider::new(16))),
            repository.clone(),
        ));
        service.ensure_collection("recordings").await.unwrap();

        let processor = Arc::new(IngestionProcessor::new(service.clone()));
        let worker = QueueWorker::new(queue.clone(), processor, config);
        Harness {
            worker,
            queue,
            repository,
            service,
        }
    }

    #[tokio::test]
    async fn test_malformed_messages_are_dropped() {
        let h = harness(WorkerConfig::new("q").with_max_retries(3)).await;

        assert_eq!(h.worker.handle_payload(r#"{"title":"no id"}"#).await, Outcome::Dropped);
        assert_eq!(h.worker.handle_payload(r#"{"id":""}"#).await, Outcome::Dropped);
        assert_eq!(h.worker.handle_payload("42").await, Outcome::Dropped);
        assert_eq!(h.queue.len().await.unwrap(), 0);
        assert!(h.repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_upsert_and_delete_messages_are_applied() {
        let h = harness(WorkerConfig::new("q")).await;

        let outcome = h
            .worker
            .handle_payload(r#"{"id":"rec-1","title":"Login","channelId":"C1"}"#)
            .await;
        assert_eq!(outcome, Outcome::Processed);
        assert_eq!(h.repository.metadata("rec-1").await.unwrap().channel_id, "C1");

        let outcome = h
            .worker
            .handle_payload(r#"{"action":"delete","id":"rec-1"}"#)
            .await;
        assert_eq!(outcome, Outcome::Processed);
        assert!(h.repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_retryable_store_failure_is_requeued() {
        let mut repository = MockRecordingRepository::new();
        repository
            .expect_upsert()
            .returning(|_, _, _| Err(RecordingError::store("connection reset", true)));

        let queue = Arc::new(MemoryQueue::new("q"));
        let service = Arc::new(RecordingService::new(
            queue.clone(),
            WeightedVectorBuilder::new(Arc::new(WordProvider::new(4))),
            Arc::new(repository),
        ));
        let worker = QueueWorker::new(
            queue.clone(),
            Arc::new(IngestionProcessor::new(service)),
            WorkerConfig::new("q").with_max_retries(1),
        );

        assert_eq!(worker.handle_payload(r#"{"id":"rec-1"}"#).await, Outcome::Retried);
        let requeued = queue.snapshot().await;
        assert_eq!(requeued.len(), 1);
        assert!(requeued[0].contains(r#""retryCount":1"#));

        assert_eq!(worker.handle_payload(&requeued[0]).await, Outcome::Dropped);
    }

    #[tokio::test]
    async fn test_worker_keeps_going_after_malformed_message() {
        let h = harness(WorkerConfig::new("q").with_block_timeout(Duration::from_millis(20))).await;

        h.queue.push(r#"{"title":"missing id"}"#).await.unwrap();
        h.queue.push("not json").await.unwrap();
        h.queue
            .push(r#"{"id":"rec-1","title":"reset password","channelId":"C1"}"#)
            .await
            .unwrap();
        h.queue
            .push(r#"{"id":"rec-2","title":"export csv","channelId":"C2"}"#)
            .await
            .unwrap();

        let (tx, rx) = watch::channel(false);
        let worker = Arc::new(h.worker);
        let running = Arc::clone(&worker);
        let handle = tokio::spawn(async move { running.run(rx).await });

        tokio::time::timeout(Duration::from_secs(2), async {
            while h.repository.len().await < 2 {
                tokio::time::sleep(Duration::from_millis(5)).await;
            }
        })
        .await
        .expect("valid messages were not applied");

        tx.send(true).unwrap();
        handle.await.unwrap().unwrap();

        let hits = h
            .service
            .search("reset password", &ChannelFilter::new(["C1"]))
            .await
            .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "rec-1");
    }
}
