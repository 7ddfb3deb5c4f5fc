use std::sync::Arc;

use queue_worker::JobQueue;
use tracing::{debug, info, warn};

use crate::builder::WeightedVectorBuilder;
use crate::embedding::embed_or_zero;
use crate::error::{RecordingError, RecordingResult};
use crate::models::{
    ChannelFilter, CollectionInfo, CollectionSpec, IngestionJob, QueueMessage, Record, SearchHit,
};
use crate::repository::RecordingRepository;

/// Request-facing operations.
///
/// Writes are queued and applied later by the ingestion worker through
/// [`apply`](Self::apply); searches go straight to the repository.
pub struct RecordingService {
    queue: Arc<dyn JobQueue>,
    builder: WeightedVectorBuilder,
    repository: Arc<dyn RecordingRepository>,
    search_limit: usize,
}

impl RecordingService {
    pub fn new(
        queue: Arc<dyn JobQueue>,
        builder: WeightedVectorBuilder,
        repository: Arc<dyn RecordingRepository>,
    ) -> Self {
        Self {
            queue,
            builder,
            repository,
            search_limit: crate::config::DEFAULT_SEARCH_LIMIT,
        }
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit.max(1);
        self
    }

    pub fn repository(&self) -> &Arc<dyn RecordingRepository> {
        &self.repository
    }

    pub fn queue(&self) -> &Arc<dyn JobQueue> {
        &self.queue
    }

    /// Ensure the collection exists and was built for the provider's
    /// dimension.
    pub async fn ensure_collection(&self, name: &str) -> RecordingResult<CollectionInfo> {
        let spec = CollectionSpec::new(name, self.builder.dimension());
        let info = self.repository.ensure_collection(&spec).await?;
        spec.check(&info)?;

        info!(
            collection = %info.name,
            dimension = info.dimension,
            distance = %info.distance,
            created = info.created,
            backend = self.repository.name(),
            "Collection ready"
        );
        Ok(info)
    }

    pub async fn enqueue_upsert(&self, record: &Record) -> RecordingResult<()> {
        require_id(&record.id)?;
        self.enqueue(&QueueMessage::upsert(record)).await
    }

    pub async fn enqueue_delete(&self, id: &str) -> RecordingResult<()> {
        require_id(id)?;
        self.enqueue(&QueueMessage::delete(id)).await
    }

    async fn enqueue(&self, message: &QueueMessage) -> RecordingResult<()> {
        let payload = serde_json::to_string(message)?;
        self.queue.push(&payload).await?;
        debug!(id = %message.id, action = ?message.action, queue = %self.queue.name(), "Enqueued job");
        Ok(())
    }

    pub async fn search(
        &self,
        content: &str,
        filter: &ChannelFilter,
    ) -> RecordingResult<Vec<SearchHit>> {
        let embedding = embed_or_zero(self.builder.provider().as_ref(), content).await;
        if embedding.degraded {
            warn!("Searching with a zero query vector; results are not ranked by similarity");
        }

        self.repository
            .search(&embedding.values, filter, self.search_limit)
            .await
    }

    /// Apply one ingestion job to the repository.
    pub async fn apply(&self, job: &IngestionJob) -> RecordingResult<()> {
        match job {
            IngestionJob::Upsert(record) => {
                let vector = self.builder.build_record(record).await;
                if vector.is_degraded() {
                    warn!(
                        id = %record.id,
                        fields = ?vector.degraded_fields,
                        "Indexing with zero vectors for fields the provider could not embed"
                    );
                }
                self.repository
                    .upsert(&record.id, &vector.values, &record.metadata())
                    .await
            }
            IngestionJob::Delete { id } => self.repository.delete(id).await,
        }
    }
}

fn require_id(id: &str) -> RecordingResult<()> {
    if id.trim().is_empty() {
        return Err(RecordingError::Validation("id is required".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::InMemoryRepository;
    use crate::repository::MockRecordingRepository;
    use crate::test_support::WordProvider;
    use queue_worker::MemoryQueue;

    const DIM: usize = 32;

    struct Fixture {
        service: RecordingService,
        queue: Arc<MemoryQueue>,
        repository: Arc<InMemoryRepository>,
    }

    async fn fixture() -> Fixture {
        let queue = Arc::new(MemoryQueue::new("recordings:queue"));
        let repository = Arc::new(InMemoryRepository::new("recordings"));
        let builder = WeightedVectorBuilder::new(Arc::new(WordProvider::new(DIM)));
        let service = RecordingService::new(queue.clone(), builder, repository.clone());
        service.ensure_collection("recordings").await.unwrap();
        Fixture {
            service,
            queue,
            repository,
        }
    }

    async fn drain(fixture: &Fixture) {
        for payload in fixture.queue.snapshot().await {
            let _ = fixture
                .queue
                .pop(std::time::Duration::from_millis(1))
                .await;
            let message: QueueMessage = serde_json::from_str(&payload).unwrap();
            fixture
                .service
                .apply(&message.into_job().unwrap())
                .await
                .unwrap();
        }
    }

    #[tokio::test]
    async fn test_enqueue_upsert_writes_request_body() {
        let fixture = fixture().await;
        let record = Record::new("rec-1").with_title("Login").with_channel("C1");

        fixture.service.enqueue_upsert(&record).await.unwrap();

        let pending = fixture.queue.snapshot().await;
        assert_eq!(pending.len(), 1);
        let queued: Record = serde_json::from_str(&pending[0]).unwrap();
        assert_eq!(queued, record);
        assert!(fixture.repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_blank_id_is_rejected() {
        let fixture = fixture().await;

        let err = fixture
            .service
            .enqueue_upsert(&Record::new("   "))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordingError::Validation(_)));

        let err = fixture.service.enqueue_delete("").await.unwrap_err();
        assert!(matches!(err, RecordingError::Validation(_)));
        assert_eq!(fixture.queue.len().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_upsert_then_search_finds_record_in_channel() {
        let fixture = fixture().await;
        let service = &fixture.service;

        service
            .enqueue_upsert(
                &Record::new("rec-1")
                    .with_title("reset password flow")
                    .with_scenarios("click forgot password")
                    .with_channel("C1"),
            )
            .await
            .unwrap();
        service
            .enqueue_upsert(
                &Record::new("rec-2")
                    .with_title("reset password flow")
                    .with_channel("C2"),
            )
            .await
            .unwrap();
        service
            .enqueue_upsert(
                &Record::new("rec-3")
                    .with_title("export invoices")
                    .with_channel("C1"),
            )
            .await
            .unwrap();
        drain(&fixture).await;

        let hits = service
            .search("reset password flow", &ChannelFilter::new(["C1"]))
            .await
            .unwrap();

        assert_eq!(hits[0].id, "rec-1");
        assert!(hits.iter().all(|h| h.metadata.channel_id == "C1"));
        assert!(hits.iter().all(|h| h.id != "rec-2"));
    }

    #[tokio::test]
    async fn test_overwrite_and_delete_through_queue() {
        let fixture = fixture().await;
        let service = &fixture.service;

        service
            .enqueue_upsert(&Record::new("rec-1").with_title("first"))
            .await
            .unwrap();
        service
            .enqueue_upsert(&Record::new("rec-1").with_title("second"))
            .await
            .unwrap();
        drain(&fixture).await;

        assert_eq!(fixture.repository.len().await, 1);
        assert_eq!(
            fixture.repository.metadata("rec-1").await.unwrap().title,
            "second"
        );

        service.enqueue_delete("rec-1").await.unwrap();
        service.enqueue_delete("rec-1").await.unwrap();
        drain(&fixture).await;
        assert!(fixture.repository.is_empty().await);
    }

    #[tokio::test]
    async fn test_search_respects_limit() {
        let queue = Arc::new(MemoryQueue::new("q"));
        let repository = Arc::new(InMemoryRepository::new("recordings"));
        let builder = WeightedVectorBuilder::new(Arc::new(WordProvider::new(DIM)));
        let service =
            RecordingService::new(queue, builder, repository.clone()).with_search_limit(2);
        service.ensure_collection("recordings").await.unwrap();

        for i in 0..5 {
            service
                .apply(&IngestionJob::Upsert(
                    Record::new(format!("rec-{}", i)).with_title("same title"),
                ))
                .await
                .unwrap();
        }

        let hits = service.search("same title", &ChannelFilter::any()).await.unwrap();
        assert_eq!(hits.len(), 2);
    }

    #[tokio::test]
    async fn test_search_surfaces_store_errors() {
        let mut repository = MockRecordingRepository::new();
        repository
            .expect_search()
            .returning(|_, _, _| Err(RecordingError::store("deadline exceeded", true)));

        let service = RecordingService::new(
            Arc::new(MemoryQueue::new("q")),
            WeightedVectorBuilder::new(Arc::new(WordProvider::new(DIM))),
            Arc::new(repository),
        );

        let err = service
            .search("anything", &ChannelFilter::any())
            .await
            .unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    async fn test_search_with_failing_provider_still_queries() {
        let mut repository = MockRecordingRepository::new();
        repository
            .expect_search()
            .withf(|vector, filter, limit| {
                vector.iter().all(|v| *v == 0.0) && filter.is_unrestricted() && *limit == 10
            })
            .returning(|_, _, _| Ok(vec![]));

        let service = RecordingService::new(
            Arc::new(MemoryQueue::new("q")),
            WeightedVectorBuilder::new(Arc::new(WordProvider::new(DIM).fail_on("query"))),
            Arc::new(repository),
        );

        let hits = service.search("query", &ChannelFilter::any()).await.unwrap();
        assert!(hits.is_empty());
    }

    #[tokio::test]
    async fn test_ensure_collection_rejects_dimension_mismatch() {
        let repository = Arc::new(InMemoryRepository::new("recordings"));
        repository
            .ensure_collection(&CollectionSpec::new("recordings", DIM * 2))
            .await
            .unwrap();

        let service = RecordingService::new(
            Arc::new(MemoryQueue::new("q")),
            WeightedVectorBuilder::new(Arc::new(WordProvider::new(DIM))),
            repository,
        );

        let err = service.ensure_collection("recordings").await.unwrap_err();
        assert!(matches!(
            err,
            RecordingError::DimensionMismatch {
                expected: DIM,
                actual: 64
            }
        ));
    }
}
