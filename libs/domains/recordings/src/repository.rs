use async_trait::async_trait;

use crate::error::RecordingResult;
use crate::models::{ChannelFilter, CollectionInfo, CollectionSpec, RecordMetadata, SearchHit};

/// Vector index holding one vector plus metadata per record id.
///
/// Implementations are bound to the collection named at construction; the
/// [`CollectionSpec`] passed to `ensure_collection` must use the same name.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RecordingRepository: Send + Sync {
    /// Backend name for logs and readiness checks.
    fn name(&self) -> &'static str;

    /// Create the collection if it is missing. Existing data is never
    /// touched; the returned info describes the collection as found.
    async fn ensure_collection(&self, spec: &CollectionSpec) -> RecordingResult<CollectionInfo>;

    /// Insert or replace the vector and metadata stored under `id`.
    async fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        metadata: &RecordMetadata,
    ) -> RecordingResult<()>;

    /// Remove `id`. Removing an absent id succeeds.
    async fn delete(&self, id: &str) -> RecordingResult<()>;

    /// Up to `limit` nearest records by descending score, ties by id.
    async fn search(
        &self,
        vector: &[f32],
        filter: &ChannelFilter,
        limit: usize,
    ) -> RecordingResult<Vec<SearchHit>>;

    async fn health_check(&self) -> RecordingResult<()>;
}
