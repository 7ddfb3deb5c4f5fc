//! In-process vector index.
//!
//! Brute-force scoring over a map guarded by an async `RwLock`. Writers
//! replace a whole entry under the write lock, so a search never sees a
//! record with a new vector and old metadata.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::error::{RecordingError, RecordingResult};
use crate::models::{
    ChannelFilter, CollectionInfo, CollectionSpec, DistanceMetric, RecordMetadata, SearchHit,
    rank_hits,
};
use crate::repository::RecordingRepository;

struct StoredRecord {
    vector: Vec<f32>,
    metadata: RecordMetadata,
}

struct Collection {
    dimension: usize,
    distance: DistanceMetric,
    records: HashMap<String, StoredRecord>,
}

pub struct InMemoryRepository {
    name: String,
    collection: RwLock<Option<Collection>>,
}

impl InMemoryRepository {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            name: collection.into(),
            collection: RwLock::new(None),
        }
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.collection
            .read()
            .await
            .as_ref()
            .map_or(0, |c| c.records.len())
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn metadata(&self, id: &str) -> Option<RecordMetadata> {
        self.collection
            .read()
            .await
            .as_ref()
            .and_then(|c| c.records.get(id))
            .map(|r| r.metadata.clone())
    }

    fn missing(&self) -> RecordingError {
        RecordingError::store(format!("collection {} does not exist", self.name), false)
    }
}

fn score(distance: DistanceMetric, a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    match distance {
        DistanceMetric::DotProduct => dot,
        DistanceMetric::Cosine => {
            let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
            let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
            if norm_a == 0.0 || norm_b == 0.0 {
                0.0
            } else {
                dot / (norm_a * norm_b)
            }
        }
    }
}

#[async_trait]
impl RecordingRepository for InMemoryRepository {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn ensure_collection(&self, spec: &CollectionSpec) -> RecordingResult<CollectionInfo> {
        spec.expect_collection(&self.name)?;
        let mut guard = self.collection.write().await;

        let created = guard.is_none();
        let collection = guard.get_or_insert_with(|| Collection {
            dimension: spec.dimension,
            distance: spec.distance,
            records: HashMap::new(),
        });

        if created {
            info!(collection = %self.name, dimension = spec.dimension, "Created in-memory collection");
        }

        Ok(CollectionInfo {
            name: self.name.clone(),
            dimension: collection.dimension,
            distance: collection.distance,
            created,
        })
    }

    async fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        metadata: &RecordMetadata,
    ) -> RecordingResult<()> {
        let mut guard = self.collection.write().await;
        let collection = guard.as_mut().ok_or_else(|| self.missing())?;

        if vector.len() != collection.dimension {
            return Err(RecordingError::store(
                format!(
                    "vector has {} components, collection expects {}",
                    vector.len(),
                    collection.dimension
                ),
                false,
            ));
        }

        collection.records.insert(
            id.to_string(),
            StoredRecord {
                vector: vector.to_vec(),
                metadata: metadata.clone(),
            },
        );
        debug!(id, "Upserted record");
        Ok(())
    }

    async fn delete(&self, id: &str) -> RecordingResult<()> {
        let mut guard = self.collection.write().await;
        let collection = guard.as_mut().ok_or_else(|| self.missing())?;
        collection.records.remove(id);
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        filter: &ChannelFilter,
        limit: usize,
    ) -> RecordingResult<Vec<SearchHit>> {
        let guard = self.collection.read().await;
        let collection = guard.as_ref().ok_or_else(|| self.missing())?;

        let hits = collection
            .records
            .iter()
            .filter(|(_, record)| filter.allows(&record.metadata.channel_id))
            .map(|(id, record)| SearchHit {
                id: id.clone(),
                score: score(collection.distance, vector, &record.vector),
                metadata: record.metadata.clone(),
            })
            .collect();

        Ok(rank_hits(hits, limit))
    }

    async fn health_check(&self) -> RecordingResult<()> {
        Ok(())
    }
}
