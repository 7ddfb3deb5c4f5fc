use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::{
    self, Condition, CreateCollectionBuilder, DeletePointsBuilder, Distance, Filter, PointId,
    PointStruct, SearchPointsBuilder, UpsertPointsBuilder, Value as QdrantValue,
    VectorParamsBuilder,
};
use tracing::{debug, info};
use uuid::Uuid;

use super::QdrantConfig;
use crate::error::{RecordingError, RecordingResult};
use crate::models::{
    ChannelFilter, CollectionInfo, CollectionSpec, DistanceMetric, RecordMetadata, SearchHit,
    rank_hits,
};
use crate::repository::RecordingRepository;

/// Qdrant-backed implementation of RecordingRepository
pub struct QdrantRepository {
    client: Qdrant,
    collection: String,
}

impl QdrantRepository {
    pub fn new(config: QdrantConfig, collection: impl Into<String>) -> RecordingResult<Self> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(api_key) = config.api_key {
            builder = builder.api_key(api_key);
        }

        builder = builder.timeout(Duration::from_secs(config.timeout_secs));

        let client = builder
            .build()
            .map_err(|e| RecordingError::Config(format!("Failed to build Qdrant client: {}", e)))?;

        Ok(Self::from_client(client, collection))
    }

    pub fn from_client(client: Qdrant, collection: impl Into<String>) -> Self {
        Self {
            client,
            collection: collection.into(),
        }
    }

    fn to_qdrant_distance(metric: DistanceMetric) -> Distance {
        match metric {
            DistanceMetric::Cosine => Distance::Cosine,
            DistanceMetric::DotProduct => Distance::Dot,
        }
    }

    fn from_qdrant_distance(distance: Distance) -> DistanceMetric {
        match distance {
            Distance::Dot => DistanceMetric::DotProduct,
            _ => DistanceMetric::Cosine,
        }
    }

    async fn describe(&self) -> RecordingResult<(usize, DistanceMetric)> {
        let info = self.client.collection_info(&self.collection).await?;
        let params = info
            .result
            .and_then(|r| r.config)
            .and_then(|c| c.params)
            .and_then(|p| p.vectors_config)
            .and_then(|v| v.config);

        match params {
            Some(qdrant::vectors_config::Config::Params(p)) => {
                Ok((p.size as usize, Self::from_qdrant_distance(p.distance())))
            }
            _ => Err(RecordingError::store(
                format!(
                    "collection {} has no single unnamed vector configuration",
                    self.collection
                ),
                false,
            )),
        }
    }
}

/// Point id for a caller id. Qdrant only accepts integers and UUIDs, so
/// other ids map to a stable UUIDv5.
///
/// Only the canonical lowercase hyphenated form is used as-is. Other
/// spellings of the same UUID are distinct caller ids and must not share a
/// point.
pub fn point_uuid(id: &str) -> Uuid {
    match Uuid::parse_str(id) {
        Ok(parsed) if parsed.hyphenated().to_string() == id => parsed,
        _ => Uuid::new_v5(&Uuid::NAMESPACE_OID, id.as_bytes()),
    }
}

fn point_id(id: &str) -> PointId {
    PointId::from(point_uuid(id).to_string())
}

fn to_payload(id: &str, metadata: &RecordMetadata) -> HashMap<String, QdrantValue> {
    [
        ("id", id),
        ("title", metadata.title.as_str()),
        ("description", metadata.description.as_str()),
        ("scenarios", metadata.scenarios.as_str()),
        ("channelId", metadata.channel_id.as_str()),
    ]
    .into_iter()
    .map(|(key, value)| (key.to_string(), QdrantValue::from(value.to_string())))
    .collect()
}

fn payload_string(payload: &HashMap<String, QdrantValue>, key: &str) -> String {
    use qdrant::value::Kind;

    match payload.get(key).and_then(|v| v.kind.as_ref()) {
        Some(Kind::StringValue(s)) => s.clone(),
        _ => String::new(),
    }
}

fn point_id_string(point_id: Option<&PointId>) -> String {
    match point_id.and_then(|p| p.point_id_options.as_ref()) {
        Some(qdrant::point_id::PointIdOptions::Uuid(uuid)) => uuid.clone(),
        Some(qdrant::point_id::PointIdOptions::Num(num)) => num.to_string(),
        None => String::new(),
    }
}

/// Outcome of a create: `true` when this call created the collection. A
/// failed create is accepted when another replica created it first.
async fn settle_create<F, Fut>(result: RecordingResult<()>, exists: F) -> RecordingResult<bool>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = RecordingResult<bool>>,
{
    match result {
        Ok(()) => Ok(true),
        Err(err) => {
            if exists().await? {
                Ok(false)
            } else {
                Err(err)
            }
        }
    }
}

fn channel_filter(filter: &ChannelFilter) -> Option<Filter> {
    if filter.is_unrestricted() {
        return None;
    }
    Some(Filter::must([Condition::matches(
        "channelId",
        filter.ids().to_vec(),
    )]))
}

#[async_trait]
impl RecordingRepository for QdrantRepository {
    fn name(&self) -> &'static str {
        "qdrant"
    }

    async fn ensure_collection(&self, spec: &CollectionSpec) -> RecordingResult<CollectionInfo> {
        spec.expect_collection(&self.collection)?;

        let created = if self.client.collection_exists(&self.collection).await? {
            false
        } else {
            let result = self
                .client
                .create_collection(
                    CreateCollectionBuilder::new(&self.collection).vectors_config(
                        VectorParamsBuilder::new(
                            spec.dimension as u64,
                            Self::to_qdrant_distance(spec.distance),
                        ),
                    ),
                )
                .await
                .map(|_| ())
                .map_err(RecordingError::from);

            let created = settle_create(result, || async {
                self.client
                    .collection_exists(&self.collection)
                    .await
                    .map_err(RecordingError::from)
            })
            .await?;

            if created {
                info!(
                    collection = %self.collection,
                    dimension = spec.dimension,
                    distance = %spec.distance,
                    "Created Qdrant collection"
                );
            } else {
                debug!(collection = %self.collection, "Collection created concurrently");
            }
            created
        };

        let (dimension, distance) = self.describe().await?;
        Ok(CollectionInfo {
            name: self.collection.clone(),
            dimension,
            distance,
            created,
        })
    }

    async fn upsert(
        &self,
        id: &str,
        vector: &[f32],
        metadata: &RecordMetadata,
    ) -> RecordingResult<()> {
        let point = PointStruct::new(point_id(id), vector.to_vec(), to_payload(id, metadata));

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await?;

        debug!(id, collection = %self.collection, "Upserted point");
        Ok(())
    }

    async fn delete(&self, id: &str) -> RecordingResult<()> {
        // Qdrant treats deleting a missing point as a no-op.
        self.client
            .delete_points(
                DeletePointsBuilder::new(&self.collection)
                    .points(vec![point_id(id)])
                    .wait(true),
            )
            .await?;

        debug!(id, collection = %self.collection, "Deleted point");
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        filter: &ChannelFilter,
        limit: usize,
    ) -> RecordingResult<Vec<SearchHit>> {
        let mut builder =
            SearchPointsBuilder::new(&self.collection, vector.to_vec(), limit as u64)
                .with_payload(true);

        if let Some(filter) = channel_filter(filter) {
            builder = builder.filter(filter);
        }

        let response = self.client.search_points(builder).await?;

        let hits = response
            .result
            .into_iter()
            .map(|point| {
                let mut id = payload_string(&point.payload, "id");
                if id.is_empty() {
                    id = point_id_string(point.id.as_ref());
                }

                SearchHit {
                    id,
                    score: point.score,
                    metadata: RecordMetadata {
                        title: payload_string(&point.payload, "title"),
                        description: payload_string(&point.payload, "description"),
                        scenarios: payload_string(&point.payload, "scenarios"),
                        channel_id: payload_string(&point.payload, "channelId"),
                    },
                }
            })
            .collect();

        Ok(rank_hits(hits, limit))
    }

    async fn health_check(&self) -> RecordingResult<()> {
        self.client.health_check().await?;
        Ok(())
    }
}
