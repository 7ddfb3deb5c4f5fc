use queue_worker::QueueJob;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};
use utoipa::ToSchema;
use validator::Validate;

use crate::error::{RecordingError, RecordingResult};

/// A searchable recording.
///
/// Only `title`, `description` and `scenarios` are embedded; `channel_id` is
/// stored as metadata and used as a filter key.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    #[serde(default)]
    #[validate(length(min = 1, message = "id is required"))]
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scenarios: String,
    #[serde(default)]
    pub channel_id: String,
}

impl Record {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            ..Default::default()
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_scenarios(mut self, scenarios: impl Into<String>) -> Self {
        self.scenarios = scenarios.into();
        self
    }

    pub fn with_channel(mut self, channel_id: impl Into<String>) -> Self {
        self.channel_id = channel_id.into();
        self
    }

    pub fn metadata(&self) -> RecordMetadata {
        RecordMetadata {
            title: self.title.clone(),
            description: self.description.clone(),
            scenarios: self.scenarios.clone(),
            channel_id: self.channel_id.clone(),
        }
    }
}

/// Metadata stored next to every vector and returned with search hits.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RecordMetadata {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scenarios: String,
    #[serde(default)]
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct SearchHit {
    pub id: String,
    /// Higher is more similar.
    pub score: f32,
    pub metadata: RecordMetadata,
}

/// Sort hits by descending score, ties by id, and keep at most `limit`.
pub(crate) fn rank_hits(mut hits: Vec<SearchHit>, limit: usize) -> Vec<SearchHit> {
    hits.sort_by(|a, b| b.score.total_cmp(&a.score).then_with(|| a.id.cmp(&b.id)));
    hits.truncate(limit);
    hits
}

/// Allow-list of channel ids. An empty filter matches every record.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelFilter(Vec<String>);

impl ChannelFilter {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        ids.sort();
        ids.dedup();
        Self(ids)
    }

    pub fn is_unrestricted(&self) -> bool {
        self.0.is_empty()
    }

    pub fn allows(&self, channel_id: &str) -> bool {
        self.is_unrestricted() || self.0.iter().any(|id| id == channel_id)
    }

    pub fn ids(&self) -> &[String] {
        &self.0
    }
}

impl From<Option<Vec<String>>> for ChannelFilter {
    fn from(ids: Option<Vec<String>>) -> Self {
        ids.map(ChannelFilter::new).unwrap_or_default()
    }
}

/// Similarity measures where a higher score means more similar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DistanceMetric {
    #[default]
    Cosine,
    DotProduct,
}

/// What a collection must look like for the active embedding provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionSpec {
    pub name: String,
    pub dimension: usize,
    pub distance: DistanceMetric,
}

impl CollectionSpec {
    pub fn new(name: impl Into<String>, dimension: usize) -> Self {
        Self {
            name: name.into(),
            dimension,
            distance: DistanceMetric::Cosine,
        }
    }

    /// Repositories are bound to one collection at construction.
    pub(crate) fn expect_collection(&self, collection: &str) -> RecordingResult<()> {
        if self.name != collection {
            return Err(RecordingError::Config(format!(
                "repository is bound to collection {:?}, not {:?}",
                collection, self.name
            )));
        }
        Ok(())
    }

    /// Fails when an existing collection was built for a different dimension.
    pub fn check(&self, info: &CollectionInfo) -> RecordingResult<()> {
        if info.dimension != self.dimension {
            return Err(RecordingError::DimensionMismatch {
                expected: self.dimension,
                actual: info.dimension,
            });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionInfo {
    pub name: String,
    pub dimension: usize,
    pub distance: DistanceMetric,
    /// `false` when the collection already existed.
    pub created: bool,
}

/// Embedded text fields of a [`Record`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
#[strum(serialize_all = "lowercase")]
pub enum RecordField {
    Title,
    Description,
    Scenarios,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobAction {
    #[default]
    Upsert,
    Delete,
}

impl JobAction {
    fn is_upsert(&self) -> bool {
        *self == JobAction::Upsert
    }
}

fn is_zero(n: &u32) -> bool {
    *n == 0
}

/// Wire format of the ingestion queue.
///
/// An upsert message is the upsert request body itself; deletes add
/// `"action": "delete"`. A payload without `id` does not decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueueMessage {
    #[serde(default, skip_serializing_if = "JobAction::is_upsert")]
    pub action: JobAction,
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub scenarios: String,
    #[serde(default)]
    pub channel_id: String,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub retry_count: u32,
}

impl QueueMessage {
    pub fn upsert(record: &Record) -> Self {
        Self {
            action: JobAction::Upsert,
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            scenarios: record.scenarios.clone(),
            channel_id: record.channel_id.clone(),
            retry_count: 0,
        }
    }

    pub fn delete(id: impl Into<String>) -> Self {
        Self {
            action: JobAction::Delete,
            id: id.into(),
            title: String::new(),
            description: String::new(),
            scenarios: String::new(),
            channel_id: String::new(),
            retry_count: 0,
        }
    }

    pub fn into_job(self) -> RecordingResult<IngestionJob> {
        if self.id.trim().is_empty() {
            return Err(RecordingError::MalformedJob("id is blank".to_string()));
        }

        Ok(match self.action {
            JobAction::Upsert => IngestionJob::Upsert(Record {
                id: self.id,
                title: self.title,
                description: self.description,
                scenarios: self.scenarios,
                channel_id: self.channel_id,
            }),
            JobAction::Delete => IngestionJob::Delete { id: self.id },
        })
    }
}

impl QueueJob for QueueMessage {
    fn job_id(&self) -> String {
        self.id.clone()
    }

    fn retry_count(&self) -> u32 {
        self.retry_count
    }

    fn with_retry(&self) -> Self {
        Self {
            retry_count: self.retry_count + 1,
            ..self.clone()
        }
    }
}

/// A decoded, validated queue message.
#[derive(Debug, Clone, PartialEq)]
pub enum IngestionJob {
    Upsert(Record),
    Delete { id: String },
}

impl IngestionJob {
    pub fn id(&self) -> &str {
        match self {
            IngestionJob::Upsert(record) => &record.id,
            IngestionJob::Delete { id } => id,
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct DeleteRecordRequest {
    #[serde(default)]
    #[validate(length(min = 1, message = "id is required"))]
    pub id: String,
}

#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SearchRequest {
    /// Free text; may be empty.
    #[serde(default)]
    pub content: String,
    /// Restrict hits to these channels. Absent or empty searches everything.
    #[serde(default)]
    pub subscribed_channel_ids: Option<Vec<String>>,
}
