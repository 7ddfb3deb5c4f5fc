use std::sync::OnceLock;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info};

use super::PineconeConfig;
use super::config::API_VERSION;
use crate::error::{RecordingError, RecordingResult};
use crate::models::{
    ChannelFilter, CollectionInfo, CollectionSpec, DistanceMetric, RecordMetadata, SearchHit,
    rank_hits,
};
use crate::repository::RecordingRepository;

const READY_POLL_INTERVAL: Duration = Duration::from_secs(1);
const READY_POLL_ATTEMPTS: u32 = 120;

/// Pinecone serverless index over the REST API.
pub struct PineconeRepository {
    client: Client,
    config: PineconeConfig,
    index: String,
    host: OnceLock<String>,
}

#[derive(Debug, Deserialize)]
struct IndexModel {
    dimension: usize,
    #[serde(default)]
    metric: Option<String>,
    #[serde(default)]
    host: String,
    #[serde(default)]
    status: IndexStatus,
}

#[derive(Debug, Default, Deserialize)]
struct IndexStatus {
    #[serde(default)]
    ready: bool,
}

#[derive(Serialize)]
struct UpsertVector<'a> {
    id: &'a str,
    values: &'a [f32],
    metadata: &'a RecordMetadata,
}

#[derive(Deserialize)]
struct QueryResponse {
    #[serde(default)]
    matches: Vec<QueryMatch>,
}

#[derive(Deserialize)]
struct QueryMatch {
    id: String,
    #[serde(default)]
    score: f32,
    #[serde(default)]
    metadata: Option<RecordMetadata>,
}

fn with_scheme(host: &str) -> String {
    if host.starts_with("http://") || host.starts_with("https://") {
        host.trim_end_matches('/').to_string()
    } else {
        format!("https://{}", host.trim_end_matches('/'))
    }
}

fn metric_name(metric: DistanceMetric) -> &'static str {
    match metric {
        DistanceMetric::Cosine => "cosine",
        DistanceMetric::DotProduct => "dotproduct",
    }
}

/// Non-2xx responses become store errors; 5xx and 429 are retryable.
async fn check(response: Response) -> RecordingResult<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    Err(RecordingError::store(
        format!("Pinecone API error ({}): {}", status, body),
        status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS,
    ))
}

fn query_body(vector: &[f32], filter: &ChannelFilter, limit: usize) -> Value {
    let mut body = json!({
        "vector": vector,
        "topK": limit,
        "includeMetadata": true,
        "includeValues": false,
    });
    if !filter.is_unrestricted() {
        body["filter"] = json!({ "channelId": { "$in": filter.ids() } });
    }
    body
}

impl PineconeRepository {
    pub fn new(config: PineconeConfig, index: impl Into<String>) -> RecordingResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RecordingError::Config(format!("Failed to build HTTP client: {}", e)))?;

        let host = OnceLock::new();
        if let Some(configured) = &config.index_host {
            let _ = host.set(with_scheme(configured));
        }

        Ok(Self {
            client,
            config,
            index: index.into(),
            host,
        })
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .header("Api-Key", &self.config.api_key)
            .header("X-Pinecone-API-Version", API_VERSION)
    }

    fn control(&self, path: &str) -> String {
        format!("{}{}", self.config.control_url.trim_end_matches('/'), path)
    }

    fn data(&self, path: &str) -> RecordingResult<String> {
        let host = self.host.get().ok_or_else(|| {
            RecordingError::store(
                format!("index host for {} is unknown; ensure the index first", self.index),
                false,
            )
        })?;
        Ok(format!("{}{}", host, path))
    }

    async fn describe_index(&self) -> RecordingResult<Option<IndexModel>> {
        let response = self
            .authorized(self.client.get(self.control(&format!("/indexes/{}", self.index))))
            .send()
            .await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }

        let model = check(response).await?.json::<IndexModel>().await?;
        Ok(Some(model))
    }

    async fn create_index(&self, spec: &CollectionSpec) -> RecordingResult<()> {
        let body = json!({
            "name": self.index,
            "dimension": spec.dimension,
            "metric": metric_name(spec.distance),
            "spec": {
                "serverless": {
                    "cloud": self.config.cloud,
                    "region": self.config.region,
                }
            }
        });

        let response = self
            .authorized(self.client.post(self.control("/indexes")))
            .json(&body)
            .send()
            .await?;

        // Another instance may have created it between describe and create.
        if response.status() == StatusCode::CONFLICT {
            return Ok(());
        }
        check(response).await?;
        Ok(())
    }

    async fn wait_until_ready(&self) -> RecordingResult<IndexModel> {
        for _ in 0..READY_POLL_ATTEMPTS {
            if let Some(model) = self.describe_index().await? {
                if model.status.ready && !model.host.is_empty() {
                    return Ok(model);
                }
            }
            tokio::time::sleep(READY_POLL_INTERVAL).await;
        }

        Err(RecordingError::store(
            format!("index {} did not become ready", self.index),
            true,
        ))
    }
}

#[async_trait]
impl RecordingRepository for PineconeRepository {
    fn name(&self) -> &'static str {
        "pinecone"
    }

    async fn ensure_collection(&self, spec: &CollectionSpec) -> RecordingResult<CollectionInfo> {
        spec.expect_collection(&self.index)?;

        let (model, created) = match self.describe_index().await? {
            Some(model) if model.status.ready && !model.host.is_empty() => (model, false),
            Some(_) => (self.wait_until_ready().await?, false),
            None => {
                self.create_index(spec).await?;
                info!(
                    index = %self.index,
                    dimension = spec.dimension,
                    cloud = %self.config.cloud,
                    region = %self.config.region,
                    "Created Pinecone index"
                );
                (self.wait_until_ready().await?, true)
            }
        };

        let _ = self.host.set(with_scheme(&model.host));

        let distance = match model.metric.as_deref() {
            Some("dotproduct") => DistanceMetric::DotProduct,
            _ => DistanceMetric::Cosine,
        };

        Ok(CollectionInfo {
            name: self.index.clone(),
            dimension: model.dimension,
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
        let record = UpsertVector {
            id,
            values: vector,
            metadata,
        };
        let body = json!({ "vectors": [record] });

        let response = self
            .authorized(self.client.post(self.data("/vectors/upsert")?))
            .json(&body)
            .send()
            .await?;
        check(response).await?;

        debug!(id, index = %self.index, "Upserted vector");
        Ok(())
    }

    async fn delete(&self, id: &str) -> RecordingResult<()> {
        let response = self
            .authorized(self.client.post(self.data("/vectors/delete")?))
            .json(&json!({ "ids": [id] }))
            .send()
            .await?;
        check(response).await?;

        debug!(id, index = %self.index, "Deleted vector");
        Ok(())
    }

    async fn search(
        &self,
        vector: &[f32],
        filter: &ChannelFilter,
        limit: usize,
    ) -> RecordingResult<Vec<SearchHit>> {
        let response = self
            .authorized(self.client.post(self.data("/query")?))
            .json(&query_body(vector, filter, limit))
            .send()
            .await?;

        let body: QueryResponse = check(response).await?.json().await?;

        let hits = body
            .matches
            .into_iter()
            .map(|m| SearchHit {
                id: m.id,
                score: m.score,
                metadata: m.metadata.unwrap_or_default(),
            })
            .collect();

        Ok(rank_hits(hits, limit))
    }

    async fn health_check(&self) -> RecordingResult<()> {
        match self.describe_index().await? {
            Some(_) => Ok(()),
            None => Err(RecordingError::store(
                format!("index {} not found", self.index),
                false,
            )),
        }
    }
}
