use std::time::Duration;

use async_trait::async_trait;
use core_config::{ConfigError, FromEnv, env_parse, env_required};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::EmbeddingProvider;
use crate::error::{RecordingError, RecordingResult};

/// Self-hosted embedding service: `POST {url}` with `{"text": ...}`,
/// answering `{"embedding": [...]}`.
#[derive(Debug, Clone)]
pub struct RemoteEmbeddingConfig {
    pub url: String,
    pub dimension: usize,
    pub timeout_secs: u64,
}

impl RemoteEmbeddingConfig {
    pub fn new(url: impl Into<String>, dimension: usize) -> Self {
        Self {
            url: url.into(),
            dimension,
            timeout_secs: 10,
        }
    }

    pub fn with_timeout(mut self, secs: u64) -> Self {
        self.timeout_secs = secs;
        self
    }
}

impl FromEnv for RemoteEmbeddingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            url: env_required("EMBEDDING_URL")?,
            dimension: env_parse("EMBEDDING_DIMENSION", 1024)?,
            timeout_secs: env_parse("EMBEDDING_TIMEOUT_SECS", 10)?,
        })
    }
}

pub struct RemoteEmbeddingProvider {
    client: Client,
    config: RemoteEmbeddingConfig,
}

impl RemoteEmbeddingProvider {
    pub fn new(config: RemoteEmbeddingConfig) -> RecordingResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RecordingError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self { client, config })
    }
}

#[derive(Serialize)]
struct EmbedRequest<'a> {
    text: &'a str,
}

#[derive(Deserialize)]
struct EmbedResponse {
    embedding: Option<Vec<f32>>,
}

#[async_trait]
impl EmbeddingProvider for RemoteEmbeddingProvider {
    fn name(&self) -> &'static str {
        "embedding"
    }

    fn dimension(&self) -> usize {
        self.config.dimension
    }

    async fn try_embed(&self, text: &str) -> RecordingResult<Vec<f32>> {
        let response = self
            .client
            .post(&self.config.url)
            .json(&EmbedRequest { text })
            .send()
            .await
            .map_err(|e| RecordingError::ProviderUnavailable(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RecordingError::ProviderUnavailable(format!(
                "embedding service returned {}",
                status
            )));
        }

        let body: EmbedResponse = response
            .json()
            .await
            .map_err(|e| RecordingError::ProviderUnavailable(e.to_string()))?;

        body.embedding.ok_or_else(|| {
            RecordingError::ProviderUnavailable("response has no embedding".to_string())
        })
    }
}
