mod openai;
mod provider;
mod remote;

use std::str::FromStr;
use std::sync::Arc;

use core_config::{ConfigError, FromEnv, env_or_default};
use strum::{Display, EnumString};
use tracing::warn;

use crate::error::RecordingResult;

pub use openai::{OpenAIConfig, OpenAIProvider};
pub use provider::{Embedding, EmbeddingProvider, embed_or_zero};
pub use remote::{RemoteEmbeddingConfig, RemoteEmbeddingProvider};

/// Selected by `EMBEDDING_PROVIDER`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
pub enum EmbeddingBackend {
    #[default]
    #[strum(serialize = "openai")]
    OpenAI,
    #[strum(serialize = "embedding")]
    Remote,
}

impl EmbeddingBackend {
    /// Unknown names fall back to OpenAI.
    pub fn parse_or_default(raw: &str) -> Self {
        Self::from_str(raw.trim()).unwrap_or_else(|_| {
            warn!(provider = raw, "Unknown embedding provider, using openai");
            Self::default()
        })
    }
}

#[derive(Debug, Clone)]
pub enum EmbeddingConfig {
    OpenAI(OpenAIConfig),
    Remote(RemoteEmbeddingConfig),
}

impl EmbeddingConfig {
    pub fn backend(&self) -> EmbeddingBackend {
        match self {
            EmbeddingConfig::OpenAI(_) => EmbeddingBackend::OpenAI,
            EmbeddingConfig::Remote(_) => EmbeddingBackend::Remote,
        }
    }
}

impl FromEnv for EmbeddingConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let backend =
            EmbeddingBackend::parse_or_default(&env_or_default("EMBEDDING_PROVIDER", "openai"));
        Ok(match backend {
            EmbeddingBackend::OpenAI => EmbeddingConfig::OpenAI(OpenAIConfig::from_env()?),
            EmbeddingBackend::Remote => EmbeddingConfig::Remote(RemoteEmbeddingConfig::from_env()?),
        })
    }
}

pub fn build_provider(config: EmbeddingConfig) -> RecordingResult<Arc<dyn EmbeddingProvider>> {
    Ok(match config {
        EmbeddingConfig::OpenAI(config) => Arc::new(OpenAIProvider::new(config)?),
        EmbeddingConfig::Remote(config) => Arc::new(RemoteEmbeddingProvider::new(config)?),
    })
}
