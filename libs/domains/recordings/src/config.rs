//! Environment-driven configuration for the recordings core.

use std::str::FromStr;
use std::sync::Arc;

use core_config::{ConfigError, FromEnv, env_or_default, env_parse};
use strum::{Display, EnumString};

use crate::builder::DEFAULT_SCENARIO_WEIGHT;
use crate::embedding::EmbeddingConfig;
use crate::error::RecordingResult;
use crate::memory::InMemoryRepository;
use crate::pinecone::{PineconeConfig, PineconeRepository};
use crate::qdrant::{QdrantConfig, QdrantRepository};
use crate::repository::RecordingRepository;

pub const DEFAULT_COLLECTION_NAME: &str = "recordings";
pub const DEFAULT_SEARCH_LIMIT: usize = 10;

/// Selected by `VECTOR_STORE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Display, EnumString)]
#[strum(serialize_all = "lowercase")]
pub enum StoreBackend {
    #[default]
    Qdrant,
    Pinecone,
    Memory,
}

#[derive(Debug, Clone)]
pub enum StoreConfig {
    Qdrant(QdrantConfig),
    Pinecone(PineconeConfig),
    Memory,
}

impl StoreConfig {
    pub fn backend(&self) -> StoreBackend {
        match self {
            StoreConfig::Qdrant(_) => StoreBackend::Qdrant,
            StoreConfig::Pinecone(_) => StoreBackend::Pinecone,
            StoreConfig::Memory => StoreBackend::Memory,
        }
    }
}

impl FromEnv for StoreConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let raw = env_or_default("VECTOR_STORE", "qdrant");
        let backend =
            StoreBackend::from_str(raw.trim()).map_err(|_| ConfigError::ParseError {
                key: "VECTOR_STORE".to_string(),
                details: format!("unknown vector store {:?}", raw),
            })?;

        Ok(match backend {
            StoreBackend::Qdrant => StoreConfig::Qdrant(QdrantConfig::from_env()?),
            StoreBackend::Pinecone => StoreConfig::Pinecone(PineconeConfig::from_env()?),
            StoreBackend::Memory => StoreConfig::Memory,
        })
    }
}

/// Build the repository for `config`, bound to `collection`.
pub fn build_repository(
    config: StoreConfig,
    collection: &str,
) -> RecordingResult<Arc<dyn RecordingRepository>> {
    Ok(match config {
        StoreConfig::Qdrant(config) => Arc::new(QdrantRepository::new(config, collection)?),
        StoreConfig::Pinecone(config) => Arc::new(PineconeRepository::new(config, collection)?),
        StoreConfig::Memory => Arc::new(InMemoryRepository::new(collection)),
    })
}

#[derive(Debug, Clone)]
pub struct RecordingsConfig {
    pub embedding: EmbeddingConfig,
    pub store: StoreConfig,
    pub collection_name: String,
    pub scenario_weight: f32,
    pub search_limit: usize,
}

impl FromEnv for RecordingsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let search_limit = env_parse("SEARCH_LIMIT", DEFAULT_SEARCH_LIMIT)?;
        if search_limit == 0 {
            return Err(ConfigError::ParseError {
                key: "SEARCH_LIMIT".to_string(),
                details: "must be at least 1".to_string(),
            });
        }

        Ok(Self {
            embedding: EmbeddingConfig::from_env()?,
            store: StoreConfig::from_env()?,
            collection_name: env_or_default("COLLECTION_NAME", DEFAULT_COLLECTION_NAME),
            scenario_weight: env_parse("SCENARIO_WEIGHT", DEFAULT_SCENARIO_WEIGHT)?,
            search_limit,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::embedding::EmbeddingBackend;

    #[test]
    fn test_defaults() {
        temp_env::with_vars(
            [
                ("EMBEDDING_PROVIDER", Some("embedding")),
                ("EMBEDDING_URL", Some("http://embedder/embed")),
                ("VECTOR_STORE", None),
                ("QDRANT_ENDPOINT", None),
                ("COLLECTION_NAME", None),
                ("SCENARIO_WEIGHT", None),
                ("SEARCH_LIMIT", None),
            ],
            || {
                let config = RecordingsConfig::from_env().unwrap();
                assert_eq!(config.embedding.backend(), EmbeddingBackend::Remote);
                assert_eq!(config.store.backend(), StoreBackend::Qdrant);
                assert_eq!(config.collection_name, "recordings");
                assert_eq!(config.scenario_weight, 2.0);
                assert_eq!(config.search_limit, 10);
            },
        );
    }

    #[test]
    fn test_memory_store_and_overrides() {
        temp_env::with_vars(
            [
                ("EMBEDDING_PROVIDER", Some("embedding")),
                ("EMBEDDING_URL", Some("http://embedder/embed")),
                ("VECTOR_STORE", Some("memory")),
                ("COLLECTION_NAME", Some("recordings_v2")),
                ("SCENARIO_WEIGHT", Some("3.5")),
                ("SEARCH_LIMIT", Some("25")),
            ],
            || {
                let config = RecordingsConfig::from_env().unwrap();
                assert_eq!(config.store.backend(), StoreBackend::Memory);
                assert_eq!(config.collection_name, "recordings_v2");
                assert_eq!(config.scenario_weight, 3.5);
                assert_eq!(config.search_limit, 25);

                let repo = build_repository(config.store, &config.collection_name).unwrap();
                assert_eq!(repo.name(), "memory");
            },
        );
    }

    #[test]
    fn test_rejects_unknown_store_and_zero_limit() {
        temp_env::with_vars(
            [
                ("EMBEDDING_PROVIDER", Some("embedding")),
                ("EMBEDDING_URL", Some("http://embedder/embed")),
                ("VECTOR_STORE", Some("milvus")),
                ("SEARCH_LIMIT", None),
            ],
            || {
                assert!(matches!(
                    RecordingsConfig::from_env(),
                    Err(ConfigError::ParseError { ref key, .. }) if key == "VECTOR_STORE"
                ));
            },
        );

        temp_env::with_vars(
            [("VECTOR_STORE", Some("memory")), ("SEARCH_LIMIT", Some("0"))],
            || {
                assert!(RecordingsConfig::from_env().is_err());
            },
        );
    }
}
