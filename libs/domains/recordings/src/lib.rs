//! Recordings Domain Library
//!
//! Indexing and similarity search for recordings: free text (title,
//! description, scenarios) plus a channel id used for filtering.
//!
//! # Architecture
//!
//! ```text
//!   HTTP ──► RecordingService ──► JobQueue (Redis list)
//!                 │                      │
//!                 │ search               ▼
//!                 │              IngestionProcessor ──► WeightedVectorBuilder
//!                 ▼                      │                      │
//!        ┌────────────────────┐          │             ┌────────▼─────────┐
//!        │ RecordingRepository│◄─────────┘             │ EmbeddingProvider│
//!        │      (trait)       │                        │     (trait)      │
//!        └─────────┬──────────┘                        └────────┬─────────┘
//!                  │                                            │
//!     Qdrant │ Pinecone │ InMemory                     OpenAI │ Remote
//! ```
//!
//! Writes never touch the index directly: upserts and deletes are queued and
//! applied in order by the ingestion worker. Searches embed the query and go
//! straight to the repository.
//!
//! # Usage
//!
//! ```rust,no_run
//! use domain_recordings::{
//!     ChannelFilter, InMemoryRepository, Record, RecordingService, RemoteEmbeddingConfig,
//!     RemoteEmbeddingProvider, WeightedVectorBuilder,
//! };
//! use queue_worker::MemoryQueue;
//! use std::sync::Arc;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let provider = RemoteEmbeddingProvider::new(RemoteEmbeddingConfig::new(
//!     "http://localhost:8000/embed",
//!     1024,
//! ))?;
//! let service = RecordingService::new(
//!     Arc::new(MemoryQueue::new("recordings:queue")),
//!     WeightedVectorBuilder::new(Arc::new(provider)),
//!     Arc::new(InMemoryRepository::new("recordings")),
//! );
//! service.ensure_collection("recordings").await?;
//!
//! service
//!     .enqueue_upsert(&Record::new("rec-1").with_title("Reset password").with_channel("C1"))
//!     .await?;
//!
//! let hits = service
//!     .search("reset password", &ChannelFilter::new(["C1"]))
//!     .await?;
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod embedding;
pub mod error;
pub mod handlers;
pub mod memory;
pub mod models;
pub mod pinecone;
pub mod processor;
pub mod qdrant;
pub mod repository;
pub mod service;

#[cfg(test)]
mod test_support;

// Re-export commonly used types
pub use builder::{DEFAULT_SCENARIO_WEIGHT, WeightedVector, WeightedVectorBuilder};
pub use config::{RecordingsConfig, StoreBackend, StoreConfig, build_repository};
pub use embedding::{
    Embedding, EmbeddingBackend, EmbeddingConfig, EmbeddingProvider, OpenAIConfig, OpenAIProvider,
    RemoteEmbeddingConfig, RemoteEmbeddingProvider, build_provider, embed_or_zero,
};
pub use error::{RecordingError, RecordingResult};
pub use handlers::ApiDoc;
pub use memory::InMemoryRepository;
pub use models::{
    ChannelFilter, CollectionInfo, CollectionSpec, DistanceMetric, IngestionJob, JobAction,
    QueueMessage, Record, RecordField, RecordMetadata, SearchHit,
};
pub use pinecone::{PineconeConfig, PineconeRepository};
pub use processor::IngestionProcessor;
pub use qdrant::{QdrantConfig, QdrantRepository};
pub use repository::RecordingRepository;
pub use service::RecordingService;
