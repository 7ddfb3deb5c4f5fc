//! Job and processor traits.

use crate::error::QueueError;
use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};

/// Trait for queue job payloads.
///
/// Payloads are JSON; a payload that fails to deserialize into the job type
/// is treated as malformed and never reaches the processor.
///
/// ```rust,ignore
/// #[derive(Clone, Serialize, Deserialize)]
/// struct ResizeJob {
///     id: String,
///     #[serde(default)]
///     retry_count: u32,
/// }
///
/// impl QueueJob for ResizeJob {
///     fn job_id(&self) -> String { self.id.clone() }
///     fn retry_count(&self) -> u32 { self.retry_count }
///     fn with_retry(&self) -> Self {
///         Self { retry_count: self.retry_count + 1, ..self.clone() }
///     }
/// }
/// ```
pub trait QueueJob: Serialize + DeserializeOwned + Send + Sync + Clone {
    /// Identifier used for logging and tracking.
    fn job_id(&self) -> String;

    /// How many times this job has already been requeued.
    fn retry_count(&self) -> u32;

    /// Copy of the job with the retry counter incremented.
    fn with_retry(&self) -> Self;
}

/// Trait for job processors.
#[async_trait]
pub trait QueueProcessor<J: QueueJob>: Send + Sync {
    /// Process a single job.
    ///
    /// Transient errors may be requeued depending on the worker's retry
    /// budget; permanent errors never are.
    async fn process(&self, job: &J) -> Result<(), QueueError>;

    /// Processor name for logs and metric labels.
    fn name(&self) -> &'static str;

    /// Health check for the processor's downstream dependencies.
    async fn health_check(&self) -> Result<bool, QueueError> {
        Ok(true)
    }
}
