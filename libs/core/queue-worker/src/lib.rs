//! Queue Worker Framework
//!
//! A small framework for consuming JSON jobs from a Redis list.
//!
//! ## Features
//!
//! - **Bounded waits**: `BLPOP` with a timeout, so shutdown is observed
//!   between receives
//! - **Failure isolation**: malformed or failing jobs never stop the loop
//! - **Retry budget**: transient failures can be requeued with a counter
//! - **Dead-letter list**: optional home for jobs that will not be processed
//! - **Prometheus metrics**
//!
//! ## Example
//!
//! ```ignore
//! use queue_worker::{QueueWorker, RedisListQueue, WorkerConfig};
//!
//! let config = WorkerConfig::from_env()?;
//! let redis = RedisListQueue::connect(&redis_url, config.block_timeout).await?;
//! let queue = Arc::new(RedisListQueue::new(redis, &config.queue_name));
//!
//! let worker = QueueWorker::new(queue, Arc::new(processor), config);
//! worker.run(shutdown_rx).await?;
//! ```

mod config;
mod error;
mod job;
pub mod metrics;
mod queue;
mod redis_queue;
mod worker;

pub use config::{DEFAULT_QUEUE_NAME, WorkerConfig};
pub use error::{ErrorCategory, QueueError};
pub use job::{QueueJob, QueueProcessor};
pub use metrics::{QueueMetrics, init_metrics, metrics_router};
pub use queue::{JobQueue, MemoryQueue};
pub use redis_queue::RedisListQueue;
pub use worker::{Outcome, QueueWorker};
