//! The queue worker loop.
//!
//! Two states: **waiting** on a bounded receive, and **processing** exactly
//! one payload. Every payload returns the worker to waiting whatever the
//! outcome, and shutdown is checked between iterations.

use crate::config::WorkerConfig;
use crate::error::{ErrorCategory, QueueError};
use crate::job::{QueueJob, QueueProcessor};
use crate::metrics::QueueMetrics;
use crate::queue::JobQueue;
use chrono::Utc;
use serde::Serialize;
use std::marker::PhantomData;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::watch;
use tracing::{debug, error, info, warn};

/// What happened to a single payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Processed,
    /// Pushed back to the tail of the queue with an incremented retry count.
    Retried,
    DeadLettered,
    Dropped,
}

/// Envelope written to the dead-letter list.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DeadLetter<'a> {
    queue: &'a str,
    payload: &'a str,
    error: String,
    retry_count: u32,
    failed_at: chrono::DateTime<Utc>,
}

pub struct QueueWorker<J, P>
where
    J: QueueJob,
    P: QueueProcessor<J>,
{
    queue: Arc<dyn JobQueue>,
    dead_letter: Option<Arc<dyn JobQueue>>,
    processor: Arc<P>,
    config: WorkerConfig,
    metrics: QueueMetrics,
    _phantom: PhantomData<J>,
}

impl<J, P> QueueWorker<J, P>
where
    J: QueueJob + 'static,
    P: QueueProcessor<J> + 'static,
{
    pub fn new(queue: Arc<dyn JobQueue>, processor: Arc<P>, config: WorkerConfig) -> Self {
        let metrics = QueueMetrics::new(queue.name(), processor.name());
        Self {
            queue,
            dead_letter: None,
            processor,
            config,
            metrics,
            _phantom: PhantomData,
        }
    }

    /// Send jobs that will not be processed to `queue` instead of dropping them.
    pub fn with_dead_letter(mut self, queue: Arc<dyn JobQueue>) -> Self {
        self.dead_letter = Some(queue);
        self
    }

    pub fn config(&self) -> &WorkerConfig {
        &self.config
    }

    /// Run until `shutdown` flips to `true`.
    ///
    /// A receive in flight is never abandoned, so shutdown is observed within
    /// one `block_timeout`. Connection errors back off exponentially and
    /// never end the loop.
    pub async fn run(&self, mut shutdown: watch::Receiver<bool>) -> Result<(), QueueError> {
        info!(
            queue = %self.queue.name(),
            processor = %self.processor.name(),
            block_timeout_ms = self.config.block_timeout.as_millis() as u64,
            max_retries = self.config.max_retries,
            dead_letter = ?self.dead_letter.as_ref().map(|q| q.name().to_string()),
            "Starting queue worker"
        );

        let mut consecutive_errors: u32 = 0;

        loop {
            if *shutdown.borrow() {
                info!("Received shutdown signal, stopping worker");
                break;
            }

            match self.queue.pop(self.config.block_timeout).await {
                Ok(Some(payload)) => {
                    if consecutive_errors > 0 {
                        info!("Queue connection recovered after {} errors", consecutive_errors);
                        consecutive_errors = 0;
                    }
                    self.handle_payload(&payload).await;
                }
                Ok(None) => {
                    consecutive_errors = 0;
                    debug!(queue = %self.queue.name(), "No jobs within block timeout");
                }
                Err(e) => {
                    self.metrics.connection_error();
                    let backoff =
                        ErrorCategory::Transient.backoff_delay_ms(consecutive_errors.min(5));
                    consecutive_errors = consecutive_errors.saturating_add(1);
                    warn!(
                        error = %e,
                        consecutive_errors,
                        backoff_ms = backoff,
                        "Queue receive failed, backing off"
                    );

                    let delay = Duration::from_millis(backoff);
                    tokio::select! {
                        changed = shutdown.changed() => {
                            // Sender gone: nobody can signal shutdown any more, keep backing off.
                            if changed.is_err() {
                                tokio::time::sleep(delay).await;
                            }
                        }
                        _ = tokio::time::sleep(delay) => {}
                    }
                }
            }
        }

        info!(queue = %self.queue.name(), "Queue worker stopped");
        Ok(())
    }

    /// Decode and process one payload. Never fails: every error is logged
    /// and mapped to an [`Outcome`].
    pub async fn handle_payload(&self, payload: &str) -> Outcome {
        self.metrics.job_received();

        let job: J = match serde_json::from_str(payload) {
            Ok(job) => job,
            Err(e) => {
                warn!(
                    queue = %self.queue.name(),
                    error = %e,
                    payload_len = payload.len(),
                    "Dropping malformed job payload"
                );
                self.metrics.job_malformed();
                return self
                    .give_up(payload, &QueueError::from(e), 0)
                    .await;
            }
        };

        let job_id = job.job_id();
        let start = Instant::now();
        debug!(job_id = %job_id, retry_count = job.retry_count(), "Processing job");

        match self.processor.process(&job).await {
            Ok(()) => {
                self.metrics.job_processed(start.elapsed());
                debug!(
                    job_id = %job_id,
                    duration_ms = start.elapsed().as_millis() as u64,
                    "Job processed"
                );
                Outcome::Processed
            }
            Err(e) => {
                let category = e.category();
                self.metrics.job_failed(category.as_str());

                if e.should_retry(job.retry_count(), self.config.max_retries) {
                    warn!(
                        job_id = %job_id,
                        error = %e,
                        retry_count = job.retry_count(),
                        max_retries = self.config.max_retries,
                        "Job failed, requeueing"
                    );
                    match self.requeue(&job.with_retry()).await {
                        Ok(()) => {
                            self.metrics.job_retried();
                            return Outcome::Retried;
                        }
                        Err(requeue_err) => {
                            error!(job_id = %job_id, error = %requeue_err, "Failed to requeue job");
                        }
                    }
                } else {
                    error!(
                        job_id = %job_id,
                        error = %e,
                        category = category.as_str(),
                        retry_count = job.retry_count(),
                        "Job failed"
                    );
                }

                self.give_up(payload, &e, job.retry_count()).await
            }
        }
    }

    async fn requeue(&self, job: &J) -> Result<(), QueueError> {
        let payload = serde_json::to_string(job)?;
        self.queue.push(&payload).await
    }

    async fn give_up(&self, payload: &str, err: &QueueError, retry_count: u32) -> Outcome {
        let Some(dead_letter) = &self.dead_letter else {
            self.metrics.job_dropped();
            return Outcome::Dropped;
        };

        let entry = DeadLetter {
            queue: self.queue.name(),
            payload,
            error: err.to_string(),
            retry_count,
            failed_at: Utc::now(),
        };

        let pushed = match serde_json::to_string(&entry) {
            Ok(encoded) => dead_letter.push(&encoded).await,
            Err(e) => Err(e.into()),
        };

        match pushed {
            Ok(()) => {
                info!(dlq = %dead_letter.name(), error = %err, "Moved job to dead-letter queue");
                self.metrics.job_dead_lettered();
                Outcome::DeadLettered
            }
            Err(e) => {
                error!(dlq = %dead_letter.name(), error = %e, "Failed to dead-letter job, dropping");
                self.metrics.job_dropped();
                Outcome::Dropped
            }
        }
    }
}
