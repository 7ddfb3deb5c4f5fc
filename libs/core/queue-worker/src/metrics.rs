//! Prometheus metrics for queue workers

use crate::error::QueueError;
use axum::{
    Router,
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};
use once_cell::sync::OnceCell;
use std::time::Duration;
use tracing::info;

static PROMETHEUS_HANDLE: OnceCell<PrometheusHandle> = OnceCell::new();

/// Install the Prometheus recorder. Subsequent calls are no-ops.
pub fn init_metrics() -> Result<(), QueueError> {
    PROMETHEUS_HANDLE.get_or_try_init(|| {
        let handle = PrometheusBuilder::new()
            .install_recorder()
            .map_err(|e| QueueError::Config(format!("failed to install metrics recorder: {e}")))?;
        info!("Prometheus metrics initialized");
        Ok::<_, QueueError>(handle)
    })?;
    Ok(())
}

/// Render metrics in Prometheus text format, if initialized.
pub fn render_metrics() -> Option<String> {
    PROMETHEUS_HANDLE.get().map(|h| h.render())
}

pub async fn metrics_handler() -> Response {
    match render_metrics() {
        Some(body) => (
            StatusCode::OK,
            [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
            body,
        )
            .into_response(),
        None => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Metrics not initialized".to_string(),
        )
            .into_response(),
    }
}

/// Router exposing `GET /metrics`.
pub fn metrics_router() -> Router {
    Router::new().route("/metrics", get(metrics_handler))
}

/// Labeled counters and histograms for a single worker.
#[derive(Clone)]
pub struct QueueMetrics {
    queue_name: String,
    processor_name: String,
}

impl QueueMetrics {
    pub fn new(queue_name: impl Into<String>, processor_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            processor_name: processor_name.into(),
        }
    }

    pub fn job_received(&self) {
        counter!(
            "queue_worker_jobs_received_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }

    pub fn job_processed(&self, duration: Duration) {
        counter!(
            "queue_worker_jobs_processed_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "status" => "success"
        )
        .increment(1);

        histogram!(
            "queue_worker_job_duration_seconds",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .record(duration.as_secs_f64());
    }

    pub fn job_failed(&self, category: &str) {
        counter!(
            "queue_worker_jobs_processed_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "status" => "failed"
        )
        .increment(1);

        counter!(
            "queue_worker_job_errors_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone(),
            "category" => category.to_string()
        )
        .increment(1);
    }

    /// Payload that could not be decoded into a job.
    pub fn job_malformed(&self) {
        counter!(
            "queue_worker_jobs_malformed_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }

    pub fn job_retried(&self) {
        counter!(
            "queue_worker_jobs_retried_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }

    pub fn job_dead_lettered(&self) {
        counter!(
            "queue_worker_jobs_dlq_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }

    pub fn job_dropped(&self) {
        counter!(
            "queue_worker_jobs_dropped_total",
            "queue" => self.queue_name.clone(),
            "processor" => self.processor_name.clone()
        )
        .increment(1);
    }

    pub fn queue_depth(&self, depth: usize) {
        gauge!(
            "queue_worker_queue_depth",
            "queue" => self.queue_name.clone()
        )
        .set(depth as f64);
    }

    pub fn connection_error(&self) {
        counter!(
            "queue_worker_connection_errors_total",
            "queue" => self.queue_name.clone()
        )
        .increment(1);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = QueueMetrics::new("test:queue", "test_processor");
        assert_eq!(metrics.queue_name, "test:queue");
        assert_eq!(metrics.processor_name, "test_processor");
    }

    #[test]
    fn test_init_metrics_is_idempotent() {
        init_metrics().unwrap();
        init_metrics().unwrap();
        metrics::counter!("queue_worker_test_total").increment(1);
        assert!(render_metrics().is_some());
    }
}
