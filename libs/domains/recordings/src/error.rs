use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use core_config::ConfigError;
use queue_worker::QueueError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RecordingError {
    /// Embedding call failed. Providers recover from this locally with a zero
    /// vector, so it only escapes through `EmbeddingProvider::try_embed`.
    #[error("Embedding provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Vector store unavailable: {message}")]
    StoreUnavailable { message: String, retryable: bool },

    #[error("Malformed job: {0}")]
    MalformedJob(String),

    #[error("Invalid input: {0}")]
    Validation(String),

    #[error("Dimension mismatch: collection has {actual}, provider produces {expected}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("Queue error: {0}")]
    Queue(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type RecordingResult<T> = Result<T, RecordingError>;

impl RecordingError {
    pub fn store(message: impl Into<String>, retryable: bool) -> Self {
        RecordingError::StoreUnavailable {
            message: message.into(),
            retryable,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            RecordingError::StoreUnavailable {
                retryable: true,
                ..
            } | RecordingError::Queue(_)
        )
    }
}

impl From<qdrant_client::QdrantError> for RecordingError {
    fn from(err: qdrant_client::QdrantError) -> Self {
        // gRPC codes: DEADLINE_EXCEEDED, ABORTED, UNAVAILABLE.
        let retryable = match &err {
            qdrant_client::QdrantError::ResponseError { status } => {
                matches!(status.code() as i32, 4 | 10 | 14)
            }
            qdrant_client::QdrantError::ResourceExhaustedError { .. } => true,
            _ => false,
        };
        RecordingError::store(format!("Qdrant error: {}", err), retryable)
    }
}

impl From<reqwest::Error> for RecordingError {
    fn from(err: reqwest::Error) -> Self {
        let retryable = err.is_timeout()
            || err.is_connect()
            || err
                .status()
                .is_some_and(|s| s.is_server_error() || s.as_u16() == 429);
        RecordingError::store(err.to_string(), retryable)
    }
}

impl From<serde_json::Error> for RecordingError {
    fn from(err: serde_json::Error) -> Self {
        RecordingError::Internal(format!("JSON error: {}", err))
    }
}

impl From<ConfigError> for RecordingError {
    fn from(err: ConfigError) -> Self {
        RecordingError::Config(err.to_string())
    }
}

impl From<QueueError> for RecordingError {
    fn from(err: QueueError) -> Self {
        RecordingError::Queue(err.to_string())
    }
}

/// Failures surfaced to the ingestion worker decide whether a job may be requeued.
impl From<RecordingError> for QueueError {
    fn from(err: RecordingError) -> Self {
        if err.is_retryable() {
            QueueError::transient(err.to_string())
        } else {
            QueueError::permanent(err.to_string())
        }
    }
}

/// Convert RecordingError to AppError for standardized HTTP error responses
impl From<RecordingError> for AppError {
    fn from(err: RecordingError) -> Self {
        match err {
            RecordingError::Validation(msg) | RecordingError::MalformedJob(msg) => {
                AppError::BadRequest(msg)
            }
            RecordingError::StoreUnavailable {
                message,
                retryable: true,
            } => AppError::UpstreamUnavailable(message),
            RecordingError::StoreUnavailable {
                message,
                retryable: false,
            } => AppError::BadGateway(message),
            RecordingError::Queue(msg) => AppError::ServiceUnavailable(msg),
            RecordingError::ProviderUnavailable(msg) => {
                AppError::InternalServerError(format!("Embedding error: {}", msg))
            }
            RecordingError::DimensionMismatch { .. } => {
                AppError::InternalServerError(err.to_string())
            }
            RecordingError::Config(msg) => {
                AppError::InternalServerError(format!("Config error: {}", msg))
            }
            RecordingError::Internal(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl IntoResponse for RecordingError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use queue_worker::ErrorCategory;

    #[test]
    fn test_http_status_mapping() {
        let cases = [
            (RecordingError::Validation("id".into()), StatusCode::BAD_REQUEST),
            (RecordingError::MalformedJob("id".into()), StatusCode::BAD_REQUEST),
            (
                RecordingError::store("timeout", true),
                StatusCode::SERVICE_UNAVAILABLE,
            ),
            (RecordingError::store("rejected", false), StatusCode::BAD_GATEWAY),
            (RecordingError::Queue("down".into()), StatusCode::SERVICE_UNAVAILABLE),
            (
                RecordingError::DimensionMismatch {
                    expected: 4,
                    actual: 8,
                },
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
            (RecordingError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR),
        ];

        for (err, expected) in cases {
            let app: AppError = err.into();
            assert_eq!(app.status(), expected);
        }
    }

    #[test]
    fn test_queue_category_follows_retryability() {
        let transient: QueueError = RecordingError::store("timeout", true).into();
        assert_eq!(transient.category(), ErrorCategory::Transient);

        let permanent: QueueError = RecordingError::store("bad request", false).into();
        assert_eq!(permanent.category(), ErrorCategory::Permanent);

        let malformed: QueueError = RecordingError::MalformedJob("blank id".into()).into();
        assert_eq!(malformed.category(), ErrorCategory::Permanent);
    }

    #[test]
    fn test_dimension_mismatch_message() {
        let err = RecordingError::DimensionMismatch {
            expected: 1024,
            actual: 1536,
        };
        assert_eq!(
            err.to_string(),
            "Dimension mismatch: collection has 1536, provider produces 1024"
        );
    }
}
