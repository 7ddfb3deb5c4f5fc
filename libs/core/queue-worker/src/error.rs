//! Queue error types and error categorization
//!
//! Errors are categorized to determine retry behavior:
//! - **Transient**: temporary failure, the job may be requeued
//! - **Permanent**: the job can never succeed, drop or dead-letter it

use thiserror::Error;

/// Category of error for determining retry behavior
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Transient,
    Permanent,
}

impl ErrorCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCategory::Transient => "transient",
            ErrorCategory::Permanent => "permanent",
        }
    }

    /// Exponential backoff for reconnect attempts: 1s, 2s, 4s ... capped at 30s.
    pub fn backoff_delay_ms(&self, attempt: u32) -> u64 {
        const BASE_MS: u64 = 1000;
        const MAX_MS: u64 = 30_000;

        if *self == ErrorCategory::Permanent {
            return 0;
        }
        BASE_MS.saturating_mul(2u64.saturating_pow(attempt)).min(MAX_MS)
    }
}

/// Queue and processing errors
#[derive(Error, Debug)]
pub enum QueueError {
    /// Redis connection or command error
    #[error("Redis error: {0}")]
    Redis(#[from] redis::RedisError),

    /// Payload could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Job processing failed
    #[error("Processing error: {message}")]
    Processing {
        message: String,
        category: ErrorCategory,
    },

    #[error("Configuration error: {0}")]
    Config(String),
}

impl QueueError {
    pub fn transient(message: impl Into<String>) -> Self {
        QueueError::Processing {
            message: message.into(),
            category: ErrorCategory::Transient,
        }
    }

    pub fn permanent(message: impl Into<String>) -> Self {
        QueueError::Processing {
            message: message.into(),
            category: ErrorCategory::Permanent,
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            QueueError::Redis(_) => ErrorCategory::Transient,
            QueueError::Serialization(_) => ErrorCategory::Permanent,
            QueueError::Processing { category, .. } => *category,
            QueueError::Config(_) => ErrorCategory::Permanent,
        }
    }

    /// A job may be requeued while it is below the retry budget and the
    /// failure is transient.
    pub fn should_retry(&self, retry_count: u32, max_retries: u32) -> bool {
        self.category() == ErrorCategory::Transient && retry_count < max_retries
    }
}

impl From<serde_json::Error> for QueueError {
    fn from(err: serde_json::Error) -> Self {
        QueueError::Serialization(err.to_string())
    }
}
