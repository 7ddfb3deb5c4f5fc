//! Worker configuration

use core_config::{ConfigError, FromEnv, env_optional, env_or_default, env_parse};
use std::time::Duration;

pub const DEFAULT_QUEUE_NAME: &str = "IMEAN_TESTING:VECTOR_SEARCH_QUEUE";

/// Configuration for the queue worker
#[derive(Debug, Clone)]
pub struct WorkerConfig {
    /// Redis list the worker consumes
    pub queue_name: String,

    /// Dead-letter list for jobs that will not be processed (None = drop)
    pub dead_letter_queue: Option<String>,

    /// Upper bound on a single blocking receive
    pub block_timeout: Duration,

    /// Requeue budget for transient failures (0 = never requeue)
    pub max_retries: u32,
}

impl WorkerConfig {
    pub fn new(queue_name: impl Into<String>) -> Self {
        Self {
            queue_name: queue_name.into(),
            dead_letter_queue: None,
            block_timeout: Duration::from_secs(2),
            max_retries: 0,
        }
    }

    pub fn with_dead_letter_queue(mut self, name: impl Into<String>) -> Self {
        self.dead_letter_queue = Some(name.into());
        self
    }

    pub fn with_block_timeout(mut self, timeout: Duration) -> Self {
        self.block_timeout = timeout;
        self
    }

    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }
}

impl FromEnv for WorkerConfig {
    /// - REDIS_QUEUE_NAME: defaults to `IMEAN_TESTING:VECTOR_SEARCH_QUEUE`
    /// - QUEUE_BLOCK_TIMEOUT_SECS: defaults to 2
    /// - QUEUE_MAX_RETRIES: defaults to 0
    /// - QUEUE_DLQ_NAME: optional
    fn from_env() -> Result<Self, ConfigError> {
        let block_secs: u64 = env_parse("QUEUE_BLOCK_TIMEOUT_SECS", 2)?;
        if block_secs == 0 {
            return Err(ConfigError::ParseError {
                key: "QUEUE_BLOCK_TIMEOUT_SECS".to_string(),
                details: "must be at least 1 second".to_string(),
            });
        }

        Ok(Self {
            queue_name: env_or_default("REDIS_QUEUE_NAME", DEFAULT_QUEUE_NAME),
            dead_letter_queue: env_optional("QUEUE_DLQ_NAME"),
            block_timeout: Duration::from_secs(block_secs),
            max_retries: env_parse("QUEUE_MAX_RETRIES", 0)?,
        })
    }
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self::new(DEFAULT_QUEUE_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_env_defaults() {
        temp_env::with_vars(
            [
                ("REDIS_QUEUE_NAME", None::<&str>),
                ("QUEUE_BLOCK_TIMEOUT_SECS", None),
                ("QUEUE_MAX_RETRIES", None),
                ("QUEUE_DLQ_NAME", None),
            ],
            || {
                let config = WorkerConfig::from_env().unwrap();
                assert_eq!(config.queue_name, DEFAULT_QUEUE_NAME);
                assert_eq!(config.block_timeout, Duration::from_secs(2));
                assert_eq!(config.max_retries, 0);
                assert!(config.dead_letter_queue.is_none());
            },
        );
    }

    #[test]
    fn test_from_env_overrides() {
        temp_env::with_vars(
            [
                ("REDIS_QUEUE_NAME", Some("recordings:ingest")),
                ("QUEUE_BLOCK_TIMEOUT_SECS", Some("5")),
                ("QUEUE_MAX_RETRIES", Some("3")),
                ("QUEUE_DLQ_NAME", Some("recordings:dlq")),
            ],
            || {
                let config = WorkerConfig::from_env().unwrap();
                assert_eq!(config.queue_name, "recordings:ingest");
                assert_eq!(config.block_timeout, Duration::from_secs(5));
                assert_eq!(config.max_retries, 3);
                assert_eq!(config.dead_letter_queue.as_deref(), Some("recordings:dlq"));
            },
        );
    }

    #[test]
    fn test_zero_block_timeout_rejected() {
        temp_env::with_var("QUEUE_BLOCK_TIMEOUT_SECS", Some("0"), || {
            let err = WorkerConfig::from_env().unwrap_err();
            assert!(err.to_string().contains("QUEUE_BLOCK_TIMEOUT_SECS"));
        });
    }

    #[test]
    fn test_builder_pattern() {
        let config = WorkerConfig::new("q")
            .with_dead_letter_queue("q:dlq")
            .with_block_timeout(Duration::from_millis(50))
            .with_max_retries(2);

        assert_eq!(config.queue_name, "q");
        assert_eq!(config.dead_letter_queue.as_deref(), Some("q:dlq"));
        assert_eq!(config.block_timeout, Duration::from_millis(50));
        assert_eq!(config.max_retries, 2);
    }
}
