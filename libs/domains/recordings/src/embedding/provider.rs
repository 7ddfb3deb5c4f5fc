use async_trait::async_trait;
use tracing::warn;

use crate::error::{RecordingError, RecordingResult};

/// Converts text into a fixed-length vector.
///
/// Every vector a provider returns has exactly [`dimension`](Self::dimension)
/// components, including for empty text.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Provider name for logs.
    fn name(&self) -> &'static str;

    /// Length of every vector this provider produces.
    fn dimension(&self) -> usize;

    /// Embed `text`, surfacing transport and decoding failures.
    async fn try_embed(&self, text: &str) -> RecordingResult<Vec<f32>>;
}

/// Result of a fail-soft embedding.
#[derive(Debug, Clone, PartialEq)]
pub struct Embedding {
    pub values: Vec<f32>,
    /// The provider failed and `values` is all zeros.
    pub degraded: bool,
}

impl Embedding {
    pub fn zeros(dimension: usize) -> Self {
        Self {
            values: vec![0.0; dimension],
            degraded: true,
        }
    }
}

/// Embed `text`, falling back to a zero vector when the provider fails or
/// returns a vector of the wrong length.
pub async fn embed_or_zero(provider: &dyn EmbeddingProvider, text: &str) -> Embedding {
    let dimension = provider.dimension();

    let result = provider.try_embed(text).await.and_then(|values| {
        if values.len() == dimension {
            Ok(values)
        } else {
            Err(RecordingError::ProviderUnavailable(format!(
                "expected {} components, got {}",
                dimension,
                values.len()
            )))
        }
    });

    match result {
        Ok(values) => Embedding {
            values,
            degraded: false,
        },
        Err(e) => {
            warn!(
                provider = provider.name(),
                error = %e,
                text_len = text.len(),
                "Embedding failed, using zero vector"
            );
            Embedding::zeros(dimension)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn provider(dimension: usize) -> MockEmbeddingProvider {
        let mut mock = MockEmbeddingProvider::new();
        mock.expect_name().return_const("mock");
        mock.expect_dimension().return_const(dimension);
        mock
    }

    #[tokio::test]
    async fn test_success_passes_through() {
        let mut mock = provider(3);
        mock.expect_try_embed()
            .returning(|_| Ok(vec![0.1, 0.2, 0.3]));

        let embedding = embed_or_zero(&mock, "hello").await;
        assert_eq!(embedding.values, vec![0.1, 0.2, 0.3]);
        assert!(!embedding.degraded);
    }

    #[tokio::test]
    async fn test_failure_becomes_zero_vector() {
        let mut mock = provider(4);
        mock.expect_try_embed()
            .returning(|_| Err(RecordingError::ProviderUnavailable("timeout".into())));

        let embedding = embed_or_zero(&mock, "hello").await;
        assert_eq!(embedding, Embedding::zeros(4));
        assert!(embedding.degraded);
    }

    #[tokio::test]
    async fn test_wrong_length_becomes_zero_vector() {
        let mut mock = provider(4);
        mock.expect_try_embed().returning(|_| Ok(vec![1.0, 2.0]));

        let embedding = embed_or_zero(&mock, "").await;
        assert_eq!(embedding.values.len(), 4);
        assert!(embedding.degraded);
    }
}
