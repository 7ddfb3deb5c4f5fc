//! Deterministic fakes shared by unit tests.

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use crate::embedding::EmbeddingProvider;
use crate::error::{RecordingError, RecordingResult};

/// Bag-of-words embedding: every lowercase word adds 1.0 to a bucket chosen
/// by a stable hash, so texts sharing words point the same way.
pub struct WordProvider {
    dimension: usize,
    failing: Mutex<HashSet<String>>,
}

impl WordProvider {
    pub fn new(dimension: usize) -> Self {
        Self {
            dimension,
            failing: Mutex::new(HashSet::new()),
        }
    }

    /// Make `try_embed(text)` fail.
    pub fn fail_on(self, text: &str) -> Self {
        self.failing.lock().unwrap().insert(text.to_string());
        self
    }

    pub fn vector(&self, text: &str) -> Vec<f32> {
        let mut values = vec![0.0; self.dimension];
        for word in text.split_whitespace() {
            let bucket = word
                .to_lowercase()
                .bytes()
                .fold(7usize, |acc, b| acc.wrapping_mul(31).wrapping_add(b as usize));
            values[bucket % self.dimension] += 1.0;
        }
        values
    }
}

#[async_trait]
impl EmbeddingProvider for WordProvider {
    fn name(&self) -> &'static str {
        "words"
    }

    fn dimension(&self) -> usize {
        self.dimension
    }

    async fn try_embed(&self, text: &str) -> RecordingResult<Vec<f32>> {
        if self.failing.lock().unwrap().contains(text) {
            return Err(RecordingError::ProviderUnavailable(format!("refused {:?}", text)));
        }
        Ok(self.vector(text))
    }
}
