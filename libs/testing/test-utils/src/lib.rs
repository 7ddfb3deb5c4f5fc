//! Shared test utilities
//!
//! - `TestRedis`: Redis container with automatic cleanup (feature: "redis")
//! - `TestQdrant`: Qdrant container exposing the gRPC endpoint
//! - `TestDataBuilder`: deterministic record and channel identifiers
//!
//! ```toml
//! [dev-dependencies]
//! test-utils = { workspace = true, features = ["redis"] }
//! ```

use uuid::Uuid;

mod qdrant;
#[cfg(feature = "redis")]
mod redis;

pub use qdrant::TestQdrant;

#[cfg(feature = "redis")]
pub use redis::TestRedis;

/// Builder for test data with deterministic identifiers.
///
/// Seeding from the test name keeps ids stable across runs while avoiding
/// collisions between tests that share a store.
pub struct TestDataBuilder {
    seed: u64,
}

impl TestDataBuilder {
    pub fn new(seed: u64) -> Self {
        Self { seed }
    }

    /// Create from test name (seed is the hash of the name).
    ///
    /// ```
    /// use test_utils::TestDataBuilder;
    ///
    /// let builder = TestDataBuilder::from_test_name("test_upsert_then_search");
    /// assert_eq!(builder.record_id("a"), builder.record_id("a"));
    /// ```
    pub fn from_test_name(name: &str) -> Self {
        use std::collections::hash_map::DefaultHasher;
        use std::hash::{Hash, Hasher};

        let mut hasher = DefaultHasher::new();
        name.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Deterministic UUID derived from the seed.
    pub fn uuid(&self) -> Uuid {
        let bytes = self.seed.to_le_bytes();
        let mut uuid_bytes = [0u8; 16];
        uuid_bytes[..8].copy_from_slice(&bytes);
        uuid_bytes[8..16].copy_from_slice(&bytes);
        Uuid::from_bytes(uuid_bytes)
    }

    /// Record id unique to this builder and `suffix`.
    pub fn record_id(&self, suffix: &str) -> String {
        format!("rec-{}-{}", self.seed, suffix)
    }

    /// Channel id unique to this builder and `suffix`.
    pub fn channel_id(&self, suffix: &str) -> String {
        format!("chan-{}-{}", self.seed, suffix)
    }

    /// Collection or queue name unique to this builder.
    pub fn name(&self, prefix: &str) -> String {
        format!("test-{}-{}", prefix, self.seed)
    }
}
