//! Weighted multi-field vectors.
//!
//! A record's vector is `embed(title) + embed(description) + w * embed(scenarios)`.
//! Summing keeps the stored vector at the provider's native size while the
//! weight biases similarity toward scenario matches.

use std::sync::Arc;

use crate::embedding::{EmbeddingProvider, embed_or_zero};
use crate::models::{Record, RecordField};

pub const DEFAULT_SCENARIO_WEIGHT: f32 = 2.0;

#[derive(Debug, Clone, PartialEq)]
pub struct WeightedVector {
    pub values: Vec<f32>,
    /// Fields whose embedding failed and contributed a zero vector.
    pub degraded_fields: Vec<RecordField>,
}

impl WeightedVector {
    pub fn is_degraded(&self) -> bool {
        !self.degraded_fields.is_empty()
    }
}

#[derive(Clone)]
pub struct WeightedVectorBuilder {
    provider: Arc<dyn EmbeddingProvider>,
    scenario_weight: f32,
}

impl WeightedVectorBuilder {
    pub fn new(provider: Arc<dyn EmbeddingProvider>) -> Self {
        Self {
            provider,
            scenario_weight: DEFAULT_SCENARIO_WEIGHT,
        }
    }

    pub fn with_scenario_weight(mut self, weight: f32) -> Self {
        self.scenario_weight = weight;
        self
    }

    pub fn dimension(&self) -> usize {
        self.provider.dimension()
    }

    pub fn scenario_weight(&self) -> f32 {
        self.scenario_weight
    }

    pub fn provider(&self) -> &Arc<dyn EmbeddingProvider> {
        &self.provider
    }

    pub async fn build(&self, title: &str, description: &str, scenarios: &str) -> WeightedVector {
        self.build_with_weight(title, description, scenarios, self.scenario_weight)
            .await
    }

    pub async fn build_record(&self, record: &Record) -> WeightedVector {
        self.build(&record.title, &record.description, &record.scenarios)
            .await
    }

    /// Embeds the three fields concurrently. Never fails: a field the
    /// provider cannot embed contributes zeros and is listed in
    /// `degraded_fields`.
    pub async fn build_with_weight(
        &self,
        title: &str,
        description: &str,
        scenarios: &str,
        scenario_weight: f32,
    ) -> WeightedVector {
        let provider = self.provider.as_ref();
        let (title, description, scenarios) = tokio::join!(
            embed_or_zero(provider, title),
            embed_or_zero(provider, description),
            embed_or_zero(provider, scenarios),
        );

        let mut degraded_fields = Vec::new();
        for (field, embedding) in [
            (RecordField::Title, &title),
            (RecordField::Description, &description),
            (RecordField::Scenarios, &scenarios),
        ] {
            if embedding.degraded {
                degraded_fields.push(field);
            }
        }

        let values = title
            .values
            .iter()
            .zip(&description.values)
            .zip(&scenarios.values)
            .map(|((t, d), s)| t + d + scenario_weight * s)
            .collect();

        WeightedVector {
            values,
            degraded_fields,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::WordProvider;

    #[tokio::test]
    async fn test_length_matches_provider_dimension() {
        let builder = WeightedVectorBuilder::new(Arc::new(WordProvider::new(16)));
        let long = "word ".repeat(10_000);

        for (t, d, s) in [("", "", ""), ("a", "b c", "d"), (long.as_str(), "", "x")] {
            let vector = builder.build(t, d, s).await;
            assert_eq!(vector.values.len(), 16);
            assert!(!vector.is_degraded());
        }
    }

    #[tokio::test]
    async fn test_weighted_sum_per_component() {
        let provider = Arc::new(WordProvider::new(8));
        let builder = WeightedVectorBuilder::new(provider.clone());

        let (t, d, s) = ("open settings", "settings page", "toggle dark mode");
        for weight in [0.0, 1.0, 2.0, 3.5] {
            let vector = builder.build_with_weight(t, d, s, weight).await;
            let (et, ed, es) = (provider.vector(t), provider.vector(d), provider.vector(s));
            for i in 0..8 {
                assert_eq!(vector.values[i], et[i] + ed[i] + weight * es[i]);
            }
        }
    }

    #[tokio::test]
    async fn test_default_weight_is_two() {
        let provider = Arc::new(WordProvider::new(8));
        let builder = WeightedVectorBuilder::new(provider.clone());
        assert_eq!(builder.scenario_weight(), DEFAULT_SCENARIO_WEIGHT);

        let vector = builder.build("", "", "scenario").await;
        let expected: Vec<f32> = provider.vector("scenario").iter().map(|v| v * 2.0).collect();
        assert_eq!(vector.values, expected);
    }

    #[tokio::test]
    async fn test_failed_field_contributes_zeros() {
        let provider = Arc::new(WordProvider::new(8).fail_on("broken description"));
        let builder = WeightedVectorBuilder::new(provider.clone()).with_scenario_weight(1.0);

        let vector = builder.build("title", "broken description", "steps").await;
        assert_eq!(vector.values.len(), 8);
        assert_eq!(vector.degraded_fields, vec![RecordField::Description]);

        let expected: Vec<f32> = provider
            .vector("title")
            .iter()
            .zip(provider.vector("steps"))
            .map(|(t, s)| t + s)
            .collect();
        assert_eq!(vector.values, expected);
    }
}
