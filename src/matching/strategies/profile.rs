

use async_trait::async_trait;
use rand::SeedableRng;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use tracing::info;

use super::{MatchContext, MatchingStrategy, StrategyKind};
use crate::core::error::Result;
use crate::matching::budget::ComparisonBudget;
use crate::matching::metrics::{MatchTally, StrategyReport};
use crate::matching::population::Population;
use crate::matching::similarity::{SimilarityMatrix, top_k_neighbors};


/// Nearest profiles first, then one sampled message from each side goes to the judge.
pub struct ProfileEmbeddingStrategy;

#[async_trait]
impl MatchingStrategy for ProfileEmbeddingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::UserEmbedding
    }

    async fn run(
        &self,
        population: &Population,
        ctx: &MatchContext<'_>,
        budget: &mut ComparisonBudget,
    ) -> Result<StrategyReport> {
        let config = ctx.config;
        let participants = population.participants();
        let mut tally = MatchTally::new(population.ids());
        let mut rng = StdRng::seed_from_u64(config.seed);

        let vectors = ctx.profile_vectors(population).await;
        info!(
            "Profile embeddings ready for {}/{} entities",
            vectors.len(),
            participants.len()
        );
        let (owners, vectors): (Vec<usize>, Vec<Vec<f32>>) = vectors.into_iter().unzip();
        let matrix = SimilarityMatrix::compute(&vectors);

        'subjects: for (row, &owner) in owners.iter().enumerate() {
            let subject = &participants[owner];
            let Some(message_a) = subject.sample(config.max_messages_per_entity).choose(&mut rng)
            else {
                continue;
            };

            for col in top_k_neighbors(&matrix, row, config.profile_top_k) {
                if budget.is_exhausted() {
                    break 'subjects;
                }
                let candidate = &participants[owners[col]];
                let Some(message_b) =
                    candidate.sample(config.max_messages_per_entity).choose(&mut rng)
                else {
                    continue;
                };

                ctx.judge(
                    &mut tally,
                    budget,
                    (subject.id(), candidate.id()),
                    (message_a.as_str(), message_b.as_str()),
                    Some(matrix.get(row, col)),
                )
                .await;
            }
        }

        info!(
            "Profile strategy: {} comparisons, {} accepted",
            tally.total(),
            tally.accepted()
        );
        Ok(tally.finish(self.kind(), budget.is_exhausted()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::{Fixture, participant, profile_key};
    use super::*;

    fn population() -> (Population, Vec<(String, Vec<f32>)>) {
        let population = Population::new(vec![
            participant(1, "chess, ai", &["I play chess every evening"]),
            participant(2, "chess, music", &["Looking for a chess partner"]),
            participant(3, "cooking", &["Best pasta recipe?"]),
            participant(4, "ai, music", &["Training a small model"]),
        ]);
        let vectors = vec![
            (profile_key("chess, ai"), vec![1.0, 0.0, 0.0]),
            (profile_key("chess, music"), vec![0.9, 0.1, 0.0]),
            (profile_key("cooking"), vec![0.0, 0.0, 1.0]),
            (profile_key("ai, music"), vec![0.5, 0.5, 0.0]),
        ];
        (population, vectors)
    }

    #[tokio::test]
    async fn test_profile_strategy_surfaces_nearest_neighbors() {
        let (population, vectors) = population();
        let entries: Vec<(&str, Vec<f32>)> =
            vectors.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
        let fixture = Fixture::new(&entries);
        let mut budget = ComparisonBudget::new(100);

        let report = ProfileEmbeddingStrategy
            .run(&population, &fixture.ctx(), &mut budget)
            .await
            .unwrap();

        let for_first: Vec<_> = report
            .comparisons
            .iter()
            .filter(|c| c.entity_a == 1)
            .map(|c| c.entity_b)
            .collect();
        assert_eq!(for_first, vec![2, 4, 3]);
        assert_eq!(report.metrics.total_comparisons, 12);
        assert!(report.comparisons.iter().all(|c| c.entity_a != c.entity_b));

        // only the two chess players are judged relevant, once from each side
        assert_eq!(report.metrics.accepted, 2);
        assert_eq!(report.metrics.per_entity_counts[&1], 2);
        assert_eq!(report.metrics.per_entity_counts[&3], 0);
        assert!(!report.metrics.budget_exhausted);
    }

    #[tokio::test]
    async fn test_profile_strategy_stops_at_budget() {
        let (population, vectors) = population();
        let entries: Vec<(&str, Vec<f32>)> =
            vectors.iter().map(|(k, v)| (k.as_str(), v.clone())).collect();
        let fixture = Fixture::new(&entries);
        let mut budget = ComparisonBudget::new(2);

        let report = ProfileEmbeddingStrategy
            .run(&population, &fixture.ctx(), &mut budget)
            .await
            .unwrap();
        assert_eq!(report.metrics.total_comparisons, 2);
        assert_eq!(fixture.judge_calls(), 2);
        assert!(report.metrics.budget_exhausted);
    }

    #[tokio::test]
    async fn test_missing_profile_embeddings_are_skipped() {
        let (population, _) = population();
        let fixture = Fixture::new(&[]);
        let mut budget = ComparisonBudget::new(10);

        let report = ProfileEmbeddingStrategy
            .run(&population, &fixture.ctx(), &mut budget)
            .await
            .unwrap();
        assert_eq!(report.metrics.total_comparisons, 0);
        assert_eq!(report.metrics.per_entity_counts.len(), 4);
        assert_eq!(report.metrics.combined_score, 0.0);
    }
}
