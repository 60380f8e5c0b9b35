

use async_trait::async_trait;
use tracing::{debug, info};

use super::{MatchContext, MatchingStrategy, StrategyKind};
use crate::core::error::Result;
use crate::matching::budget::ComparisonBudget;
use crate::matching::metrics::{MatchTally, StrategyReport};
use crate::matching::population::Population;
use crate::matching::similarity::{SimilarityMatrix, cosine_similarity, top_k_neighbors};


/// Profile neighbors narrow the candidates; message similarity above the threshold picks
/// which message pairs reach the judge.
pub struct CombinedStrategy;

#[async_trait]
impl MatchingStrategy for CombinedStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::Combined
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

        let (owners, vectors): (Vec<usize>, Vec<Vec<f32>>) =
            ctx.profile_vectors(population).await.into_iter().unzip();
        let matrix = SimilarityMatrix::compute(&vectors);

        let mut messages: Vec<Vec<(&str, Vec<f32>)>> = Vec::with_capacity(participants.len());
        for participant in participants {
            let mut embedded = Vec::new();
            for message in participant.sample(config.max_messages_per_entity) {
                if let Some(vector) = ctx.message_vector(message).await {
                    embedded.push((message.as_str(), vector));
                }
            }
            messages.push(embedded);
        }

        'subjects: for (row, &owner_a) in owners.iter().enumerate() {
            for col in top_k_neighbors(&matrix, row, config.combined_top_k) {
                let owner_b = owners[col];
                let (subject, candidate) = (&participants[owner_a], &participants[owner_b]);
                debug!("Comparing messages of {} and {}", subject.id(), candidate.id());

                for (message_a, vector_a) in &messages[owner_a] {
                    for (message_b, vector_b) in &messages[owner_b] {
                        if budget.is_exhausted() {
                            break 'subjects;
                        }
                        let similarity = cosine_similarity(vector_a, vector_b);
                        if similarity <= config.message_similarity_threshold {
                            continue;
                        }

                        ctx.judge(
                            &mut tally,
                            budget,
                            (subject.id(), candidate.id()),
                            (*message_a, *message_b),
                            Some(similarity),
                        )
                        .await;
                    }
                }
            }
        }

        info!(
            "Combined strategy: {} comparisons, {} accepted",
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

    fn fixture() -> (Population, Fixture) {
        let population = Population::new(vec![
            participant(1, "chess", &["chess puzzles", "rainy day"]),
            participant(2, "board games", &["chess coaching"]),
            participant(3, "baking", &["bread"]),
        ]);
        let fixture = Fixture::new(&[
            (profile_key("chess").as_str(), vec![1.0, 0.0]),
            (profile_key("board games").as_str(), vec![0.9, -0.1]),
            (profile_key("baking").as_str(), vec![0.0, 1.0]),
            ("chess puzzles", vec![1.0, 0.0]),
            ("rainy day", vec![0.0, 1.0]),
            ("chess coaching", vec![0.95, 0.05]),
            ("bread", vec![0.1, 0.99]),
        ]);
        (population, fixture)
    }

    #[tokio::test]
    async fn test_only_similar_messages_reach_the_judge() {
        let (population, mut fixture) = fixture();
        fixture.config.combined_top_k = 1;
        let mut budget = ComparisonBudget::new(100);

        let report = CombinedStrategy
            .run(&population, &fixture.ctx(), &mut budget)
            .await
            .unwrap();

        // 1<->2 in both directions on the chess messages, 3->1 on bread/rainy day
        assert_eq!(report.metrics.total_comparisons, 3);
        assert_eq!(report.metrics.accepted, 2);
        assert!(
            report
                .comparisons
                .iter()
                .all(|c| c.similarity.is_some_and(|s| s > 0.4))
        );
    }

    #[tokio::test]
    async fn test_combined_respects_budget() {
        let (population, fixture) = fixture();
        let mut budget = ComparisonBudget::new(1);

        let report = CombinedStrategy
            .run(&population, &fixture.ctx(), &mut budget)
            .await
            .unwrap();
        assert_eq!(report.metrics.total_comparisons, 1);
        assert!(report.metrics.budget_exhausted);
    }
}
