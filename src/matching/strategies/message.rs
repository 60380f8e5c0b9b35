

use std::collections::HashSet;

use async_trait::async_trait;
use tracing::info;

use super::{MatchContext, MatchingStrategy, StrategyKind};
use crate::core::error::Result;
use crate::matching::budget::ComparisonBudget;
use crate::matching::metrics::{MatchTally, StrategyReport};
use crate::matching::population::Population;
use crate::matching::similarity::{SimilarityMatrix, top_k_neighbors_where};


pub struct MessageEmbeddingStrategy;

#[async_trait]
impl MatchingStrategy for MessageEmbeddingStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::MessageEmbedding
    }

    async fn run(
        &self,
        population: &Population,
        ctx: &MatchContext<'_>,
        budget: &mut ComparisonBudget,
    ) -> Result<StrategyReport> {
        let participants = population.participants();
        let pool = population.message_pool(ctx.config.max_messages_per_entity);
        let mut tally = MatchTally::new(population.ids());

        let mut embedded = Vec::with_capacity(pool.len());
        let mut vectors = Vec::with_capacity(pool.len());
        for &(owner, message) in &pool {
            if let Some(vector) = ctx.message_vector(message).await {
                embedded.push((owner, message));
                vectors.push(vector);
            }
        }
        info!("Embedded {}/{} pooled messages", embedded.len(), pool.len());

        let matrix = SimilarityMatrix::compute(&vectors);
        let mut examined: HashSet<(usize, usize)> = HashSet::new();

        'messages: for (row, &(owner_a, message_a)) in embedded.iter().enumerate() {
            let neighbors = top_k_neighbors_where(&matrix, row, ctx.config.message_top_k, |col| {
                embedded[col].0 != owner_a
            });

            for col in neighbors {
                if !examined.insert((row.min(col), row.max(col))) {
                    continue;
                }
                if budget.is_exhausted() {
                    break 'messages;
                }
                let (owner_b, message_b) = embedded[col];

                ctx.judge(
                    &mut tally,
                    budget,
                    (participants[owner_a].id(), participants[owner_b].id()),
                    (message_a, message_b),
                    Some(matrix.get(row, col)),
                )
                .await;
            }
        }

        info!(
            "Message strategy: {} comparisons, {} accepted",
            tally.total(),
            tally.accepted()
        );
        Ok(tally.finish(self.kind(), budget.is_exhausted()))
    }
}
