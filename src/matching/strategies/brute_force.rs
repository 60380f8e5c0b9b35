

use async_trait::async_trait;
use tracing::info;

use super::{MatchContext, MatchingStrategy, StrategyKind};
use crate::core::error::Result;
use crate::matching::budget::ComparisonBudget;
use crate::matching::metrics::{MatchTally, StrategyReport};
use crate::matching::population::Population;


/// Every pooled message against every later one from a different entity. No embeddings.
pub struct BruteForceStrategy;

#[async_trait]
impl MatchingStrategy for BruteForceStrategy {
    fn kind(&self) -> StrategyKind {
        StrategyKind::BruteForce
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
        info!("Brute force over {} pooled messages", pool.len());

        'outer: for (i, &(owner_a, message_a)) in pool.iter().enumerate() {
            for &(owner_b, message_b) in &pool[i + 1..] {
                if owner_a == owner_b {
                    continue;
                }
                if budget.is_exhausted() {
                    break 'outer;
                }

                ctx.judge(
                    &mut tally,
                    budget,
                    (participants[owner_a].id(), participants[owner_b].id()),
                    (message_a, message_b),
                    None,
                )
                .await;
            }
        }

        info!(
            "Brute force: {} comparisons, {} accepted",
            tally.total(),
            tally.accepted()
        );
        Ok(tally.finish(self.kind(), budget.is_exhausted()))
    }
}
