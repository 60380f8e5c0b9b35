

mod brute_force;
mod combined;
mod message;
mod profile;

pub use brute_force::BruteForceStrategy;
pub use combined::CombinedStrategy;
pub use message::MessageEmbeddingStrategy;
pub use profile::ProfileEmbeddingStrategy;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};
use tracing::debug;

use super::adapter::{Embedding, EmbeddingAdapter};
use super::budget::ComparisonBudget;
use super::config::MatchingConfig;
use super::metrics::{ComparisonRecord, MatchTally, StrategyReport};
use super::population::Population;
use crate::core::error::Result;
use crate::llm::judge::RelevanceJudge;
use crate::store::EntityId;


#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Serialize,
    Deserialize,
    EnumString,
    IntoStaticStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum StrategyKind {
    UserEmbedding,
    BruteForce,
    MessageEmbedding,
    Combined,
}

impl StrategyKind {
    /// Evaluation order.
    pub const ALL: [StrategyKind; 4] = [
        StrategyKind::UserEmbedding,
        StrategyKind::BruteForce,
        StrategyKind::MessageEmbedding,
        StrategyKind::Combined,
    ];

    pub fn as_str(&self) -> &'static str {
        self.into()
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::UserEmbedding => "Profile embedding",
            Self::BruteForce => "Brute force",
            Self::MessageEmbedding => "Message embedding",
            Self::Combined => "Combined",
        }
    }

    pub fn strategy(&self) -> Box<dyn MatchingStrategy> {
        match self {
            Self::UserEmbedding => Box::new(ProfileEmbeddingStrategy),
            Self::BruteForce => Box::new(BruteForceStrategy),
            Self::MessageEmbedding => Box::new(MessageEmbeddingStrategy),
            Self::Combined => Box::new(CombinedStrategy),
        }
    }
}

impl std::fmt::Display for StrategyKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}


/// Collaborators shared by every strategy in a session.
pub struct MatchContext<'a> {
    pub adapter: &'a EmbeddingAdapter,
    pub judge: &'a RelevanceJudge,
    pub config: &'a MatchingConfig,
}


#[async_trait]
pub trait MatchingStrategy: Send + Sync {
    fn kind(&self) -> StrategyKind;

    /// Runs until done or until `budget` is exhausted; partial results are still reported.
    async fn run(
        &self,
        population: &Population,
        ctx: &MatchContext<'_>,
        budget: &mut ComparisonBudget,
    ) -> Result<StrategyReport>;
}


impl MatchContext<'_> {
    fn usable(&self, embedding: Embedding) -> Option<Vec<f32>> {
        match embedding {
            Embedding::Available(v) => Some(v),
            Embedding::Synthetic(v) if self.config.include_degraded => Some(v),
            _ => None,
        }
    }

    /// Profile vectors as `(participant index, vector)`; participants without one are skipped.
    async fn profile_vectors(&self, population: &Population) -> Vec<(usize, Vec<f32>)> {
        let mut vectors = Vec::with_capacity(population.len());
        for (index, participant) in population.participants().iter().enumerate() {
            let Some(text) = participant.profile_text() else {
                debug!("Entity {} has no profile text, skipping", participant.id());
                continue;
            };
            let embedding = self.adapter.profile_embedding(participant.id(), text).await;
            match self.usable(embedding) {
                Some(vector) => vectors.push((index, vector)),
                None => debug!("No usable profile embedding for entity {}", participant.id()),
            }
        }
        vectors
    }

    async fn message_vector(&self, text: &str) -> Option<Vec<f32>> {
        let embedding = self.adapter.message_embedding(text).await;
        self.usable(embedding)
    }

    /// One relevance check, charged to `budget` and recorded in `tally`.
    async fn judge(
        &self,
        tally: &mut MatchTally,
        budget: &mut ComparisonBudget,
        (entity_a, entity_b): (EntityId, EntityId),
        (message_a, message_b): (&str, &str),
        similarity: Option<f64>,
    ) {
        let relevant = self.judge.is_relevant(message_a, message_b).await;
        budget.record();
        tally.record(ComparisonRecord {
            entity_a,
            entity_b,
            message_a: message_a.to_string(),
            message_b: message_b.to_string(),
            similarity,
            relevant,
        });
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::core::Pacer;
    use crate::llm::providers::{GenerationOptions, LlmMetadata, LlmProvider, LlmProviderError};
    use crate::matching::adapter::FallbackPolicy;
    use crate::matching::adapter::tests::ScriptedEmbeddings;
    use crate::matching::cache::EmbeddingCache;
    use crate::matching::population::Participant;
    use crate::store::Entity;
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Answers "yes" when both messages in the prompt mention `keyword`.
    pub(crate) struct KeywordJudge {
        pub keyword: &'static str,
        pub calls: AtomicUsize,
    }

    impl KeywordJudge {
        pub(crate) fn new(keyword: &'static str) -> Self {
            Self {
                keyword,
                calls: AtomicUsize::new(0),
            }
        }
    }

    #[async_trait]
    impl LlmProvider for KeywordJudge {
        async fn generate(
            &self,
            _system_prompt: &str,
            user_prompt: &str,
            _options: &GenerationOptions,
        ) -> std::result::Result<(String, LlmMetadata), LlmProviderError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let answer = if user_prompt.matches(self.keyword).count() >= 2 {
                "yes"
            } else {
                "no"
            };
            Ok((answer.to_string(), LlmMetadata::default()))
        }

        fn provider_name(&self) -> &str {
            "keyword"
        }

        fn model_name(&self) -> &str {
            "keyword"
        }
    }

    pub(crate) struct Fixture {
        pub embeddings: Arc<ScriptedEmbeddings>,
        pub llm: Arc<KeywordJudge>,
        pub adapter: EmbeddingAdapter,
        pub judge: RelevanceJudge,
        pub config: MatchingConfig,
    }

    impl Fixture {
        pub(crate) fn new(vectors: &[(&str, Vec<f32>)]) -> Self {
            let embeddings = Arc::new(ScriptedEmbeddings::new(vectors));
            let llm = Arc::new(KeywordJudge::new("chess"));
            let adapter = EmbeddingAdapter::new(
                embeddings.clone(),
                EmbeddingCache::new(),
                FallbackPolicy::Skip,
                Pacer::disabled(),
                42,
            );
            let judge = RelevanceJudge::new(llm.clone(), Pacer::disabled());
            Self {
                embeddings,
                llm,
                adapter,
                judge,
                config: MatchingConfig {
                    profile_includes_messages: false,
                    ..MatchingConfig::default()
                },
            }
        }

        pub(crate) fn ctx(&self) -> MatchContext<'_> {
            MatchContext {
                adapter: &self.adapter,
                judge: &self.judge,
                config: &self.config,
            }
        }

        pub(crate) fn judge_calls(&self) -> usize {
            self.llm.calls.load(Ordering::SeqCst)
        }
    }

    pub(crate) fn participant(id: EntityId, interests: &str, messages: &[&str]) -> Participant {
        Participant::new(
            Entity::new(id, format!("user{id}")).with_interests(interests),
            messages.iter().map(|m| m.to_string()).collect(),
            false,
        )
    }

    pub(crate) fn profile_key(interests: &str) -> String {
        format!("Interests: {interests}\nBio: ")
    }

    #[test]
    fn test_strategy_names() {
        let names: Vec<&str> = StrategyKind::ALL.iter().map(|k| k.as_str()).collect();
        assert_eq!(
            names,
            vec!["user_embedding", "brute_force", "message_embedding", "combined"]
        );
        assert_eq!(
            "message_embedding".parse::<StrategyKind>().unwrap(),
            StrategyKind::MessageEmbedding
        );
        assert_eq!(
            serde_json::to_string(&StrategyKind::UserEmbedding).unwrap(),
            "\"user_embedding\""
        );
    }

    #[test]
    fn test_strategy_factory_matches_kind() {
        for kind in StrategyKind::ALL {
            assert_eq!(kind.strategy().kind(), kind);
        }
    }
}
