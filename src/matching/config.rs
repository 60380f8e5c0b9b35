

use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Relevance checks allowed across one evaluation session, split evenly between strategies.
    pub max_total_comparisons: usize,
    pub max_entities: usize,
    pub profile_top_k: usize,
    pub message_top_k: usize,
    pub combined_top_k: usize,
    pub max_messages_per_entity: usize,
    pub message_similarity_threshold: f64,
    pub seed: u64,
    /// Substitute random vectors when the embedding provider fails.
    pub random_fallback: bool,
    /// Let substituted vectors take part in similarity computations.
    pub include_degraded: bool,
    pub profile_includes_messages: bool,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            max_total_comparisons: 1000,
            max_entities: 10,
            profile_top_k: 3,
            message_top_k: 3,
            combined_top_k: 2,
            max_messages_per_entity: 5,
            message_similarity_threshold: 0.4,
            seed: 42,
            random_fallback: false,
            include_degraded: false,
            profile_includes_messages: true,
        }
    }
}
