

use serde::{Deserialize, Serialize};


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RecommendConfig {
    pub recommendation_top_k: usize,
    pub discovery_top_k: usize,
    pub discovery_max_subjects: usize,
    pub recent_message_limit: usize,
    /// Any single message pair above this is enough on its own.
    pub message_threshold: f64,
    /// Threshold for the blended profile/message score.
    pub relevance_threshold: f64,
    /// Regeneration only: used when one side has no message embeddings.
    pub min_profile_similarity: f64,
    pub explain: bool,
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            recommendation_top_k: 10,
            discovery_top_k: 5,
            discovery_max_subjects: 50,
            recent_message_limit: 20,
            message_threshold: 0.75,
            relevance_threshold: 0.7,
            min_profile_similarity: 0.0,
            explain: true,
        }
    }
}
