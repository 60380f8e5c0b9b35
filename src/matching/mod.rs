

pub mod adapter;
pub mod budget;
pub mod cache;
pub mod config;
pub mod metrics;
pub mod population;
pub mod similarity;
pub mod strategies;

pub use adapter::{Embedding, EmbeddingAdapter, FallbackPolicy};
pub use budget::ComparisonBudget;
pub use cache::{CacheStats, EmbeddingCache, EmbeddingKey};
pub use config::MatchingConfig;
pub use metrics::{ComparisonRecord, MatchTally, RunMetrics, StrategyReport, combined_score, gini};
pub use population::{Participant, Population};
pub use similarity::{SimilarityMatrix, cosine_similarity, top_k_neighbors};
pub use strategies::{MatchContext, MatchingStrategy, StrategyKind};
