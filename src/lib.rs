

pub mod core;
pub mod eval;
pub mod index;
pub mod llm;
pub mod matching;
pub mod recommend;
pub mod store;
pub mod utils;

pub use utils::{safe_truncate, safe_truncate_ellipsis};


pub use crate::core::config::KindredConfig;
pub use crate::core::error::{KindredError, Result};
pub use matching::{EmbeddingAdapter, MatchingStrategy, RunMetrics, StrategyKind};
pub use recommend::{GenerationOutcome, RecommendationService};


pub const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";


pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";


pub const DEFAULT_LLM_MODEL: &str = "gpt-4.1-nano";


pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";


pub const DEFAULT_EMBEDDING_DIMENSIONS: usize = 1536;
