

pub mod embeddings;
pub mod factory;
pub mod judge;
pub mod prompts;
pub mod providers;

pub use embeddings::{EmbeddingError, EmbeddingProvider, HttpEmbeddingProvider};
pub use factory::{EmbeddingProviderFactory, LlmProviderFactory};
pub use judge::RelevanceJudge;
pub use providers::{GenerationOptions, LlmProvider, LlmProviderError};
