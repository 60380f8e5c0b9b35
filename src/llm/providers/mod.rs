

pub mod base;
pub mod ollama;
pub mod openai;

pub use base::{GenerationOptions, LlmMetadata, LlmProvider, LlmProviderError};
pub use ollama::OllamaProvider;
pub use openai::OpenAiProvider;
