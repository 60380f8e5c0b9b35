

use std::str::FromStr;
use std::sync::Arc;

use super::embeddings::{EmbeddingBackend, EmbeddingProvider, HttpEmbeddingProvider};
use super::providers::{LlmProvider, OllamaProvider, OpenAiProvider};
use crate::core::config::KindredConfig;
use crate::core::error::{KindredError, Result};


pub struct LlmProviderFactory;

impl LlmProviderFactory {
    pub fn create(
        provider: &str,
        model: &str,
        api_key: Option<&str>,
        base_url: Option<&str>,
        timeout_secs: u64,
    ) -> Result<Arc<dyn LlmProvider>> {
        match provider {
            "openai" => {
                let api_key = api_key
                    .ok_or_else(|| KindredError::config("openai provider requires an API key"))?;
                Ok(Arc::new(OpenAiProvider::new(
                    api_key,
                    model,
                    base_url.map(String::from),
                    timeout_secs,
                )?))
            }
            "ollama" => Ok(Arc::new(OllamaProvider::new(
                base_url.unwrap_or(crate::DEFAULT_OLLAMA_URL),
                model,
                timeout_secs,
            )?)),
            other => Err(KindredError::config(format!(
                "Unknown provider: {other}. Supported: openai, ollama"
            ))),
        }
    }

    pub fn from_config(config: &KindredConfig) -> Result<Arc<dyn LlmProvider>> {
        Self::create(
            &config.llm_provider,
            &config.llm_model,
            config.llm_api_key.as_deref(),
            config.llm_base_url.as_deref(),
            config.timeout,
        )
    }
}


pub struct EmbeddingProviderFactory;

impl EmbeddingProviderFactory {
    pub fn from_config(config: &KindredConfig) -> Result<Arc<dyn EmbeddingProvider>> {
        let backend = EmbeddingBackend::from_str(&config.embedding_provider).map_err(|_| {
            KindredError::config(format!(
                "Unknown embedding provider: {}. Supported: openai, ollama",
                config.embedding_provider
            ))
        })?;

        Ok(Arc::new(HttpEmbeddingProvider::new(
            backend,
            config.embedding_url.clone(),
            config.embedding_model.clone(),
            config.embedding_api_key.clone(),
            config.embedding_dimensions,
            config.timeout,
        )?))
    }
}
