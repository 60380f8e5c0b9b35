

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::error::{KindredError, Result};
use crate::matching::MatchingConfig;
use crate::recommend::RecommendConfig;

const ENV_PREFIX: &str = "KINDRED";
const SUPPORTED_PROVIDERS: [&str; 2] = ["openai", "ollama"];


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KindredConfig {
    pub llm_provider: String,
    pub llm_model: String,
    pub llm_api_key: Option<String>,
    pub llm_base_url: Option<String>,
    pub llm_temperature: f64,

    pub embedding_provider: String,
    pub embedding_model: String,
    pub embedding_url: String,
    pub embedding_api_key: Option<String>,
    pub embedding_dimensions: usize,

    pub timeout: u64,

    pub data_dir: PathBuf,

    pub pacing: PacingConfig,
    pub matching: MatchingConfig,
    pub recommend: RecommendConfig,
}


#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PacingConfig {
    pub relevance_delay_ms: u64,
    pub embedding_delay_ms: u64,
    pub generation_delay_ms: u64,
}

impl Default for PacingConfig {
    fn default() -> Self {
        Self {
            relevance_delay_ms: 1000,
            embedding_delay_ms: 100,
            generation_delay_ms: 1000,
        }
    }
}

impl PacingConfig {
    pub fn disabled() -> Self {
        Self {
            relevance_delay_ms: 0,
            embedding_delay_ms: 0,
            generation_delay_ms: 0,
        }
    }
}

impl KindredConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            llm_provider: "openai".to_string(),
            llm_model: crate::DEFAULT_LLM_MODEL.to_string(),
            llm_api_key: None,
            llm_base_url: None,
            llm_temperature: 0.7,

            embedding_provider: "openai".to_string(),
            embedding_model: crate::DEFAULT_EMBEDDING_MODEL.to_string(),
            embedding_url: crate::DEFAULT_OPENAI_URL.to_string(),
            embedding_api_key: None,
            embedding_dimensions: crate::DEFAULT_EMBEDDING_DIMENSIONS,

            timeout: 30,

            data_dir: data_dir.into(),

            pacing: PacingConfig::default(),
            matching: MatchingConfig::default(),
            recommend: RecommendConfig::default(),
        }
    }

    /// Defaults, then the optional file, then `KINDRED_*` variables (nested keys use `__`).
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let defaults = config::Config::try_from(&Self::default())
            .map_err(|e| KindredError::config(e.to_string()))?;

        let mut builder = config::Config::builder().add_source(defaults);
        if let Some(path) = path {
            debug!("Loading configuration file {}", path.display());
            builder = builder.add_source(config::File::from(path).required(true));
        }
        builder = builder.add_source(
            config::Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let mut loaded: Self = builder
            .build()
            .and_then(|c| c.try_deserialize())
            .map_err(|e| KindredError::config(e.to_string()))?;

        if let Ok(key) = std::env::var("OPENAI_API_KEY") {
            if loaded.llm_api_key.is_none() && loaded.llm_provider == "openai" {
                loaded.llm_api_key = Some(key.clone());
            }
            if loaded.embedding_api_key.is_none() && loaded.embedding_provider == "openai" {
                loaded.embedding_api_key = Some(key);
            }
        }

        Ok(loaded)
    }

    /// Credentials and endpoints are checked once, before any run starts.
    pub fn validate(&self) -> Result<()> {
        let providers = [
            ("LLM", &self.llm_provider),
            ("embedding", &self.embedding_provider),
        ];
        for (role, provider) in providers {
            if !SUPPORTED_PROVIDERS.contains(&provider.as_str()) {
                return Err(KindredError::config(format!(
                    "Unknown {role} provider: {provider}. Supported: openai, ollama"
                )));
            }
        }

        if self.llm_provider == "openai" && self.llm_api_key.as_deref().is_none_or(str::is_empty) {
            return Err(KindredError::config(
                "OPENAI_API_KEY (or KINDRED_LLM_API_KEY) is not set",
            ));
        }
        if self.embedding_provider == "openai"
            && self.embedding_api_key.as_deref().is_none_or(str::is_empty)
        {
            return Err(KindredError::config(
                "OPENAI_API_KEY (or KINDRED_EMBEDDING_API_KEY) is not set",
            ));
        }

        url::Url::parse(&self.embedding_url)
            .map_err(|e| KindredError::config(format!("Invalid embedding_url: {e}")))?;
        if let Some(base_url) = &self.llm_base_url {
            url::Url::parse(base_url)
                .map_err(|e| KindredError::config(format!("Invalid llm_base_url: {e}")))?;
        }

        if self.embedding_dimensions == 0 {
            return Err(KindredError::config("embedding_dimensions must be positive"));
        }

        Ok(())
    }

    pub fn results_dir(&self) -> PathBuf {
        self.data_dir.join("results")
    }

    pub fn embeddings_dir(&self) -> PathBuf {
        self.data_dir.join("embeddings")
    }
}

impl Default for KindredConfig {
    fn default() -> Self {
        Self::new("data")
    }
}
