

use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, warn};

use super::cache::{CacheStats, EmbeddingCache, EmbeddingKey};
use crate::core::Pacer;
use crate::core::error::Result;
use crate::llm::embeddings::EmbeddingProvider;
use crate::store::EntityId;


/// Outcome of an embedding lookup. Degraded results are tagged, never silently mixed in.
#[derive(Debug, Clone, PartialEq)]
pub enum Embedding {
    Available(Vec<f32>),
    /// Random stand-in produced after a provider failure.
    Synthetic(Vec<f32>),
    Unavailable,
}

impl Embedding {
    pub fn vector(&self) -> Option<&[f32]> {
        match self {
            Self::Available(v) | Self::Synthetic(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    pub fn into_vector(self) -> Option<Vec<f32>> {
        match self {
            Self::Available(v) | Self::Synthetic(v) => Some(v),
            Self::Unavailable => None,
        }
    }

    pub fn is_degraded(&self) -> bool {
        !matches!(self, Self::Available(_))
    }
}


#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FallbackPolicy {
    /// Production matching: report the item as unavailable.
    Skip,
    /// Evaluation continuity: substitute a random vector of the expected size.
    RandomVector { dimensions: usize },
}


/// Cache-first access to the embedding provider; provider failures never propagate.
pub struct EmbeddingAdapter {
    provider: Arc<dyn EmbeddingProvider>,
    cache: EmbeddingCache,
    policy: FallbackPolicy,
    pacer: Pacer,
    rng: Mutex<StdRng>,
    provider_calls: AtomicUsize,
    failures: AtomicUsize,
}

impl EmbeddingAdapter {
    pub fn new(
        provider: Arc<dyn EmbeddingProvider>,
        cache: EmbeddingCache,
        policy: FallbackPolicy,
        pacer: Pacer,
        seed: u64,
    ) -> Self {
        Self {
            provider,
            cache,
            policy,
            pacer,
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
            provider_calls: AtomicUsize::new(0),
            failures: AtomicUsize::new(0),
        }
    }

    pub async fn get_embedding(&self, key: &EmbeddingKey, text: &str) -> Embedding {
        if let Some(cached) = self.cache.get(key) {
            debug!("Cache HIT for {:?}", short_key(key));
            return Embedding::Available(cached);
        }

        if text.trim().is_empty() {
            debug!("Nothing to embed for {:?}", short_key(key));
            return Embedding::Unavailable;
        }

        self.provider_calls.fetch_add(1, Ordering::Relaxed);
        let result = self.provider.embed(text).await;
        self.pacer.pause().await;

        match result {
            Ok(vector) => {
                self.cache.insert(key.clone(), vector.clone());
                Embedding::Available(vector)
            }
            Err(e) => {
                self.failures.fetch_add(1, Ordering::Relaxed);
                warn!(
                    "Embedding provider failed for '{}': {}",
                    crate::safe_truncate(text, 30),
                    e
                );
                self.degraded()
            }
        }
    }

    pub async fn profile_embedding(&self, entity_id: EntityId, text: &str) -> Embedding {
        self.get_embedding(&EmbeddingKey::Profile(entity_id), text).await
    }

    pub async fn message_embedding(&self, text: &str) -> Embedding {
        self.get_embedding(&EmbeddingKey::Message(text.to_string()), text)
            .await
    }

    fn degraded(&self) -> Embedding {
        match self.policy {
            FallbackPolicy::Skip => Embedding::Unavailable,
            FallbackPolicy::RandomVector { dimensions } => {
                let mut rng = self.rng.lock();
                Embedding::Synthetic((0..dimensions).map(|_| rng.random::<f32>()).collect())
            }
        }
    }

    pub fn flush(&self, dir: &Path) -> Result<()> {
        self.cache.flush(dir)
    }

    pub fn cache(&self) -> &EmbeddingCache {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn provider_calls(&self) -> usize {
        self.provider_calls.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> usize {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn dimensions(&self) -> usize {
        self.provider.dimensions()
    }
}

fn short_key(key: &EmbeddingKey) -> String {
    match key {
        EmbeddingKey::Profile(id) => format!("profile:{id}"),
        EmbeddingKey::Message(text) => format!("message:{}", crate::safe_truncate(text, 30)),
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::llm::embeddings::EmbeddingError;
    use async_trait::async_trait;
    use std::collections::HashMap;

    /// Returns scripted vectors per text; unknown texts fail.
    pub(crate) struct ScriptedEmbeddings {
        pub vectors: HashMap<String, Vec<f32>>,
        pub calls: AtomicUsize,
        pub dims: usize,
    }

    impl ScriptedEmbeddings {
        pub(crate) fn new(entries: &[(&str, Vec<f32>)]) -> Self {
            let dims = entries.first().map(|(_, v)| v.len()).unwrap_or(2);
            Self {
                vectors: entries
                    .iter()
                    .map(|(text, v)| (text.to_string(), v.clone()))
                    .collect(),
                calls: AtomicUsize::new(0),
                dims,
            }
        }
    }

    #[async_trait]
    impl EmbeddingProvider for ScriptedEmbeddings {
        async fn embed(&self, text: &str) -> std::result::Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            self.vectors
                .get(text)
                .cloned()
                .ok_or_else(|| EmbeddingError::InvalidResponse("service unavailable".to_string()))
        }

        fn dimensions(&self) -> usize {
            self.dims
        }

        fn model_name(&self) -> &str {
            "scripted"
        }
    }

    fn adapter(provider: Arc<ScriptedEmbeddings>, policy: FallbackPolicy) -> EmbeddingAdapter {
        EmbeddingAdapter::new(provider, EmbeddingCache::new(), policy, Pacer::disabled(), 7)
    }

    #[tokio::test]
    async fn test_second_call_served_from_cache() {
        let provider = Arc::new(ScriptedEmbeddings::new(&[("hello", vec![1.0, 0.0])]));
        let adapter = adapter(provider.clone(), FallbackPolicy::Skip);

        let first = adapter.message_embedding("hello").await;
        let second = adapter.message_embedding("hello").await;

        assert_eq!(first, Embedding::Available(vec![1.0, 0.0]));
        assert_eq!(first, second);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 1);
        assert_eq!(adapter.provider_calls(), 1);
    }

    #[tokio::test]
    async fn test_profile_and_message_keys_are_separate() {
        let provider = Arc::new(ScriptedEmbeddings::new(&[("hello", vec![1.0, 0.0])]));
        let adapter = adapter(provider.clone(), FallbackPolicy::Skip);

        adapter.profile_embedding(1, "hello").await;
        adapter.message_embedding("hello").await;
        adapter.profile_embedding(1, "hello").await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_failure_with_skip_policy() {
        let provider = Arc::new(ScriptedEmbeddings::new(&[]));
        let adapter = adapter(provider, FallbackPolicy::Skip);

        let embedding = adapter.message_embedding("unknown").await;
        assert_eq!(embedding, Embedding::Unavailable);
        assert!(embedding.is_degraded());
        assert_eq!(adapter.failures(), 1);
    }

    #[tokio::test]
    async fn test_failure_with_random_policy_is_tagged_and_not_cached() {
        let provider = Arc::new(ScriptedEmbeddings::new(&[]));
        let adapter = adapter(provider.clone(), FallbackPolicy::RandomVector { dimensions: 16 });

        let embedding = adapter.message_embedding("unknown").await;
        match &embedding {
            Embedding::Synthetic(v) => assert_eq!(v.len(), 16),
            other => panic!("expected synthetic vector, got {other:?}"),
        }
        assert!(!adapter.cache().contains(&EmbeddingKey::Message("unknown".to_string())));

        adapter.message_embedding("unknown").await;
        assert_eq!(provider.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_blank_text_skips_provider() {
        let provider = Arc::new(ScriptedEmbeddings::new(&[]));
        let adapter = adapter(provider.clone(), FallbackPolicy::Skip);
        assert_eq!(adapter.profile_embedding(3, "  ").await, Embedding::Unavailable);
        assert_eq!(provider.calls.load(Ordering::SeqCst), 0);
    }
}
