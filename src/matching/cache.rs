

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::RwLock;
use serde::de::DeserializeOwned;
use tracing::{info, warn};

use crate::core::error::Result;
use crate::store::EntityId;

pub const PROFILE_CACHE_FILE: &str = "user_embeddings.json";
pub const MESSAGE_CACHE_FILE: &str = "message_embeddings.json";


/// Profile embeddings are keyed by entity id, message embeddings by their literal text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EmbeddingKey {
    Profile(EntityId),
    Message(String),
}


#[derive(Debug, Default, Clone, PartialEq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub profiles: usize,
    pub messages: usize,
}

impl CacheStats {
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}


/// Run-scoped embedding cache. Entries are never evicted or invalidated.
#[derive(Default)]
pub struct EmbeddingCache {
    profiles: RwLock<BTreeMap<EntityId, Vec<f32>>>,
    messages: RwLock<BTreeMap<String, Vec<f32>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl EmbeddingCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Missing files start empty; unreadable files are logged and ignored.
    pub fn load(dir: &Path) -> Self {
        let cache = Self::new();
        let profiles_path = dir.join(PROFILE_CACHE_FILE);
        if let Some(profiles) = read_entries::<BTreeMap<EntityId, Vec<f32>>>(&profiles_path) {
            info!("Loaded {} profile embeddings", profiles.len());
            *cache.profiles.write() = profiles;
        }
        let messages_path = dir.join(MESSAGE_CACHE_FILE);
        if let Some(messages) = read_entries::<BTreeMap<String, Vec<f32>>>(&messages_path) {
            info!("Loaded {} message embeddings", messages.len());
            *cache.messages.write() = messages;
        }
        cache
    }

    pub fn flush(&self, dir: &Path) -> Result<()> {
        std::fs::create_dir_all(dir)?;

        let profiles = self.profiles.read();
        std::fs::write(dir.join(PROFILE_CACHE_FILE), serde_json::to_vec(&*profiles)?)?;

        let messages = self.messages.read();
        std::fs::write(dir.join(MESSAGE_CACHE_FILE), serde_json::to_vec(&*messages)?)?;

        info!(
            "Saved {} profile embeddings and {} message embeddings",
            profiles.len(),
            messages.len()
        );
        Ok(())
    }

    pub fn get(&self, key: &EmbeddingKey) -> Option<Vec<f32>> {
        let found = match key {
            EmbeddingKey::Profile(id) => self.profiles.read().get(id).cloned(),
            EmbeddingKey::Message(text) => self.messages.read().get(text).cloned(),
        };
        let counter = if found.is_some() { &self.hits } else { &self.misses };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// First write wins: an existing entry is kept.
    pub fn insert(&self, key: EmbeddingKey, embedding: Vec<f32>) {
        match key {
            EmbeddingKey::Profile(id) => {
                self.profiles.write().entry(id).or_insert(embedding);
            }
            EmbeddingKey::Message(text) => {
                self.messages.write().entry(text).or_insert(embedding);
            }
        }
    }

    pub fn contains(&self, key: &EmbeddingKey) -> bool {
        match key {
            EmbeddingKey::Profile(id) => self.profiles.read().contains_key(id),
            EmbeddingKey::Message(text) => self.messages.read().contains_key(text),
        }
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
            profiles: self.profiles.read().len(),
            messages: self.messages.read().len(),
        }
    }
}

fn read_entries<T: DeserializeOwned>(path: &Path) -> Option<T> {
    if !path.exists() {
        return None;
    }
    let parsed = std::fs::read(path)
        .map_err(|e| e.to_string())
        .and_then(|bytes| serde_json::from_slice(&bytes).map_err(|e| e.to_string()));
    match parsed {
        Ok(entries) => Some(entries),
        Err(e) => {
            warn!("Ignoring unreadable embedding cache {}: {}", path.display(), e);
            None
        }
    }
}
