

pub mod memory;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::error::Result;
use crate::store::EntityId;

pub use memory::InMemoryVectorIndex;


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct IndexMetadata {
    pub entity_id: EntityId,
    pub username: String,
    pub interests: String,
    pub bio: String,
}


#[derive(Debug, Clone, PartialEq)]
pub struct IndexMatch {
    pub entity_id: EntityId,
    pub score: f64,
    pub metadata: IndexMetadata,
}


/// Approximate nearest-neighbor service used on the serving path.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    async fn upsert(&self, id: EntityId, vector: Vec<f32>, metadata: IndexMetadata) -> Result<()>;

    /// Ranked by descending score.
    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>>;
}


/// Nearest entities to `entity_id`, never including `entity_id` itself.
pub async fn find_similar(
    index: &dyn VectorIndex,
    entity_id: EntityId,
    vector: &[f32],
    top_k: usize,
) -> Result<Vec<IndexMatch>> {
    let mut matches = index.query(vector, top_k + 1).await?;
    matches.retain(|m| m.entity_id != entity_id);
    matches.truncate(top_k);
    Ok(matches)
}
