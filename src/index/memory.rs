

use std::collections::BTreeMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use super::{IndexMatch, IndexMetadata, VectorIndex};
use crate::core::error::Result;
use crate::matching::similarity::cosine_similarity;
use crate::store::EntityId;


/// Exact cosine search over every stored vector.
#[derive(Default)]
pub struct InMemoryVectorIndex {
    vectors: RwLock<BTreeMap<EntityId, (Vec<f32>, IndexMetadata)>>,
}

impl InMemoryVectorIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.vectors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.vectors.read().is_empty()
    }
}

#[async_trait]
impl VectorIndex for InMemoryVectorIndex {
    async fn upsert(&self, id: EntityId, vector: Vec<f32>, metadata: IndexMetadata) -> Result<()> {
        self.vectors.write().insert(id, (vector, metadata));
        Ok(())
    }

    async fn query(&self, vector: &[f32], top_k: usize) -> Result<Vec<IndexMatch>> {
        let vectors = self.vectors.read();
        let mut matches: Vec<IndexMatch> = vectors
            .iter()
            .map(|(id, (stored, metadata))| IndexMatch {
                entity_id: *id,
                score: cosine_similarity(vector, stored),
                metadata: metadata.clone(),
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then(a.entity_id.cmp(&b.entity_id))
        });
        matches.truncate(top_k);
        Ok(matches)
    }
}
