

pub mod memory;
pub mod models;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

pub use memory::InMemoryStore;
pub use models::{
    EmbeddingFilter, Entity, EntityId, Message, MessageRole, NewRecommendation, Recommendation,
};


#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Backend error: {0}")]
    Backend(String),
}


/// Relational store collaborator for entities, messages and recommendations.
#[async_trait]
pub trait EntityStore: Send + Sync {
    async fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, StoreError>;

    async fn list_entities(&self, filter: EmbeddingFilter) -> Result<Vec<Entity>, StoreError>;

    async fn update_entity_embedding(
        &self,
        id: EntityId,
        embedding: Vec<f32>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError>;

    /// Newest first.
    async fn recent_messages(
        &self,
        entity_id: EntityId,
        role: MessageRole,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError>;

    async fn set_message_embedding(
        &self,
        message_id: u64,
        embedding: Vec<f32>,
    ) -> Result<(), StoreError>;

    /// Ordered by descending similarity score.
    async fn recommendations_for(
        &self,
        subject_id: EntityId,
    ) -> Result<Vec<Recommendation>, StoreError>;

    async fn recommendation_exists(
        &self,
        subject_id: EntityId,
        recommended_id: EntityId,
    ) -> Result<bool, StoreError>;

    async fn delete_recommendations_for(&self, subject_id: EntityId) -> Result<usize, StoreError>;

    /// `Ok(None)` when the (subject, recommended) pair already exists.
    async fn create_recommendation(
        &self,
        recommendation: NewRecommendation,
    ) -> Result<Option<Recommendation>, StoreError>;

    async fn mark_viewed(
        &self,
        subject_id: EntityId,
        recommendation_id: u64,
    ) -> Result<(), StoreError>;
}
