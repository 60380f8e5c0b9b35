

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use tracing::debug;

use super::models::{
    EmbeddingFilter, Entity, EntityId, Message, MessageRole, NewRecommendation, Recommendation,
};
use super::{EntityStore, StoreError};


#[derive(Default)]
struct Tables {
    entities: BTreeMap<EntityId, Entity>,
    messages: Vec<Message>,
    recommendations: Vec<Recommendation>,
    next_message_id: u64,
    next_recommendation_id: u64,
}


/// In-process implementation of [`EntityStore`], used by the evaluation harness and tests.
#[derive(Default)]
pub struct InMemoryStore {
    tables: RwLock<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_entity(&self, entity: Entity) {
        self.tables.write().entities.insert(entity.id, entity);
    }

    pub fn add_message(
        &self,
        entity_id: EntityId,
        role: MessageRole,
        content: impl Into<String>,
        created_at: DateTime<Utc>,
    ) -> u64 {
        let mut tables = self.tables.write();
        tables.next_message_id += 1;
        let id = tables.next_message_id;
        tables.messages.push(Message {
            id,
            entity_id,
            role,
            content: content.into(),
            embedding: None,
            created_at,
        });
        id
    }

    pub fn message(&self, message_id: u64) -> Option<Message> {
        self.tables
            .read()
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
    }

    pub fn recommendation_count(&self) -> usize {
        self.tables.read().recommendations.len()
    }
}

#[async_trait]
impl EntityStore for InMemoryStore {
    async fn get_entity(&self, id: EntityId) -> Result<Option<Entity>, StoreError> {
        Ok(self.tables.read().entities.get(&id).cloned())
    }

    async fn list_entities(&self, filter: EmbeddingFilter) -> Result<Vec<Entity>, StoreError> {
        Ok(self
            .tables
            .read()
            .entities
            .values()
            .filter(|e| filter.accepts(e.embedding.as_ref()))
            .cloned()
            .collect())
    }

    async fn update_entity_embedding(
        &self,
        id: EntityId,
        embedding: Vec<f32>,
        updated_at: DateTime<Utc>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let entity = tables
            .entities
            .get_mut(&id)
            .ok_or_else(|| StoreError::NotFound(format!("entity {id}")))?;
        entity.embedding = Some(embedding);
        entity.embedding_updated_at = Some(updated_at);
        Ok(())
    }

    async fn recent_messages(
        &self,
        entity_id: EntityId,
        role: MessageRole,
        limit: usize,
    ) -> Result<Vec<Message>, StoreError> {
        let tables = self.tables.read();
        let mut messages: Vec<Message> = tables
            .messages
            .iter()
            .filter(|m| m.entity_id == entity_id && m.role == role)
            .cloned()
            .collect();
        messages.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        messages.truncate(limit);
        Ok(messages)
    }

    async fn set_message_embedding(
        &self,
        message_id: u64,
        embedding: Vec<f32>,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let message = tables
            .messages
            .iter_mut()
            .find(|m| m.id == message_id)
            .ok_or_else(|| StoreError::NotFound(format!("message {message_id}")))?;
        message.embedding = Some(embedding);
        Ok(())
    }

    async fn recommendations_for(
        &self,
        subject_id: EntityId,
    ) -> Result<Vec<Recommendation>, StoreError> {
        let mut recommendations: Vec<Recommendation> = self
            .tables
            .read()
            .recommendations
            .iter()
            .filter(|r| r.subject_id == subject_id)
            .cloned()
            .collect();
        recommendations.sort_by(|a, b| b.similarity_score.total_cmp(&a.similarity_score));
        Ok(recommendations)
    }

    async fn recommendation_exists(
        &self,
        subject_id: EntityId,
        recommended_id: EntityId,
    ) -> Result<bool, StoreError> {
        Ok(self
            .tables
            .read()
            .recommendations
            .iter()
            .any(|r| r.subject_id == subject_id && r.recommended_id == recommended_id))
    }

    async fn delete_recommendations_for(&self, subject_id: EntityId) -> Result<usize, StoreError> {
        let mut tables = self.tables.write();
        let before = tables.recommendations.len();
        tables.recommendations.retain(|r| r.subject_id != subject_id);
        let removed = before - tables.recommendations.len();
        debug!("Deleted {} recommendations for entity {}", removed, subject_id);
        Ok(removed)
    }

    async fn create_recommendation(
        &self,
        recommendation: NewRecommendation,
    ) -> Result<Option<Recommendation>, StoreError> {
        let mut tables = self.tables.write();
        let duplicate = tables.recommendations.iter().any(|r| {
            r.subject_id == recommendation.subject_id
                && r.recommended_id == recommendation.recommended_id
        });
        if duplicate {
            return Ok(None);
        }

        tables.next_recommendation_id += 1;
        let created = Recommendation {
            id: tables.next_recommendation_id,
            subject_id: recommendation.subject_id,
            recommended_id: recommendation.recommended_id,
            similarity_score: recommendation.similarity_score,
            common_interests: recommendation.common_interests,
            explanation: recommendation.explanation,
            is_viewed: false,
            created_at: Utc::now(),
        };
        tables.recommendations.push(created.clone());
        Ok(Some(created))
    }

    async fn mark_viewed(
        &self,
        subject_id: EntityId,
        recommendation_id: u64,
    ) -> Result<(), StoreError> {
        let mut tables = self.tables.write();
        let recommendation = tables
            .recommendations
            .iter_mut()
            .find(|r| r.id == recommendation_id && r.subject_id == subject_id)
            .ok_or_else(|| StoreError::NotFound(format!("recommendation {recommendation_id}")))?;
        recommendation.is_viewed = true;
        Ok(())
    }
}
