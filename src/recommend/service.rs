

use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;
use tracing::{debug, error, info, warn};

use super::acceptance::assess;
use super::config::RecommendConfig;
use super::explain::Explainer;
use super::interests::common_interests;
use crate::core::error::Result;
use crate::index::{IndexMatch, IndexMetadata, VectorIndex, find_similar};
use crate::matching::{Embedding, EmbeddingAdapter};
use crate::store::{
    EmbeddingFilter, Entity, EntityId, EntityStore, MessageRole, NewRecommendation,
    Recommendation, StoreError,
};


#[derive(Debug, Clone, PartialEq)]
pub enum GenerationOutcome {
    Generated(Vec<Recommendation>),
    /// Not an error: the subject simply has too little to match on yet.
    NotEnoughData(String),
}


struct EmbeddedMessage {
    content: String,
    vector: Vec<f32>,
}

impl AsRef<[f32]> for EmbeddedMessage {
    fn as_ref(&self) -> &[f32] {
        &self.vector
    }
}


/// Serving-path recommendation pipeline over the store, vector index and embedding adapter.
pub struct RecommendationService {
    store: Arc<dyn EntityStore>,
    index: Arc<dyn VectorIndex>,
    adapter: Arc<EmbeddingAdapter>,
    explainer: Option<Explainer>,
    config: RecommendConfig,
}

impl RecommendationService {
    pub fn new(
        store: Arc<dyn EntityStore>,
        index: Arc<dyn VectorIndex>,
        adapter: Arc<EmbeddingAdapter>,
        explainer: Option<Explainer>,
        config: RecommendConfig,
    ) -> Self {
        Self {
            store,
            index,
            adapter,
            explainer,
            config,
        }
    }

    /// Re-embeds the profile, writes it back and upserts it into the index.
    pub async fn refresh_entity_embedding(&self, entity: &Entity) -> Result<Option<Vec<f32>>> {
        let Some(text) = entity.profile_text() else {
            debug!("Entity {} has an empty profile, nothing to embed", entity.id);
            return Ok(None);
        };

        // keyed by text, so an edited profile is embedded again
        let vector = match self.adapter.message_embedding(&text).await {
            Embedding::Available(v) => v,
            _ => {
                warn!("No profile embedding for entity {}", entity.id);
                return Ok(None);
            }
        };

        self.store
            .update_entity_embedding(entity.id, vector.clone(), Utc::now())
            .await?;
        self.index
            .upsert(
                entity.id,
                vector.clone(),
                IndexMetadata {
                    entity_id: entity.id,
                    username: entity.display_name().to_string(),
                    interests: entity.interests.clone(),
                    bio: entity.bio.clone(),
                },
            )
            .await?;

        Ok(Some(vector))
    }

    pub async fn update_all_embeddings(&self) -> Result<usize> {
        let entities = self.store.list_entities(EmbeddingFilter::Any).await?;
        let mut updated = 0;
        for entity in &entities {
            match self.refresh_entity_embedding(entity).await {
                Ok(Some(_)) => updated += 1,
                Ok(None) => {}
                Err(e) => error!("Failed to update embedding for entity {}: {}", entity.id, e),
            }
        }
        info!("Updated embeddings for {}/{} entities", updated, entities.len());
        Ok(updated)
    }

    /// Re-embeds the subject, then replaces its recommendations with a fresh set.
    ///
    /// Candidates are assessed and explained before anything is deleted, so a failed
    /// assessment leaves the previous set in place. A store error while writing the new
    /// rows can still leave a partial set.
    pub async fn generate_for_subject(&self, subject_id: EntityId) -> Result<GenerationOutcome> {
        let subject = self.entity(subject_id).await?;
        let Some(vector) = self.current_embedding(&subject).await? else {
            return Ok(GenerationOutcome::NotEnoughData(
                "Profile has no interests or bio to match on yet.".to_string(),
            ));
        };

        let matches = find_similar(
            self.index.as_ref(),
            subject_id,
            &vector,
            self.config.recommendation_top_k,
        )
        .await?;

        let subject_messages = self.embedded_messages(subject_id).await?;
        let mut pending = Vec::new();
        for candidate in &matches {
            let Some(other) = self.candidate(candidate).await? else {
                continue;
            };
            let other_messages = self.embedded_messages(other.id).await?;
            if let Some(recommendation) = self
                .propose(&subject, &subject_messages, &other, &other_messages, candidate.score)
                .await
            {
                pending.push(recommendation);
            }
        }

        let removed = self.store.delete_recommendations_for(subject_id).await?;
        debug!("Cleared {} previous recommendations for {}", removed, subject_id);

        let mut created = Vec::with_capacity(pending.len());
        for recommendation in pending {
            if let Some(recommendation) = self.store.create_recommendation(recommendation).await? {
                created.push(recommendation);
            }
        }

        info!(
            "Generated {} recommendations for entity {}",
            created.len(),
            subject_id
        );
        if created.is_empty() {
            Ok(GenerationOutcome::NotEnoughData(
                "No recommendations found. Try adding more interests or chatting more.".to_string(),
            ))
        } else {
            Ok(GenerationOutcome::Generated(created))
        }
    }

    /// Periodic batch over message evidence only: subjects and candidates without embedded
    /// messages are skipped, and existing pairs are kept.
    pub async fn discover_from_messages(&self) -> Result<usize> {
        let mut subjects = self
            .store
            .list_entities(EmbeddingFilter::WithEmbedding)
            .await?;
        subjects.shuffle(&mut rand::rng());
        subjects.truncate(self.config.discovery_max_subjects);

        let mut created = 0;
        for subject in &subjects {
            let Some(vector) = &subject.embedding else {
                continue;
            };
            let subject_messages = self.embedded_messages(subject.id).await?;
            if subject_messages.is_empty() {
                debug!("Entity {} has no embedded messages, skipping", subject.id);
                continue;
            }

            let matches = find_similar(
                self.index.as_ref(),
                subject.id,
                vector,
                self.config.discovery_top_k,
            )
            .await?;

            for candidate in &matches {
                if self
                    .store
                    .recommendation_exists(subject.id, candidate.entity_id)
                    .await?
                {
                    continue;
                }
                let Some(other) = self.candidate(candidate).await? else {
                    continue;
                };
                let other_messages = self.embedded_messages(other.id).await?;
                if other_messages.is_empty() {
                    continue;
                }

                let Some(recommendation) = self
                    .propose(subject, &subject_messages, &other, &other_messages, candidate.score)
                    .await
                else {
                    continue;
                };
                if self.store.create_recommendation(recommendation).await?.is_some() {
                    created += 1;
                }
            }
        }

        info!("Created {} new recommendations from message analysis", created);
        Ok(created)
    }

    pub async fn generate_for_all(&self) -> Result<usize> {
        let entities = self.store.list_entities(EmbeddingFilter::Any).await?;
        let mut total = 0;
        for entity in &entities {
            match self.generate_for_subject(entity.id).await {
                Ok(GenerationOutcome::Generated(recommendations)) => {
                    total += recommendations.len();
                }
                Ok(GenerationOutcome::NotEnoughData(reason)) => {
                    debug!("No recommendations for {}: {}", entity.id, reason);
                }
                Err(e) => error!("Recommendation generation failed for {}: {}", entity.id, e),
            }
        }
        info!("Generated {} recommendations for {} entities", total, entities.len());
        Ok(total)
    }

    pub async fn recommendations_for(&self, subject_id: EntityId) -> Result<Vec<Recommendation>> {
        Ok(self.store.recommendations_for(subject_id).await?)
    }

    pub async fn mark_viewed(&self, subject_id: EntityId, recommendation_id: u64) -> Result<()> {
        Ok(self.store.mark_viewed(subject_id, recommendation_id).await?)
    }

    async fn entity(&self, id: EntityId) -> Result<Entity> {
        self.store
            .get_entity(id)
            .await?
            .ok_or_else(|| StoreError::NotFound(format!("entity {id}")).into())
    }

    async fn candidate(&self, candidate: &IndexMatch) -> Result<Option<Entity>> {
        let entity = self.store.get_entity(candidate.entity_id).await?;
        if entity.is_none() {
            warn!("Index returned unknown entity {}", candidate.entity_id);
        }
        Ok(entity)
    }

    /// Fresh profile vector; the stored one only stands in when the provider is unavailable.
    async fn current_embedding(&self, entity: &Entity) -> Result<Option<Vec<f32>>> {
        if let Some(vector) = self.refresh_entity_embedding(entity).await? {
            return Ok(Some(vector));
        }
        match (&entity.embedding, entity.profile_text()) {
            (Some(vector), Some(_)) => {
                warn!("Using stored embedding for entity {}", entity.id);
                Ok(Some(vector.clone()))
            }
            _ => Ok(None),
        }
    }

    /// Recent authored messages with vectors; missing vectors are generated and stored.
    async fn embedded_messages(&self, entity_id: EntityId) -> Result<Vec<EmbeddedMessage>> {
        let messages = self
            .store
            .recent_messages(entity_id, MessageRole::User, self.config.recent_message_limit)
            .await?;

        let mut embedded = Vec::with_capacity(messages.len());
        for message in messages {
            let vector = match message.embedding {
                Some(vector) => vector,
                None => match self.adapter.message_embedding(&message.content).await {
                    Embedding::Available(vector) => {
                        self.store
                            .set_message_embedding(message.id, vector.clone())
                            .await?;
                        vector
                    }
                    _ => continue,
                },
            };
            embedded.push(EmbeddedMessage {
                content: message.content,
                vector,
            });
        }
        Ok(embedded)
    }

    /// Assesses the pair and, when accepted, builds the row with its explanation.
    async fn propose(
        &self,
        subject: &Entity,
        subject_messages: &[EmbeddedMessage],
        candidate: &Entity,
        candidate_messages: &[EmbeddedMessage],
        profile_similarity: f64,
    ) -> Option<NewRecommendation> {
        let Some(assessment) = assess(
            profile_similarity,
            subject_messages,
            candidate_messages,
            &self.config,
        ) else {
            debug!("Rejected {} -> {}", subject.id, candidate.id);
            return None;
        };

        let evidence = assessment.evidence.map(|(i, j)| {
            (
                subject_messages[i].content.as_str(),
                candidate_messages[j].content.as_str(),
            )
        });

        let explanation = match &self.explainer {
            Some(explainer) if self.config.explain => {
                Some(explainer.explain(subject, candidate, evidence).await)
            }
            _ => None,
        };

        Some(NewRecommendation {
            subject_id: subject.id,
            recommended_id: candidate.id,
            similarity_score: assessment.score,
            common_interests: common_interests(&subject.interests, &candidate.interests),
            explanation,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Pacer;
    use crate::index::InMemoryVectorIndex;
    use crate::matching::adapter::tests::ScriptedEmbeddings;
    use crate::matching::{EmbeddingCache, FallbackPolicy};
    use crate::store::InMemoryStore;

    fn profile(interests: &str) -> String {
        format!("Interests: {interests}\nBio: ")
    }

    struct Harness {
        store: Arc<InMemoryStore>,
        service: RecommendationService,
    }

    fn harness(config: RecommendConfig) -> Harness {
        let embeddings = ScriptedEmbeddings::new(&[
            (profile("chess, ai").as_str(), vec![1.0, 0.0]),
            (profile("chess, music").as_str(), vec![0.9, 0.1]),
            (profile("cooking").as_str(), vec![0.0, 1.0]),
            ("I bake sourdough on weekends", vec![0.0, 1.0]),
            ("sourdough tips wanted", vec![0.05, 1.0]),
        ]);
        let adapter = EmbeddingAdapter::new(
            Arc::new(embeddings),
            EmbeddingCache::new(),
            FallbackPolicy::Skip,
            Pacer::disabled(),
            42,
        );

        let store = Arc::new(InMemoryStore::new());
        store.insert_entity(Entity::new(1, "ann").with_interests("chess, ai"));
        store.insert_entity(Entity::new(2, "bob").with_interests("chess, music"));
        store.insert_entity(Entity::new(3, "cat").with_interests("cooking"));
        store.insert_entity(Entity::new(4, "dan"));

        let service = RecommendationService::new(
            store.clone(),
            Arc::new(InMemoryVectorIndex::new()),
            Arc::new(adapter),
            None,
            config,
        );
        Harness { store, service }
    }

    fn add_messages(store: &InMemoryStore) {
        let now = Utc::now();
        store.add_message(1, MessageRole::User, "I bake sourdough on weekends", now);
        store.add_message(1, MessageRole::Assistant, "Nice! Which flour?", now);
        store.add_message(3, MessageRole::User, "sourdough tips wanted", now);
    }

    fn recommended_ids(outcome: &GenerationOutcome) -> Vec<EntityId> {
        match outcome {
            GenerationOutcome::Generated(recs) => recs.iter().map(|r| r.recommended_id).collect(),
            GenerationOutcome::NotEnoughData(reason) => panic!("no recommendations: {reason}"),
        }
    }

    #[tokio::test]
    async fn test_update_all_embeddings_skips_blank_profiles() {
        let h = harness(RecommendConfig::default());
        assert_eq!(h.service.update_all_embeddings().await.unwrap(), 3);
        let dan = h.store.get_entity(4).await.unwrap().unwrap();
        assert!(dan.embedding.is_none());
        let ann = h.store.get_entity(1).await.unwrap().unwrap();
        assert!(ann.embedding_updated_at.is_some());
    }

    #[tokio::test]
    async fn test_regeneration_replaces_previous_rows() {
        let h = harness(RecommendConfig::default());
        h.service.update_all_embeddings().await.unwrap();

        let first = h.service.generate_for_subject(1).await.unwrap();
        assert_eq!(recommended_ids(&first), vec![2, 3]);
        let second = h.service.generate_for_subject(1).await.unwrap();
        assert_eq!(recommended_ids(&second), vec![2, 3]);

        let stored = h.service.recommendations_for(1).await.unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(h.store.recommendation_count(), 2);
        assert_eq!(stored[0].recommended_id, 2);
        assert_eq!(stored[0].common_interests, vec!["chess"]);
        assert!(stored[0].explanation.is_none());
    }

    #[tokio::test]
    async fn test_message_evidence_overrides_weak_profile() {
        let h = harness(RecommendConfig {
            min_profile_similarity: 0.5,
            ..RecommendConfig::default()
        });
        add_messages(&h.store);
        h.service.update_all_embeddings().await.unwrap();

        let outcome = h.service.generate_for_subject(1).await.unwrap();
        assert_eq!(recommended_ids(&outcome), vec![2, 3]);

        let stored = h.service.recommendations_for(1).await.unwrap();
        let cat = stored.iter().find(|r| r.recommended_id == 3).unwrap();
        assert!(cat.similarity_score < 0.75);
        assert!(cat.common_interests.is_empty());

        // generated message vectors are written back
        assert!(h.store.message(1).unwrap().embedding.is_some());
        assert!(h.store.message(2).unwrap().embedding.is_none());
    }

    #[tokio::test]
    async fn test_blank_profile_reports_not_enough_data() {
        let h = harness(RecommendConfig::default());
        let outcome = h.service.generate_for_subject(4).await.unwrap();
        assert!(matches!(outcome, GenerationOutcome::NotEnoughData(_)));
        assert!(h.service.generate_for_subject(99).await.is_err());
    }

    #[tokio::test]
    async fn test_discovery_keeps_existing_and_skips_duplicates() {
        let h = harness(RecommendConfig {
            min_profile_similarity: 0.5,
            ..RecommendConfig::default()
        });
        add_messages(&h.store);
        h.service.update_all_embeddings().await.unwrap();
        h.service.generate_for_subject(1).await.unwrap();
        assert_eq!(h.store.recommendation_count(), 2);

        // only cat -> ann has messages on both sides; bob has none
        assert_eq!(h.service.discover_from_messages().await.unwrap(), 1);
        assert_eq!(h.store.recommendation_count(), 3);
        let from_cat = h.service.recommendations_for(3).await.unwrap();
        assert_eq!(from_cat.len(), 1);
        assert_eq!(from_cat[0].recommended_id, 1);

        assert_eq!(h.service.discover_from_messages().await.unwrap(), 0);
        assert_eq!(h.service.recommendations_for(1).await.unwrap().len(), 2);
        assert!(h.service.recommendations_for(2).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_discovery_needs_messages_on_both_sides() {
        let h = harness(RecommendConfig::default());
        h.service.update_all_embeddings().await.unwrap();

        assert_eq!(h.service.discover_from_messages().await.unwrap(), 0);
        assert_eq!(h.store.recommendation_count(), 0);
    }

    #[tokio::test]
    async fn test_discovery_respects_subject_cap() {
        let h = harness(RecommendConfig {
            discovery_max_subjects: 0,
            ..RecommendConfig::default()
        });
        add_messages(&h.store);
        h.service.update_all_embeddings().await.unwrap();

        assert_eq!(h.service.discover_from_messages().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_regeneration_uses_edited_profile() {
        let h = harness(RecommendConfig::default());
        h.service.update_all_embeddings().await.unwrap();

        let mut ann = h.store.get_entity(1).await.unwrap().unwrap();
        ann.interests = "cooking".to_string();
        h.store.insert_entity(ann);

        let outcome = h.service.generate_for_subject(1).await.unwrap();
        assert_eq!(recommended_ids(&outcome), vec![3, 2]);

        let stored = h.service.recommendations_for(1).await.unwrap();
        assert!(stored[0].similarity_score > 0.99);
        assert_eq!(stored[0].common_interests, vec!["cooking"]);
        let ann = h.store.get_entity(1).await.unwrap().unwrap();
        assert_eq!(ann.embedding, Some(vec![0.0, 1.0]));
    }

    #[tokio::test]
    async fn test_generate_for_all_and_mark_viewed() {
        let h = harness(RecommendConfig::default());
        h.service.update_all_embeddings().await.unwrap();
        assert_eq!(h.service.generate_for_all().await.unwrap(), 6);

        let recs = h.service.recommendations_for(2).await.unwrap();
        h.service.mark_viewed(2, recs[0].id).await.unwrap();
        let recs = h.service.recommendations_for(2).await.unwrap();
        assert!(recs[0].is_viewed);
        assert!(!recs[1].is_viewed);
    }
}
