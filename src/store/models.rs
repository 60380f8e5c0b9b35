

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{EnumString, IntoStaticStr};

pub type EntityId = u64;


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct Entity {
    pub id: EntityId,
    pub username: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub interests: String,
    #[serde(default)]
    pub bio: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding_updated_at: Option<DateTime<Utc>>,
}

impl Entity {
    pub fn new(id: EntityId, username: impl Into<String>) -> Self {
        Self {
            id,
            username: username.into(),
            ..Default::default()
        }
    }

    pub fn with_interests(mut self, interests: impl Into<String>) -> Self {
        self.interests = interests.into();
        self
    }

    pub fn with_bio(mut self, bio: impl Into<String>) -> Self {
        self.bio = bio.into();
        self
    }

    pub fn with_first_name(mut self, first_name: impl Into<String>) -> Self {
        self.first_name = first_name.into();
        self
    }

    pub fn display_name(&self) -> &str {
        if self.first_name.trim().is_empty() {
            &self.username
        } else {
            &self.first_name
        }
    }

    /// `None` when both interests and bio are blank.
    pub fn profile_text(&self) -> Option<String> {
        if self.interests.trim().is_empty() && self.bio.trim().is_empty() {
            return None;
        }
        Some(format!("Interests: {}\nBio: {}", self.interests, self.bio))
    }
}


#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumString, IntoStaticStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
    System,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub entity_id: EntityId,
    pub role: MessageRole,
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub embedding: Option<Vec<f32>>,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn is_authored(&self) -> bool {
        self.role == MessageRole::User
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: u64,
    pub subject_id: EntityId,
    pub recommended_id: EntityId,
    pub similarity_score: f64,
    pub common_interests: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    pub is_viewed: bool,
    pub created_at: DateTime<Utc>,
}


#[derive(Debug, Clone, PartialEq)]
pub struct NewRecommendation {
    pub subject_id: EntityId,
    pub recommended_id: EntityId,
    pub similarity_score: f64,
    pub common_interests: Vec<String>,
    pub explanation: Option<String>,
}


#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EmbeddingFilter {
    #[default]
    Any,
    WithEmbedding,
    WithoutEmbedding,
}

impl EmbeddingFilter {
    pub fn accepts(&self, embedding: Option<&Vec<f32>>) -> bool {
        match self {
            Self::Any => true,
            Self::WithEmbedding => embedding.is_some(),
            Self::WithoutEmbedding => embedding.is_none(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_display_name_prefers_first_name() {
        let entity = Entity::new(1, "ann42");
        assert_eq!(entity.display_name(), "ann42");
        assert_eq!(entity.with_first_name("Ann").display_name(), "Ann");
    }

    #[test]
    fn test_profile_text() {
        assert!(Entity::new(1, "a").profile_text().is_none());
        let text = Entity::new(1, "a")
            .with_interests("chess, ai")
            .with_bio("Engineer")
            .profile_text()
            .unwrap();
        assert_eq!(text, "Interests: chess, ai\nBio: Engineer");
    }

    #[test]
    fn test_message_role_parsing() {
        assert_eq!(MessageRole::from_str("user").unwrap(), MessageRole::User);
        let role: MessageRole = serde_json::from_str("\"assistant\"").unwrap();
        assert_eq!(role, MessageRole::Assistant);
    }
}
