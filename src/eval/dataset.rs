

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::core::error::{KindredError, Result};
use crate::matching::{Participant, Population};
use crate::store::{Entity, EntityId, MessageRole};

pub const PROFILES_FILE: &str = "user_profiles.json";
pub const CHATS_DIR: &str = "ai_chats";


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfileRecord {
    pub user_id: EntityId,
    pub profession: String,
    pub interests: Vec<String>,
    pub personality: String,
    pub situation: String,
    #[serde(default)]
    pub description: String,
}

impl ProfileRecord {
    pub fn to_entity(&self) -> Entity {
        Entity::new(self.user_id, format!("user_{}", self.user_id))
            .with_interests(self.interests.join(", "))
            .with_bio(format!(
                "Profession: {}. Personality: {}. Situation: {}.",
                self.profession, self.personality, self.situation
            ))
    }
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: MessageRole,
    pub content: String,
}


#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatRecord {
    pub chat_id: String,
    pub user_id: EntityId,
    pub messages: Vec<ChatMessage>,
}


/// Profiles plus chat transcripts, as laid out under a data directory.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    pub profiles: Vec<ProfileRecord>,
    pub chats: Vec<ChatRecord>,
}

impl Dataset {
    /// Loads the first `max_entities` profiles and only the chats that belong to them.
    pub fn load(data_dir: &Path, max_entities: usize) -> Result<Self> {
        let profiles_path = data_dir.join(PROFILES_FILE);
        if !profiles_path.exists() {
            return Err(KindredError::Dataset(format!(
                "{} not found, run with --mode generate first",
                profiles_path.display()
            )));
        }

        let mut profiles: Vec<ProfileRecord> =
            serde_json::from_str(&fs::read_to_string(&profiles_path)?)?;
        profiles.truncate(max_entities);
        info!("Loaded {} profiles (max {})", profiles.len(), max_entities);

        let chats_dir = data_dir.join(CHATS_DIR);
        let mut chats = Vec::new();
        if chats_dir.is_dir() {
            let mut paths: Vec<_> = fs::read_dir(&chats_dir)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
                .collect();
            paths.sort();

            for path in paths {
                let chat: ChatRecord = match fs::read_to_string(&path)
                    .map_err(KindredError::from)
                    .and_then(|raw| serde_json::from_str(&raw).map_err(KindredError::from))
                {
                    Ok(chat) => chat,
                    Err(e) => {
                        warn!("Skipping unreadable chat {}: {}", path.display(), e);
                        continue;
                    }
                };
                if profiles.iter().any(|p| p.user_id == chat.user_id) {
                    chats.push(chat);
                }
            }
        }
        info!("Loaded {} chats", chats.len());

        Ok(Self { profiles, chats })
    }

    pub fn save(&self, data_dir: &Path) -> Result<()> {
        let chats_dir = data_dir.join(CHATS_DIR);
        fs::create_dir_all(&chats_dir)?;

        fs::write(
            data_dir.join(PROFILES_FILE),
            serde_json::to_string_pretty(&self.profiles)?,
        )?;
        for chat in &self.chats {
            fs::write(
                chats_dir.join(format!("{}.json", chat.chat_id)),
                serde_json::to_string_pretty(chat)?,
            )?;
        }
        Ok(())
    }

    /// Messages written by the entity itself, in transcript order.
    pub fn authored_messages(&self, user_id: EntityId) -> Vec<String> {
        self.chats
            .iter()
            .filter(|c| c.user_id == user_id)
            .flat_map(|c| c.messages.iter())
            .filter(|m| m.role == MessageRole::User)
            .map(|m| m.content.clone())
            .collect()
    }

    pub fn population(&self, include_messages: bool) -> Population {
        Population::new(
            self.profiles
                .iter()
                .map(|p| {
                    Participant::new(
                        p.to_entity(),
                        self.authored_messages(p.user_id),
                        include_messages,
                    )
                })
                .collect(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(user_id: EntityId) -> ProfileRecord {
        ProfileRecord {
            user_id,
            profession: "teacher".to_string(),
            interests: vec!["history".to_string(), "hiking".to_string()],
            personality: "curious".to_string(),
            situation: "looking for a tutor".to_string(),
            description: String::new(),
        }
    }

    fn chat(chat_id: &str, user_id: EntityId) -> ChatRecord {
        ChatRecord {
            chat_id: chat_id.to_string(),
            user_id,
            messages: vec![
                ChatMessage {
                    role: MessageRole::User,
                    content: format!("question from {user_id}"),
                },
                ChatMessage {
                    role: MessageRole::Assistant,
                    content: "answer".to_string(),
                },
            ],
        }
    }

    #[test]
    fn test_round_trip_through_directory() {
        let dir = tempfile::tempdir().unwrap();
        let dataset = Dataset {
            profiles: vec![profile(1), profile(2), profile(3)],
            chats: vec![chat("chat_1_1", 1), chat("chat_1_2", 1), chat("chat_3_1", 3)],
        };
        dataset.save(dir.path()).unwrap();

        let loaded = Dataset::load(dir.path(), 2).unwrap();
        assert_eq!(loaded.profiles.len(), 2);
        assert_eq!(loaded.chats.len(), 2);
        assert_eq!(
            loaded.authored_messages(1),
            vec!["question from 1", "question from 1"]
        );
        assert!(loaded.authored_messages(2).is_empty());
    }

    #[test]
    fn test_missing_profiles_is_dataset_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = Dataset::load(dir.path(), 10).unwrap_err();
        assert!(matches!(err, KindredError::Dataset(_)));
    }

    #[test]
    fn test_population_profile_text() {
        let dataset = Dataset {
            profiles: vec![profile(7)],
            chats: vec![chat("chat_7_1", 7)],
        };
        let population = dataset.population(true);
        let text = population.participants()[0].profile_text().unwrap();
        assert!(text.starts_with("Interests: history, hiking\nBio: Profession: teacher."));
        assert!(text.ends_with("Messages: question from 7"));
        assert_eq!(population.participants()[0].messages.len(), 1);
    }
}
