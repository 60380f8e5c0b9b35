

use std::sync::Arc;

use lazy_static::lazy_static;
use rand::rngs::StdRng;
use rand::seq::IndexedRandom;
use rand::{Rng, SeedableRng};
use regex::Regex;
use tracing::{info, warn};

use super::dataset::{ChatMessage, ChatRecord, Dataset, ProfileRecord};
use crate::core::error::Result;
use crate::core::{KindredConfig, Pacer};
use crate::llm::LlmProviderFactory;
use crate::llm::prompts::{
    CHAT_SYSTEM_PROMPT, PROFILE_SYSTEM_PROMPT, build_chat_prompt, build_profile_prompt,
};
use crate::llm::providers::{GenerationOptions, LlmProvider};
use crate::store::{EntityId, MessageRole};

const PROFESSIONS: &[&str] = &[
    "software developer", "designer", "marketer", "teacher", "doctor", "lawyer",
    "accountant", "engineer", "writer", "photographer", "journalist", "scientist",
    "entrepreneur", "artist", "musician", "manager", "HR specialist",
    "data analyst", "psychologist", "architect", "translator", "fitness coach",
    "kindergarten teacher", "chef", "freelancer",
];

const INTERESTS: &[&str] = &[
    "programming", "design", "marketing", "education", "medicine", "law",
    "finance", "engineering", "literature", "photography", "journalism", "science",
    "business", "art", "music", "management", "HR", "data analysis", "psychology",
    "architecture", "languages", "fitness", "children", "cooking", "travel", "technology",
    "self-development", "history", "cinema", "nature", "sports", "games", "crafts",
    "gardening", "animals", "space", "robotics", "ecology", "health",
    "fashion", "real estate", "investing",
];

const PERSONALITIES: &[&str] = &[
    "creative", "analytical", "outgoing", "introverted", "pragmatic",
    "emotional", "logical", "caring", "ambitious", "laid-back",
    "perfectionist", "adventurous", "conservative", "optimistic", "skeptical",
    "curious", "self-confident", "reserved", "empathetic", "demanding",
];

const SITUATIONS: &[&str] = &[
    "looking for a new job", "planning a move", "wants to change careers",
    "raising children", "looking for a kindergarten", "learning a new skill",
    "preparing for an important exam", "starting a business", "renovating a house",
    "planning a trip", "looking for project partners", "recovering from an injury",
    "preparing a public talk", "writing a book", "building a website",
    "looking for a tutor", "choosing a university", "investing money",
    "looking for creative inspiration", "looking for like-minded people", "wants to get healthier",
    "planning a surprise for loved ones", "looking for a new hobby", "opening an online store",
    "trying to master a new technology", "looking for a fix to a technical problem",
];

lazy_static! {
    static ref JSON_OBJECT: Option<Regex> = Regex::new(r"(?s)\{.*\}").ok();
}


/// Pulls the outermost `{...}` out of a reply that may carry prose or code fences.
pub fn extract_json(text: &str) -> Option<&str> {
    JSON_OBJECT.as_ref()?.find(text).map(|m| m.as_str())
}


/// Builds a synthetic dataset of profiles and chat transcripts through the text-generation service.
pub struct SyntheticGenerator {
    llm: Arc<dyn LlmProvider>,
    pacer: Pacer,
    rng: StdRng,
    temperature: f64,
}

impl SyntheticGenerator {
    pub fn new(llm: Arc<dyn LlmProvider>, pacer: Pacer, seed: u64) -> Self {
        Self {
            llm,
            pacer,
            rng: StdRng::seed_from_u64(seed),
            temperature: 0.7,
        }
    }

    pub fn with_temperature(mut self, temperature: f64) -> Self {
        self.temperature = temperature;
        self
    }

    pub async fn generate(&mut self, count: usize) -> Dataset {
        info!("Generating {} synthetic profiles", count);
        let mut dataset = Dataset::default();
        for user_id in 1..=count as EntityId {
            let profile = self.profile(user_id).await;
            dataset.profiles.push(profile);
        }

        for profile in &dataset.profiles {
            let chats = self.rng.random_range(1..=3);
            for index in 1..=chats {
                let messages = self.rng.random_range(8..=15);
                let mut chat = self.chat(profile, messages).await;
                chat.chat_id = format!("chat_{}_{}", profile.user_id, index);
                dataset.chats.push(chat);
            }
        }
        info!(
            "Generated {} profiles and {} chats",
            dataset.profiles.len(),
            dataset.chats.len()
        );
        dataset
    }

    async fn profile(&mut self, user_id: EntityId) -> ProfileRecord {
        let pick = |rng: &mut StdRng, from: &[&str]| {
            from.choose(rng).copied().unwrap_or_default().to_string()
        };
        let profession = pick(&mut self.rng, PROFESSIONS);
        let personality = pick(&mut self.rng, PERSONALITIES);
        let situation = pick(&mut self.rng, SITUATIONS);
        let amount = self.rng.random_range(3..=6);
        let interests: Vec<String> = INTERESTS
            .choose_multiple(&mut self.rng, amount)
            .map(|i| i.to_string())
            .collect();

        let prompt = build_profile_prompt(&profession, &personality, &situation, &interests);
        let options = GenerationOptions::new(self.temperature).with_max_tokens(500);
        let result = self
            .llm
            .generate(PROFILE_SYSTEM_PROMPT, &prompt, &options)
            .await;
        self.pacer.pause().await;

        let description = match result {
            Ok((text, _)) => text.trim().to_string(),
            Err(e) => {
                warn!("Profile description failed for user {}: {}", user_id, e);
                format!(
                    "User {user_id} is a {profession} interested in {}.",
                    interests.join(", ")
                )
            }
        };

        ProfileRecord {
            user_id,
            profession,
            interests,
            personality,
            situation,
            description,
        }
    }

    async fn chat(&mut self, profile: &ProfileRecord, messages: usize) -> ChatRecord {
        let profile_json = serde_json::to_string_pretty(profile).unwrap_or_default();
        let prompt = build_chat_prompt(&profile_json, profile.user_id, messages);
        let options = GenerationOptions::new(self.temperature)
            .with_max_tokens(1500)
            .json();
        let result = self.llm.generate(CHAT_SYSTEM_PROMPT, &prompt, &options).await;
        self.pacer.pause().await;

        let parsed = result
            .map_err(|e| e.to_string())
            .and_then(|(text, _)| {
                let json = extract_json(&text).ok_or("reply contained no JSON object")?;
                serde_json::from_str::<ChatRecord>(json).map_err(|e| e.to_string())
            });

        match parsed {
            Ok(mut chat) => {
                chat.user_id = profile.user_id;
                chat
            }
            Err(e) => {
                warn!("Chat generation failed for user {}: {}", profile.user_id, e);
                fallback_chat(profile)
            }
        }
    }
}


/// `generate` mode: builds `users` profiles with chats and writes them under the data directory.
pub async fn generate(config: &KindredConfig, users: usize) -> Result<Dataset> {
    let llm = LlmProviderFactory::from_config(config)?;
    let mut generator = SyntheticGenerator::new(
        llm,
        Pacer::from_millis(config.pacing.generation_delay_ms),
        config.matching.seed,
    )
    .with_temperature(config.llm_temperature);
    let dataset = generator.generate(users).await;
    dataset.save(&config.data_dir)?;
    info!("Synthetic data written to {}", config.data_dir.display());
    Ok(dataset)
}


pub fn fallback_chat(profile: &ProfileRecord) -> ChatRecord {
    let interest = profile
        .interests
        .first()
        .map(String::as_str)
        .unwrap_or("many things");
    let turn = |role, content: String| ChatMessage { role, content };

    ChatRecord {
        chat_id: format!("chat_{}", profile.user_id),
        user_id: profile.user_id,
        messages: vec![
            turn(
                MessageRole::User,
                format!("Hi! I'm a {} and I'm interested in {interest}.", profile.profession),
            ),
            turn(
                MessageRole::Assistant,
                format!(
                    "Hello! Happy to help with your questions about {interest}. \
                     What can I do for you?"
                ),
            ),
            turn(
                MessageRole::User,
                format!("I'm having trouble because I'm {}.", profile.situation),
            ),
            turn(
                MessageRole::Assistant,
                "I understand your situation. Let's work through it together.".to_string(),
            ),
        ],
    }
}
