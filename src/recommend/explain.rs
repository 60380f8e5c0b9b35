

use std::sync::Arc;

use tracing::{debug, warn};

use crate::core::Pacer;
use crate::llm::prompts::{EXPLANATION_SYSTEM_PROMPT, ExplanationSide, build_explanation_prompt};
use crate::llm::providers::{GenerationOptions, LlmProvider};
use crate::store::Entity;

const PROFILE_WORD_LIMIT: usize = 30;
const MESSAGE_WORD_LIMIT: usize = 40;


pub fn fallback_explanation(candidate: &Entity, from_messages: bool) -> String {
    if from_messages {
        format!(
            "{} has been discussing topics that might be relevant to your interests!",
            candidate.display_name()
        )
    } else {
        format!(
            "{} seems to share similar interests with you!",
            candidate.display_name()
        )
    }
}


/// Short natural-language reason for an already accepted match.
pub struct Explainer {
    llm: Arc<dyn LlmProvider>,
    pacer: Pacer,
    options: GenerationOptions,
}

impl Explainer {
    pub fn new(llm: Arc<dyn LlmProvider>, pacer: Pacer) -> Self {
        Self {
            llm,
            pacer,
            options: GenerationOptions::new(0.7).with_max_tokens(150),
        }
    }

    /// `evidence` is the most similar (subject, candidate) message pair, when there is one.
    pub async fn explain(
        &self,
        subject: &Entity,
        candidate: &Entity,
        evidence: Option<(&str, &str)>,
    ) -> String {
        let max_words = if evidence.is_some() {
            MESSAGE_WORD_LIMIT
        } else {
            PROFILE_WORD_LIMIT
        };
        let prompt = build_explanation_prompt(
            &side(subject, evidence.map(|(s, _)| s)),
            &side(candidate, evidence.map(|(_, c)| c)),
            max_words,
        );

        let result = self
            .llm
            .generate(EXPLANATION_SYSTEM_PROMPT, &prompt, &self.options)
            .await;
        self.pacer.pause().await;

        match result {
            Ok((text, _)) => {
                debug!("Explanation for {} -> {}: {}", subject.id, candidate.id, text);
                text.trim().trim_matches('"').to_string()
            }
            Err(e) => {
                warn!("Explanation generation failed, using template: {}", e);
                fallback_explanation(candidate, evidence.is_some())
            }
        }
    }
}

fn side<'a>(entity: &'a Entity, excerpt: Option<&'a str>) -> ExplanationSide<'a> {
    ExplanationSide {
        name: entity.display_name(),
        interests: &entity.interests,
        bio: &entity.bio,
        excerpt,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::providers::{LlmMetadata, LlmProviderError};
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct Recorder {
        reply: Option<&'static str>,
        prompts: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl LlmProvider for Recorder {
        async fn generate(
            &self,
            _system_prompt: &str,
            user_prompt: &str,
            _options: &GenerationOptions,
        ) -> Result<(String, LlmMetadata), LlmProviderError> {
            self.prompts.lock().push(user_prompt.to_string());
            self.reply
                .map(|r| (r.to_string(), LlmMetadata::default()))
                .ok_or(LlmProviderError::EmptyCompletion)
        }

        fn provider_name(&self) -> &str {
            "recorder"
        }

        fn model_name(&self) -> &str {
            "recorder"
        }
    }

    fn entities() -> (Entity, Entity) {
        (
            Entity::new(1, "ann").with_first_name("Ann").with_interests("chess"),
            Entity::new(2, "bob_k").with_interests("chess, go"),
        )
    }

    #[tokio::test]
    async fn test_message_evidence_in_prompt() {
        let llm = Arc::new(Recorder {
            reply: Some(" \"Hey Ann, bob_k plays chess too!\" "),
            prompts: Mutex::new(Vec::new()),
        });
        let explainer = Explainer::new(llm.clone(), Pacer::disabled());
        let (ann, bob) = entities();

        let text = explainer
            .explain(&ann, &bob, Some(("any chess clubs?", "I run a chess club")))
            .await;
        assert_eq!(text, "Hey Ann, bob_k plays chess too!");

        let prompts = llm.prompts.lock();
        assert!(prompts[0].contains("max 40 words"));
        assert!(prompts[0].contains("Example message: I run a chess club"));
    }

    #[tokio::test]
    async fn test_fallback_templates() {
        let llm = Arc::new(Recorder {
            reply: None,
            prompts: Mutex::new(Vec::new()),
        });
        let explainer = Explainer::new(llm.clone(), Pacer::disabled());
        let (ann, bob) = entities();

        assert_eq!(
            explainer.explain(&bob, &ann, None).await,
            "Ann seems to share similar interests with you!"
        );
        assert_eq!(
            explainer.explain(&ann, &bob, Some(("a", "b"))).await,
            "bob_k has been discussing topics that might be relevant to your interests!"
        );
        assert!(llm.prompts.lock()[0].contains("max 30 words"));
    }
}
