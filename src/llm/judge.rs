

use std::sync::Arc;

use tracing::{debug, warn};

use super::prompts::{RELEVANCE_SYSTEM_PROMPT, build_relevance_prompt};
use super::providers::{GenerationOptions, LlmProvider};
use crate::core::Pacer;


/// Binary relevance check on a message pair. Failures count as "not relevant".
pub struct RelevanceJudge {
    llm: Arc<dyn LlmProvider>,
    pacer: Pacer,
    options: GenerationOptions,
}

impl RelevanceJudge {
    pub fn new(llm: Arc<dyn LlmProvider>, pacer: Pacer) -> Self {
        Self {
            llm,
            pacer,
            options: GenerationOptions::new(0.1).with_max_tokens(10),
        }
    }

    pub async fn is_relevant(&self, message1: &str, message2: &str) -> bool {
        let prompt = build_relevance_prompt(message1, message2);
        let verdict = match self
            .llm
            .generate(RELEVANCE_SYSTEM_PROMPT, &prompt, &self.options)
            .await
        {
            Ok((answer, _metadata)) => {
                let relevant = parse_verdict(&answer);
                debug!(
                    "Relevance verdict={} for '{}' / '{}'",
                    relevant,
                    crate::safe_truncate_ellipsis(message1, 30),
                    crate::safe_truncate_ellipsis(message2, 30)
                );
                relevant
            }
            Err(e) => {
                warn!("Relevance check failed, treating pair as not relevant: {}", e);
                false
            }
        };
        self.pacer.pause().await;
        verdict
    }
}


pub fn parse_verdict(answer: &str) -> bool {
    answer.trim().to_lowercase().contains("yes")
}
