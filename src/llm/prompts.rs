

pub const RELEVANCE_SYSTEM_PROMPT: &str =
    "You help decide whether two users could be useful to each other based on their messages.";

pub const EXPLANATION_SYSTEM_PROMPT: &str =
    "You are a friendly AI helping to explain why two people might enjoy talking to each other.";

pub const PROFILE_SYSTEM_PROMPT: &str =
    "You help create realistic user profiles for research purposes.";

pub const CHAT_SYSTEM_PROMPT: &str = "You create realistic dialogues between a user and an AI \
assistant for research purposes. Return JSON only.";

/// Excerpt length for messages quoted inside explanation prompts.
pub const MESSAGE_EXCERPT_CHARS: usize = 200;


pub fn build_relevance_prompt(message1: &str, message2: &str) -> String {
    format!(
        r#"Decide whether the authors of these two messages could be useful to each other.

Message 1: "{message1}"

Message 2: "{message2}"

Answer only "yes" if, in this context, the author of message 1 could help the author of message 2 or vice versa.
Otherwise answer "no".

Examples of usefulness: one user is looking for a specialist and the other has the required skills;
one user has a problem the other has already solved."#
    )
}


pub struct ExplanationSide<'a> {
    pub name: &'a str,
    pub interests: &'a str,
    pub bio: &'a str,
    pub excerpt: Option<&'a str>,
}


pub fn build_explanation_prompt(
    subject: &ExplanationSide<'_>,
    candidate: &ExplanationSide<'_>,
    max_words: usize,
) -> String {
    let describe = |label: &str, side: &ExplanationSide<'_>| {
        let mut block = format!(
            "{label}:\nName: {}\nInterests: {}\nBio: {}\n",
            side.name, side.interests, side.bio
        );
        if let Some(excerpt) = side.excerpt {
            block.push_str(&format!(
                "Example message: {}\n",
                crate::safe_truncate(excerpt, MESSAGE_EXCERPT_CHARS)
            ));
        }
        block
    };

    let focus = if subject.excerpt.is_some() && candidate.excerpt.is_some() {
        "Focus on their specific shared interests and the content of their messages."
    } else {
        "Focus on specific shared interests or complementary skills/experiences."
    };

    format!(
        r#"I need to explain why these two people might be a good match for a conversation.

{}
{}
Please provide a brief, natural sounding explanation of why these two people might enjoy talking to each other.
{focus}
Keep it short (max {max_words} words) and casual, addressing Person 1 directly.

Example format: "Hey [Person 1 name], [Person 2 name] is also into [specific shared interest]. Maybe you two could chat about it!""#,
        describe("Person 1", subject),
        describe("Person 2", candidate),
    )
}


pub fn build_profile_prompt(
    profession: &str,
    personality: &str,
    situation: &str,
    interests: &[String],
) -> String {
    format!(
        r#"Create a user profile with the following characteristics:
- Profession: {profession}
- Personality: {personality}
- Life situation: {situation}
- Interests: {}

Write a full description of the person with their needs, goals, pains and wishes.
Add 1-2 specific requests or problems this person would ask for help with."#,
        interests.join(", ")
    )
}


pub fn build_chat_prompt(profile_json: &str, user_id: u64, num_messages: usize) -> String {
    format!(
        r#"Create a dialogue between a user and an AI assistant of about {num_messages} messages.

User profile:
{profile_json}

The dialogue must be realistic and reflect the user's needs, interests and problems.
The user should discuss the specific problems and requests from the profile.

Return strictly JSON:
{{
    "chat_id": "chat_{user_id}",
    "user_id": {user_id},
    "messages": [
        {{"role": "user", "content": "First user message"}},
        {{"role": "assistant", "content": "Assistant reply"}}
    ]
}}

The dialogue must start with a user message and alternate between user and assistant."#
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_relevance_prompt_quotes_both_messages() {
        let prompt = build_relevance_prompt("I need a tutor", "I teach maths");
        assert!(prompt.contains("\"I need a tutor\""));
        assert!(prompt.contains("\"I teach maths\""));
    }

    #[test]
    fn test_explanation_prompt_clips_excerpt() {
        let long = "x".repeat(500);
        let subject = ExplanationSide {
            name: "Ann",
            interests: "chess, ai",
            bio: "",
            excerpt: Some(&long),
        };
        let candidate = ExplanationSide {
            name: "Bob",
            interests: "chess",
            bio: "",
            excerpt: Some("hi"),
        };
        let prompt = build_explanation_prompt(&subject, &candidate, 40);
        assert!(prompt.contains("max 40 words"));
        assert!(!prompt.contains(&"x".repeat(201)));
        assert!(prompt.contains("content of their messages"));
    }
}
