

use crate::store::{Entity, EntityId};


/// One entity together with its authored messages in chronological order.
#[derive(Debug, Clone, PartialEq)]
pub struct Participant {
    pub entity: Entity,
    pub messages: Vec<String>,
    profile_text: Option<String>,
}

impl Participant {
    pub fn new(entity: Entity, messages: Vec<String>, include_messages: bool) -> Self {
        let mut profile_text = entity.profile_text();
        if include_messages && !messages.is_empty() {
            let joined = messages.join(" ");
            profile_text = Some(match profile_text {
                Some(text) => format!("{text}\nMessages: {joined}"),
                None => format!("Messages: {joined}"),
            });
        }
        Self {
            entity,
            messages,
            profile_text,
        }
    }

    pub fn id(&self) -> EntityId {
        self.entity.id
    }

    pub fn profile_text(&self) -> Option<&str> {
        self.profile_text.as_deref()
    }

    /// The first `limit` messages, the slice every strategy draws from.
    pub fn sample(&self, limit: usize) -> &[String] {
        &self.messages[..self.messages.len().min(limit)]
    }
}


#[derive(Debug, Clone, Default, PartialEq)]
pub struct Population {
    participants: Vec<Participant>,
}

impl Population {
    pub fn new(participants: Vec<Participant>) -> Self {
        Self { participants }
    }

    pub fn len(&self) -> usize {
        self.participants.len()
    }

    pub fn is_empty(&self) -> bool {
        self.participants.is_empty()
    }

    pub fn ids(&self) -> Vec<EntityId> {
        self.participants.iter().map(Participant::id).collect()
    }

    pub fn participants(&self) -> &[Participant] {
        &self.participants
    }

    pub fn get(&self, id: EntityId) -> Option<&Participant> {
        self.participants.iter().find(|p| p.id() == id)
    }

    pub fn message_count(&self) -> usize {
        self.participants.iter().map(|p| p.messages.len()).sum()
    }

    /// Flattened `(owner index, message)` pool, capped per participant.
    pub fn message_pool(&self, per_participant: usize) -> Vec<(usize, &str)> {
        self.participants
            .iter()
            .enumerate()
            .flat_map(|(owner, p)| {
                p.sample(per_participant)
                    .iter()
                    .map(move |m| (owner, m.as_str()))
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn participant(id: EntityId, messages: &[&str], include: bool) -> Participant {
        Participant::new(
            Entity::new(id, format!("user{id}")).with_interests("chess, go"),
            messages.iter().map(|m| m.to_string()).collect(),
            include,
        )
    }

    #[test]
    fn test_profile_text_with_messages() {
        let p = participant(1, &["hello", "any chess clubs?"], true);
        let text = p.profile_text().unwrap();
        assert!(text.starts_with("Interests: chess, go"));
        assert!(text.ends_with("Messages: hello any chess clubs?"));

        let p = participant(1, &["hello"], false);
        assert!(!p.profile_text().unwrap().contains("hello"));
    }

    #[test]
    fn test_blank_profile_without_messages_has_no_text() {
        let p = Participant::new(Entity::new(5, "ghost"), Vec::new(), true);
        assert_eq!(p.profile_text(), None);
    }

    #[test]
    fn test_message_pool_respects_cap() {
        let population = Population::new(vec![
            participant(1, &["a", "b", "c"], false),
            participant(2, &["d"], false),
        ]);
        let pool = population.message_pool(2);
        assert_eq!(pool, vec![(0, "a"), (0, "b"), (1, "d")]);
        assert_eq!(population.message_count(), 4);
        assert_eq!(population.ids(), vec![1, 2]);
    }
}
