

use super::config::RecommendConfig;
use crate::matching::cosine_similarity;


/// Accepted candidate: its score and, when messages decided it, the best message pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub score: f64,
    pub max_message_similarity: Option<f64>,
    pub evidence: Option<(usize, usize)>,
}


/// Two-stage acceptance over profile similarity and the best message pair.
pub fn assess<S, C>(
    profile_similarity: f64,
    subject_messages: &[S],
    candidate_messages: &[C],
    config: &RecommendConfig,
) -> Option<Assessment>
where
    S: AsRef<[f32]>,
    C: AsRef<[f32]>,
{
    if subject_messages.is_empty() || candidate_messages.is_empty() {
        return (profile_similarity >= config.min_profile_similarity).then_some(Assessment {
            score: profile_similarity,
            max_message_similarity: None,
            evidence: None,
        });
    }

    let mut best = (f64::NEG_INFINITY, (0, 0));
    for (i, a) in subject_messages.iter().enumerate() {
        for (j, b) in candidate_messages.iter().enumerate() {
            let similarity = cosine_similarity(a.as_ref(), b.as_ref());
            if similarity > best.0 {
                best = (similarity, (i, j));
            }
        }
    }

    let (max_similarity, pair) = best;
    let relevance = (profile_similarity + max_similarity) / 2.0;
    if max_similarity > config.message_threshold || relevance > config.relevance_threshold {
        Some(Assessment {
            score: relevance,
            max_message_similarity: Some(max_similarity),
            evidence: Some(pair),
        })
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> RecommendConfig {
        RecommendConfig::default()
    }

    #[test]
    fn test_strong_message_pair_accepts_despite_weak_profile() {
        let subject = [vec![1.0f32, 0.0], vec![0.0, 1.0]];
        let candidate = [vec![0.0f32, 1.0]];
        let assessment = assess(0.1, &subject, &candidate, &config()).unwrap();
        assert_eq!(assessment.evidence, Some((1, 0)));
        assert!((assessment.score - 0.55).abs() < 1e-9);
    }

    #[test]
    fn test_blended_score_can_accept() {
        // message similarity 0.6 alone is not enough, (0.9 + 0.6) / 2 = 0.75 is
        let subject = [vec![1.0f32, 0.0]];
        let candidate = [vec![0.6f32, 0.8]];
        let assessment = assess(0.9, &subject, &candidate, &config()).unwrap();
        assert!((assessment.score - 0.75).abs() < 1e-6);
        assert!(assess(0.5, &subject, &candidate, &config()).is_none());
    }

    #[test]
    fn test_profile_only_fallback() {
        let none: [Vec<f32>; 0] = [];
        let candidate = [vec![1.0f32]];
        let assessment = assess(0.3, &none, &candidate, &config()).unwrap();
        assert_eq!(assessment.evidence, None);
        assert_eq!(assessment.score, 0.3);

        let strict = RecommendConfig {
            min_profile_similarity: 0.5,
            ..config()
        };
        assert!(assess(0.3, &none, &candidate, &strict).is_none());
    }
}
