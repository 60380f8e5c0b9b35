

use std::collections::BTreeSet;


/// Comma-separated interests, trimmed and lowercased; blanks dropped.
pub fn parse_interests(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(|i| i.trim().to_lowercase())
        .filter(|i| !i.is_empty())
        .collect()
}


pub fn common_interests(a: &str, b: &str) -> Vec<String> {
    let left = parse_interests(a);
    parse_interests(b)
        .into_iter()
        .filter(|i| left.contains(i))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_case_insensitive_intersection() {
        assert_eq!(common_interests("Chess, AI", "chess ,music"), vec!["chess"]);
        assert_eq!(
            common_interests("hiking, Jazz, go", "GO,jazz"),
            vec!["go", "jazz"]
        );
    }

    #[test]
    fn test_empty_lists() {
        assert!(common_interests("", "chess").is_empty());
        assert!(common_interests(" , ,", " ,").is_empty());
        assert!(parse_interests(",,").is_empty());
    }
}
