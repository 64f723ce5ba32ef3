//! Frequency-based keyword heuristic.
//!
//! Picks the three most frequent terms of a text after dropping short tokens,
//! digits, English stopwords and the components of the author names, so that
//! surnames do not end up as topical keywords.

use std::collections::{HashMap, HashSet};

/// Number of terms returned
const TOP_TERMS: usize = 3;

/// Tokens shorter than this are ignored
const MIN_TOKEN_LEN: usize = 4;

/// Author-name components shorter than this are not banned
const MIN_NAME_PART_LEN: usize = 3;

const STOPWORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "have", "has", "are", "was", "were",
    "will", "into", "over", "under", "between", "about", "after", "before", "until", "while",
    "more", "most", "can", "may", "might", "should", "could", "would", "than", "such", "using",
    "used", "use", "based", "on", "in", "at", "by", "to", "of", "a", "an", "as", "is", "it", "be",
    "we", "our", "their", "its", "not", "no", "yes", "new", "study", "results", "paper", "review",
    "article", "case", "cases",
];

/// Top terms of `text`, comma-joined, or `None` when nothing survives filtering.
///
/// Terms with the same count keep the order in which they first appear.
pub fn keywords(text: &str, authors_csv: &str) -> Option<String> {
    if text.trim().is_empty() {
        return None;
    }

    let mut banned: HashSet<String> = STOPWORDS.iter().map(|s| s.to_string()).collect();
    banned.extend(
        authors_csv
            .split([',', ' '])
            .filter(|part| part.chars().count() >= MIN_NAME_PART_LEN)
            .map(str::to_lowercase),
    );

    let normalized: String = text
        .to_lowercase()
        .chars()
        .map(|c| {
            if c.is_ascii_lowercase() || c.is_ascii_digit() || c == ' ' {
                c
            } else {
                ' '
            }
        })
        .collect();

    // (term, count) in first-occurrence order
    let mut counts: Vec<(&str, usize)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for token in normalized.split_whitespace() {
        if token.len() < MIN_TOKEN_LEN
            || banned.contains(token)
            || token.chars().all(|c| c.is_ascii_digit())
        {
            continue;
        }
        match index.get(token) {
            Some(&i) => counts[i].1 += 1,
            None => {
                index.insert(token, counts.len());
                counts.push((token, 1));
            }
        }
    }

    if counts.is_empty() {
        return None;
    }

    // Stable sort keeps first-occurrence order among equal counts
    counts.sort_by(|a, b| b.1.cmp(&a.1));

    Some(
        counts
            .iter()
            .take(TOP_TERMS)
            .map(|(term, _)| *term)
            .collect::<Vec<_>>()
            .join(", "),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_author_names_excluded() {
        let text = "doe doe roe climate climate climate policy policy network";
        assert_eq!(
            keywords(text, "Jane Doe, John Roe").as_deref(),
            Some("climate, policy, network")
        );
    }

    #[test]
    fn test_idempotent() {
        let text = "Graph neural networks for molecule graphs: networks and graphs";
        let first = keywords(text, "A. Smith");
        assert_eq!(first, keywords(text, "A. Smith"));
        assert_eq!(first.as_deref(), Some("networks, graphs, graph"));
    }

    #[test]
    fn test_tie_keeps_first_occurrence() {
        assert_eq!(
            keywords("zeta alpha beta gamma", "").as_deref(),
            Some("zeta, alpha, beta")
        );
    }

    #[test]
    fn test_filters_stopwords_digits_and_short_tokens() {
        assert_eq!(keywords("the 2020 study of cats", ""), Some("cats".to_string()));
        assert_eq!(keywords("this that with from 12345 ab", ""), None);
        assert_eq!(keywords("   ", "Jane Doe"), None);
    }

    #[test]
    fn test_punctuation_and_accents_split_tokens() {
        // Non [a-z0-9 ] characters become separators
        assert_eq!(
            keywords("Deep-learning; deep learning! (learning)", "").as_deref(),
            Some("learning, deep")
        );
        assert_eq!(keywords("análisis", "").as_deref(), Some("lisis"));
    }

    #[test]
    fn test_name_ban_is_case_insensitive() {
        assert_eq!(keywords("Wang wang data", "Li WANG").as_deref(), Some("data"));
    }
}
