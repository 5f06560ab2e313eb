//! Keyword extraction: content words in order of first appearance.

use std::collections::HashSet;

use super::tokenize::{is_stop_word, words};

/// Shortest token considered a keyword.
pub const MIN_KEYWORD_LENGTH: usize = 3;

/// Frequent verbs and auxiliaries that carry little topical meaning.
const COMMON_VERBS: &[&str] = &[
    "get", "got", "gets", "make", "made", "makes", "take", "took", "takes", "give", "gave",
    "gives", "go", "goes", "went", "gone", "come", "came", "comes", "say", "said", "says",
    "see", "saw", "seen", "know", "knew", "known", "think", "thought", "want", "wanted",
    "use", "used", "uses", "find", "found", "tell", "told", "ask", "asked", "seem", "seemed",
    "feel", "felt", "try", "tried", "leave", "left", "call", "called", "keep", "kept",
    "let", "put", "like", "liked", "need", "needed", "become", "became", "show", "showed",
];

/// Adverbs common enough to be noise. Listed explicitly: a suffix rule would
/// also catch nouns such as "family" or "Italy".
const COMMON_ADVERBS: &[&str] = &[
    "quickly", "slowly", "really", "actually", "probably", "usually", "finally", "simply",
    "nearly", "mostly", "likely", "certainly", "clearly", "easily", "exactly", "generally",
    "recently", "suddenly", "already", "almost", "always", "never", "sometimes", "often",
    "soon", "still", "even", "ever", "instead", "perhaps", "maybe", "again", "together",
];

fn is_negated_contraction(lower: &str) -> bool {
    lower.ends_with("n't") || lower.ends_with("n\u{2019}t")
}

/// The keyword spelling of a token, if it is one: possessives lose their
/// `'s` ("Mary's" gives "Mary") and the remainder must be purely alphabetic.
fn keyword_form(token: &str) -> Option<&str> {
    if is_negated_contraction(&token.to_lowercase()) {
        return None;
    }
    let stem = token.split(['\'', '\u{2019}']).next()?;
    let lower = stem.to_lowercase();
    let keep = stem.chars().count() >= MIN_KEYWORD_LENGTH
        && stem.chars().all(char::is_alphabetic)
        && !is_stop_word(&lower)
        && !COMMON_VERBS.contains(&lower.as_str())
        && !COMMON_ADVERBS.contains(&lower.as_str());
    keep.then_some(stem)
}

/// Extract keywords from `text`, de-duplicated case-insensitively and kept in
/// the order (and spelling) of their first occurrence.
pub fn extract_keywords(text: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    words(text)
        .into_iter()
        .filter_map(keyword_form)
        .filter(|w| seen.insert(w.to_lowercase()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_content_words_in_first_seen_order() {
        let keywords = extract_keywords("The Rust compiler said the rust borrow checker quickly won.");
        assert_eq!(keywords, vec!["Rust", "compiler", "borrow", "checker", "won"]);
    }

    #[test]
    fn drops_numbers_and_short_tokens() {
        assert_eq!(extract_keywords("An ox ate 42 apples in 2020"), vec!["ate", "apples"]);
    }

    #[test]
    fn keeps_nouns_ending_in_ly() {
        assert_eq!(
            extract_keywords("Italy family reunion in July"),
            vec!["Italy", "family", "reunion", "July"]
        );
    }

    #[test]
    fn possessives_reduce_to_their_stem() {
        assert_eq!(
            extract_keywords("Mary's garden and Mary's dog don't shouldn't"),
            vec!["Mary", "garden", "dog"]
        );
    }

    #[test]
    fn empty_text_has_no_keywords() {
        assert!(extract_keywords("").is_empty());
        assert!(extract_keywords("it is what it is").is_empty());
    }
}
