//! Extractive summarization: keep the first sentences that mention an entity.

use super::tokenize::{is_stop_word, sentences, words};

/// Number of sentences kept in a summary.
pub const SUMMARY_SENTENCES: usize = 3;

/// Pronouns and interjections that are capitalized without naming anything.
const NON_ENTITY_CAPITALS: &[&str] = &["I", "I'm", "I've", "I'll", "I'd", "OK"];

/// Whether a sentence mentions something entity-like: a capitalized word
/// that is not the sentence's first word, or any token containing a digit
/// (dates, amounts, counts).
pub fn mentions_entity(sentence: &str) -> bool {
    words(sentence).iter().enumerate().any(|(i, word)| {
        if word.chars().any(|c| c.is_ascii_digit()) {
            return true;
        }
        i > 0
            && word.chars().next().is_some_and(char::is_uppercase)
            && !NON_ENTITY_CAPITALS.contains(word)
            && !is_stop_word(word)
    })
}

/// Join the first [`SUMMARY_SENTENCES`] entity-bearing sentences with a
/// single space. Returns an empty string when none qualify.
pub fn summarize_text(text: &str) -> String {
    sentences(text)
        .into_iter()
        .filter(|s| mentions_entity(s))
        .take(SUMMARY_SENTENCES)
        .collect::<Vec<_>>()
        .join(" ")
}
