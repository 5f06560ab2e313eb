//! Normalization used by `/text/preprocess`: lower-case, drop stop words
//! and non-alphabetic tokens, reduce words to a rough lemma.

use super::tokenize::{is_stop_word, words};

/// Shortest stem a suffix rule may leave behind.
const MIN_STEM: usize = 3;

/// Reduce a lower-case word to a crude lemma with a handful of suffix rules.
pub fn lemmatize(word: &str) -> String {
    let len = word.chars().count();
    let strip = |suffix: &str, replacement: &str| -> Option<String> {
        let stem = word.strip_suffix(suffix)?;
        (stem.chars().count() >= MIN_STEM).then(|| format!("{stem}{replacement}"))
    };

    if len <= MIN_STEM {
        return word.to_string();
    }
    strip("ies", "y")
        .or_else(|| strip("sses", "ss"))
        .or_else(|| {
            if word.ends_with("ss") || word.ends_with("us") || word.ends_with("is") {
                None
            } else {
                strip("s", "")
            }
        })
        .or_else(|| strip("ing", ""))
        .or_else(|| strip("ed", ""))
        .unwrap_or_else(|| word.to_string())
}

/// Lower-case, filter and lemmatize `text`, returning the tokens joined by a
/// single space.
pub fn preprocess_text(text: &str) -> String {
    words(text)
        .into_iter()
        .filter(|w| w.chars().all(char::is_alphabetic))
        .map(str::to_lowercase)
        .filter(|w| !is_stop_word(w))
        .map(|w| lemmatize(&w))
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lemmatize_suffix_rules() {
        assert_eq!(lemmatize("stories"), "story");
        assert_eq!(lemmatize("classes"), "class");
        assert_eq!(lemmatize("cats"), "cat");
        assert_eq!(lemmatize("walking"), "walk");
        assert_eq!(lemmatize("jumped"), "jump");
        assert_eq!(lemmatize("glass"), "glass");
        assert_eq!(lemmatize("status"), "status");
        assert_eq!(lemmatize("is"), "is");
        assert_eq!(lemmatize("bed"), "bed");
    }

    #[test]
    fn preprocess_filters_and_normalizes() {
        assert_eq!(
            preprocess_text("The 3 Cats were walking, and they jumped!"),
            "cat walk jump"
        );
    }

    #[test]
    fn preprocess_empty() {
        assert_eq!(preprocess_text(""), "");
    }
}
