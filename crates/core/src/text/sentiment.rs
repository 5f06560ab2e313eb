//! Lexicon-based sentiment scoring.
//!
//! Each opinion word carries a polarity in `[-1, 1]` and a subjectivity in
//! `[0, 1]`. A preceding intensifier scales both; a preceding negation flips
//! and dampens polarity. The document score is the mean over opinion words.

use std::collections::HashMap;
use std::sync::LazyLock;

use serde::Serialize;

use super::tokenize::{is_stop_word, words};

/// Polarity multiplier applied after a negation.
const NEGATION_FACTOR: f64 = -0.5;

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Sentiment {
    pub polarity: f64,
    pub subjectivity: f64,
}

/// (word, polarity, subjectivity)
const LEXICON_ENTRIES: &[(&str, f64, f64)] = &[
    ("good", 0.7, 0.6),
    ("great", 0.8, 0.75),
    ("excellent", 1.0, 1.0),
    ("amazing", 0.6, 0.9),
    ("awesome", 1.0, 1.0),
    ("wonderful", 1.0, 1.0),
    ("fantastic", 0.4, 0.9),
    ("brilliant", 0.9, 1.0),
    ("best", 1.0, 0.3),
    ("better", 0.5, 0.5),
    ("nice", 0.6, 1.0),
    ("love", 0.5, 0.6),
    ("loved", 0.7, 0.8),
    ("like", 0.2, 0.4),
    ("happy", 0.8, 1.0),
    ("glad", 0.5, 1.0),
    ("beautiful", 0.85, 1.0),
    ("perfect", 1.0, 1.0),
    ("enjoy", 0.4, 0.5),
    ("enjoyed", 0.4, 0.5),
    ("pleasant", 0.73, 0.97),
    ("positive", 0.23, 0.55),
    ("fun", 0.3, 0.2),
    ("interesting", 0.5, 0.5),
    ("helpful", 0.5, 0.5),
    ("easy", 0.43, 0.83),
    ("fast", 0.2, 0.6),
    ("clean", 0.37, 0.69),
    ("bad", -0.7, 0.67),
    ("worse", -0.4, 0.6),
    ("worst", -1.0, 1.0),
    ("terrible", -1.0, 1.0),
    ("awful", -1.0, 1.0),
    ("horrible", -1.0, 1.0),
    ("poor", -0.4, 0.6),
    ("sad", -0.5, 1.0),
    ("angry", -0.5, 1.0),
    ("hate", -0.8, 0.9),
    ("hated", -0.9, 0.7),
    ("boring", -1.0, 1.0),
    ("ugly", -0.7, 1.0),
    ("wrong", -0.5, 0.9),
    ("broken", -0.4, 0.4),
    ("slow", -0.3, 0.4),
    ("difficult", -0.5, 1.0),
    ("disappointing", -0.6, 0.7),
    ("disappointed", -0.75, 0.75),
    ("annoying", -0.8, 0.9),
    ("dull", -0.31, 0.67),
    ("negative", -0.3, 0.4),
    ("stupid", -0.8, 1.0),
    ("expensive", -0.5, 0.7),
    ("cheap", 0.4, 0.7),
];

/// Words that scale the next opinion word.
const INTENSIFIERS: &[(&str, f64)] = &[
    ("very", 1.3),
    ("really", 1.3),
    ("extremely", 1.5),
    ("incredibly", 1.5),
    ("so", 1.2),
    ("too", 1.2),
    ("quite", 1.1),
    ("pretty", 1.1),
    ("somewhat", 0.8),
    ("slightly", 0.6),
];

const NEGATIONS: &[&str] = &["not", "never", "no", "nothing", "hardly", "neither", "nor"];

static LEXICON: LazyLock<HashMap<&'static str, (f64, f64)>> = LazyLock::new(|| {
    LEXICON_ENTRIES
        .iter()
        .map(|(word, polarity, subjectivity)| (*word, (*polarity, *subjectivity)))
        .collect()
});

fn is_negation(word: &str) -> bool {
    NEGATIONS.contains(&word) || word.ends_with("n't") || word.ends_with("n\u{2019}t")
}

fn intensity(word: &str) -> Option<f64> {
    INTENSIFIERS
        .iter()
        .find(|(w, _)| *w == word)
        .map(|(_, factor)| *factor)
}

/// Score the sentiment of `text`. Text without opinion words scores `0/0`.
pub fn analyze_sentiment(text: &str) -> Sentiment {
    let mut scores: Vec<(f64, f64)> = Vec::new();
    let mut boost = 1.0;
    let mut negated = false;

    for token in words(text) {
        let word = token.to_lowercase();
        if let Some(factor) = intensity(&word) {
            boost *= factor;
            continue;
        }
        if is_negation(&word) {
            negated = !negated;
            continue;
        }
        if let Some(&(polarity, subjectivity)) = LEXICON.get(word.as_str()) {
            let mut polarity = polarity * boost;
            if negated {
                polarity *= NEGATION_FACTOR;
            }
            scores.push((polarity.clamp(-1.0, 1.0), (subjectivity * boost).min(1.0)));
            boost = 1.0;
            negated = false;
            continue;
        }
        // Modifiers carry over function words ("not at all good") but not
        // over other content words.
        if !is_stop_word(&word) {
            boost = 1.0;
            negated = false;
        }
    }

    if scores.is_empty() {
        return Sentiment { polarity: 0.0, subjectivity: 0.0 };
    }
    let n = scores.len() as f64;
    let polarity = scores.iter().map(|(p, _)| p).sum::<f64>() / n;
    let subjectivity = scores.iter().map(|(_, s)| s).sum::<f64>() / n;
    Sentiment {
        polarity: polarity.clamp(-1.0, 1.0),
        subjectivity: subjectivity.clamp(0.0, 1.0),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn neutral_text_scores_zero() {
        let s = analyze_sentiment("The table has four legs.");
        assert_eq!(s, Sentiment { polarity: 0.0, subjectivity: 0.0 });
        assert_eq!(analyze_sentiment(""), Sentiment { polarity: 0.0, subjectivity: 0.0 });
    }

    #[test]
    fn positive_and_negative_words() {
        assert!(analyze_sentiment("What a good movie").polarity > 0.0);
        assert!(analyze_sentiment("What a terrible movie").polarity < 0.0);
    }

    #[test]
    fn intensifier_scales_and_caps_subjectivity() {
        let s = analyze_sentiment("very good");
        assert!(approx(s.polarity, 0.91));
        assert!(approx(s.subjectivity, 0.78));
        let s = analyze_sentiment("very nice");
        assert!(approx(s.subjectivity, 1.0));
    }

    #[test]
    fn negation_flips_and_dampens() {
        let s = analyze_sentiment("This is not good");
        assert!(approx(s.polarity, -0.35));
        let s = analyze_sentiment("It isn't bad at all");
        assert!(approx(s.polarity, 0.35));
    }

    #[test]
    fn modifier_reset_by_content_word() {
        let s = analyze_sentiment("not the movie, good acting");
        assert!(approx(s.polarity, 0.7));
    }

    #[test]
    fn scores_are_averaged() {
        let s = analyze_sentiment("good food, bad service");
        assert!(approx(s.polarity, 0.0));
        assert!(approx(s.subjectivity, (0.6 + 0.67) / 2.0));
    }
}
