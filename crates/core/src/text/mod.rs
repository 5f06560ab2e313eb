//! Lightweight text analysis: extractive summaries, keyword extraction,
//! lexicon sentiment, normalization, and TF-IDF + t-SNE document maps.
//!
//! Everything here is rule based and deterministic. There is no trained
//! model behind it, so "entities" and "keywords" are heuristics over token
//! shape and a stop-word list.

pub mod keywords;
pub mod preprocess;
pub mod sentiment;
pub mod summarize;
pub mod tfidf;
pub mod tokenize;
pub mod tsne;

pub use keywords::extract_keywords;
pub use preprocess::preprocess_text;
pub use sentiment::{analyze_sentiment, Sentiment};
pub use summarize::summarize_text;
pub use tfidf::TfidfMatrix;
pub use tsne::{tsne_embed, TsneParams};

use crate::error::CoreError;

/// Minimum number of documents for a t-SNE map.
pub const MIN_TSNE_TEXTS: usize = 2;

/// Upper bound on t-SNE perplexity.
pub const MAX_PERPLEXITY: f64 = 30.0;

/// Maximum accepted input length in bytes for a single text.
pub const MAX_TEXT_LENGTH: usize = 200_000;

/// Maximum number of documents for a t-SNE map (exact t-SNE is quadratic).
pub const MAX_TSNE_TEXTS: usize = 1_000;

/// Validate a single text input: must contain something besides whitespace.
pub fn validate_text_input(text: Option<&str>) -> Result<&str, CoreError> {
    let text = text
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| CoreError::Validation("No text provided".to_string()))?;
    if text.len() > MAX_TEXT_LENGTH {
        return Err(CoreError::Validation(format!(
            "Text exceeds maximum length of {MAX_TEXT_LENGTH} bytes (got {})",
            text.len()
        )));
    }
    Ok(text)
}

/// Embed documents in 2-D: TF-IDF vectors, then t-SNE with perplexity
/// `min(n - 1, 30)` and a fixed seed.
pub fn document_map(texts: &[String]) -> Result<Vec<(f64, f64)>, CoreError> {
    if texts.len() < MIN_TSNE_TEXTS {
        return Err(CoreError::Validation(
            "Please provide at least two text inputs".to_string(),
        ));
    }
    if texts.len() > MAX_TSNE_TEXTS {
        return Err(CoreError::Validation(format!(
            "At most {MAX_TSNE_TEXTS} texts can be mapped at once (got {})",
            texts.len()
        )));
    }
    let matrix = TfidfMatrix::fit(texts);
    let params = TsneParams {
        perplexity: ((texts.len() - 1) as f64).min(MAX_PERPLEXITY),
        ..TsneParams::default()
    };
    tsne_embed(&matrix.rows, &params)
}
