//! Handlers for the `/text` analysis endpoints.

use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use tabula_core::chart::{self, BLUE};
use tabula_core::error::CoreError;
use tabula_core::text::{
    analyze_sentiment, document_map, extract_keywords, preprocess_text, summarize_text,
    validate_text_input, Sentiment, MAX_TEXT_LENGTH,
};

use super::run_blocking;
use crate::error::AppResult;
use crate::response::png_response;

#[derive(Debug, Deserialize)]
pub struct TextRequest {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextsRequest {
    #[serde(default)]
    pub texts: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SummaryResponse {
    pub summary: String,
}

#[derive(Debug, Serialize)]
pub struct KeywordsResponse {
    pub keywords: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct SentimentResponse {
    pub sentiment: Sentiment,
}

#[derive(Debug, Serialize)]
pub struct PreprocessResponse {
    pub text: String,
}

/// POST /api/v1/text/summarize
pub async fn summarize(Json(input): Json<TextRequest>) -> AppResult<Json<SummaryResponse>> {
    let text = validate_text_input(input.text.as_deref())?;
    Ok(Json(SummaryResponse {
        summary: summarize_text(text),
    }))
}

/// POST /api/v1/text/keywords
pub async fn keywords(Json(input): Json<TextRequest>) -> AppResult<Json<KeywordsResponse>> {
    let text = validate_text_input(input.text.as_deref())?;
    Ok(Json(KeywordsResponse {
        keywords: extract_keywords(text),
    }))
}

/// POST /api/v1/text/sentiment
pub async fn sentiment(Json(input): Json<TextRequest>) -> AppResult<Json<SentimentResponse>> {
    let text = validate_text_input(input.text.as_deref())?;
    Ok(Json(SentimentResponse {
        sentiment: analyze_sentiment(text),
    }))
}

/// POST /api/v1/text/preprocess
pub async fn preprocess(Json(input): Json<TextRequest>) -> AppResult<Json<PreprocessResponse>> {
    let text = validate_text_input(input.text.as_deref())?;
    Ok(Json(PreprocessResponse {
        text: preprocess_text(text),
    }))
}

/// POST /api/v1/text/generate_tsne
///
/// TF-IDF vectors of the texts embedded in 2-D, drawn as a scatter plot.
pub async fn generate_tsne(Json(input): Json<TextsRequest>) -> AppResult<impl IntoResponse> {
    if let Some(long) = input.texts.iter().find(|t| t.len() > MAX_TEXT_LENGTH) {
        return Err(CoreError::Validation(format!(
            "Text exceeds maximum length of {MAX_TEXT_LENGTH} bytes (got {})",
            long.len()
        ))
        .into());
    }
    let count = input.texts.len();
    let png = run_blocking(move || {
        let points = document_map(&input.texts)?;
        chart::scatter_chart(&points, BLUE, chart::SCATTER_WIDTH, chart::SCATTER_HEIGHT)
    })
    .await?;
    tracing::debug!(count, "t-SNE map rendered");
    Ok(png_response(png))
}
