//! Shared response types for API handlers.
//!
//! Mutations answer with a `{ "message": ... }` body, optionally carrying
//! the affected id or record. Use these structs instead of ad-hoc
//! `serde_json::json!` bodies.

use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use serde::Serialize;
use tabula_core::imaging::OutputFormat;

/// `{ "message": "..." }`.
#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Result of a CSV bulk upload.
#[derive(Debug, Serialize)]
pub struct ImportResponse {
    pub message: String,
    /// Rows written to the table.
    pub inserted: u64,
    /// Rows skipped because a required cell was empty.
    pub dropped: usize,
}

/// A binary image body with the matching `Content-Type`.
pub fn image_response(bytes: Vec<u8>, mime_type: &'static str) -> impl IntoResponse {
    (StatusCode::OK, [(header::CONTENT_TYPE, mime_type)], bytes)
}

/// A PNG body (charts, histograms, segmentation masks).
pub fn png_response(bytes: Vec<u8>) -> impl IntoResponse {
    image_response(bytes, OutputFormat::Png.mime_type())
}
