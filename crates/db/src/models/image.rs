//! Hosted image entity and DTOs.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tabula_core::types::{DbId, Timestamp};

/// A row from the `images` table.
///
/// `public_id` is the identifier assigned by the image host and is unique.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Image {
    pub id: DbId,
    pub filename: String,
    pub url: String,
    pub public_id: String,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for recording a freshly hosted image.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateImage {
    pub filename: String,
    pub url: String,
    pub public_id: String,
}
