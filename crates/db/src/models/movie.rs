//! Movie entity, DTOs and listing filter.

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use tabula_core::types::{DbId, Timestamp};

/// A row from the `movies` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Movie {
    pub id: DbId,
    pub title: String,
    pub director: String,
    pub release_year: i32,
    pub runtime: i32,
    pub genre: String,
    pub rating: f64,
    pub gross: f64,
    pub created_at: Timestamp,
    pub updated_at: Timestamp,
}

/// DTO for inserting a movie.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateMovie {
    pub title: String,
    pub director: String,
    pub release_year: i32,
    pub runtime: i32,
    pub genre: String,
    pub rating: f64,
    pub gross: f64,
}

/// DTO for a partial update. `None` leaves the column unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMovie {
    pub title: Option<String>,
    pub director: Option<String>,
    pub release_year: Option<i32>,
    pub runtime: Option<i32>,
    pub genre: Option<String>,
    pub rating: Option<f64>,
    pub gross: Option<f64>,
}

/// Optional, AND-ed conditions for the movie filter listing.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MovieFilter {
    /// Case-insensitive substring of the genre.
    pub genre: Option<String>,
    /// Exact release year.
    pub release_year: Option<i32>,
    /// Inclusive lower bound on gross.
    pub min_gross: Option<f64>,
    /// Inclusive lower bound on rating.
    pub min_rating: Option<f64>,
}
