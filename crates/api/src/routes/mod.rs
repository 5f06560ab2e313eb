pub mod health;
pub mod images;
pub mod loans;
pub mod movies;
pub mod text;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /loans                                  list, create
/// /loans/upload_csv                       CSV bulk import (POST)
/// /loans/filter                           filter + aggregate (POST)
/// /loans/stats                            column statistics (POST)
/// /loans/chart                            column histogram PNG (POST)
/// /loans/graph                            sorted column line PNG (POST)
/// /loans/{loan_id}                        get, update, delete
///
/// /movies                                 list, create
/// /movies/upload_csv                      CSV bulk import (POST)
/// /movies/search                          title / director search (GET)
/// /movies/filter                          filtered listing (GET)
/// /movies/{id}                            get, update, delete
///
/// /images                                 list
/// /images/upload_image                    single upload (POST)
/// /images/upload_images                   batch upload (POST)
/// /images/public/{public_id}              get by host id
/// /images/{id}                            get, delete
/// /images/{id}/histogram                  RGB histogram (GET)
/// /images/{id}/segmentation               HSV mask PNG (POST)
/// /images/{id}/resize                     resize + re-host (POST)
/// /images/{id}/crop                       crop + re-host (POST)
///
/// /text/summarize                         extractive summary (POST)
/// /text/keywords                          keyword extraction (POST)
/// /text/sentiment                         polarity / subjectivity (POST)
/// /text/preprocess                        normalized text (POST)
/// /text/generate_tsne                     t-SNE scatter PNG (POST)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/loans", loans::router())
        .nest("/movies", movies::router())
        .nest("/images", images::router())
        .nest("/text", text::router())
}
