//! Route definitions for movie records.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::movies;
use crate::state::AppState;

/// Routes mounted at `/movies`.
///
/// ```text
/// GET    /                -> list
/// POST   /                -> create
/// POST   /upload_csv      -> upload_csv
/// GET    /search          -> search
/// GET    /filter          -> filter
/// GET    /{id}            -> get_by_id
/// PUT    /{id}            -> update
/// DELETE /{id}            -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(movies::list).post(movies::create))
        .route("/upload_csv", post(movies::upload_csv))
        .route("/search", get(movies::search))
        .route("/filter", get(movies::filter))
        .route(
            "/{id}",
            get(movies::get_by_id)
                .put(movies::update)
                .delete(movies::delete),
        )
}
