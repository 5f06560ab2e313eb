//! Route definitions for loan approval records.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::loans;
use crate::state::AppState;

/// Routes mounted at `/loans`.
///
/// ```text
/// GET    /                -> list
/// POST   /                -> create
/// POST   /upload_csv      -> upload_csv
/// POST   /filter          -> filter
/// POST   /stats           -> stats
/// POST   /chart           -> chart
/// POST   /graph           -> graph
/// GET    /{loan_id}       -> get_by_id
/// PUT    /{loan_id}       -> update
/// DELETE /{loan_id}       -> delete
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(loans::list).post(loans::create))
        .route("/upload_csv", post(loans::upload_csv))
        .route("/filter", post(loans::filter))
        .route("/stats", post(loans::stats))
        .route("/chart", post(loans::chart))
        .route("/graph", post(loans::graph))
        .route(
            "/{loan_id}",
            get(loans::get_by_id)
                .put(loans::update)
                .delete(loans::delete),
        )
}
