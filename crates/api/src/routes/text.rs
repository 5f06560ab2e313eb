use axum::routing::post;
use axum::Router;

use crate::handlers::text;
use crate::state::AppState;

/// Routes mounted at `/text`. Every endpoint takes a JSON body.
///
/// ```text
/// POST   /summarize       -> summarize
/// POST   /keywords        -> keywords
/// POST   /sentiment       -> sentiment
/// POST   /preprocess      -> preprocess
/// POST   /generate_tsne   -> generate_tsne
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/summarize", post(text::summarize))
        .route("/keywords", post(text::keywords))
        .route("/sentiment", post(text::sentiment))
        .route("/preprocess", post(text::preprocess))
        .route("/generate_tsne", post(text::generate_tsne))
}
