use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};
use serde::Serialize;

use crate::config::ImageHostKind;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the database does not answer.
    pub status: &'static str,
    pub version: &'static str,
    pub db_healthy: bool,
    /// Backend the image endpoints store to.
    pub image_host: &'static str,
}

/// GET /health
///
/// Always answers 200 so load balancers can tell a slow database apart from
/// a dead process; the body carries the detail.
async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let db_healthy = tabula_db::health_check(&state.pool).await.is_ok();
    if !db_healthy {
        tracing::warn!("Health check could not reach the database");
    }

    Json(HealthResponse {
        status: if db_healthy { "ok" } else { "degraded" },
        version: env!("CARGO_PKG_VERSION"),
        db_healthy,
        image_host: match state.config.image_host {
            ImageHostKind::Local => "local",
            ImageHostKind::Cloudinary => "cloudinary",
        },
    })
}

/// `/health`, mounted at the root rather than under `/api/v1`.
pub fn router() -> Router<AppState> {
    Router::new().route("/health", get(health))
}
