//! Route definitions for hosted images and their transforms.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::images;
use crate::state::AppState;

/// Routes mounted at `/images`.
///
/// ```text
/// GET    /                        -> list
/// POST   /upload_image            -> upload_image
/// POST   /upload_images           -> upload_images
/// GET    /public/{public_id}      -> get_by_public_id
/// GET    /{id}                    -> get_by_id
/// DELETE /{id}                    -> delete
/// GET    /{id}/histogram          -> histogram
/// POST   /{id}/segmentation       -> segmentation
/// POST   /{id}/resize             -> resize
/// POST   /{id}/crop               -> crop
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(images::list))
        .route("/upload_image", post(images::upload_image))
        .route("/upload_images", post(images::upload_images))
        .route("/public/{public_id}", get(images::get_by_public_id))
        .route("/{id}", get(images::get_by_id).delete(images::delete))
        .route("/{id}/histogram", get(images::histogram))
        .route("/{id}/segmentation", post(images::segmentation))
        .route("/{id}/resize", post(images::resize))
        .route("/{id}/crop", post(images::crop))
}
