//! Handlers for the `/images` resource.
//!
//! Image bytes live on the configured [`tabula_cloud::ImageHost`]; the
//! `images` table records the filename, delivery URL and public id. Derived
//! images (resize, crop) replace the hosted asset under the same public id.

use axum::extract::{Multipart, Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};
use tabula_cloud::UploadOptions;
use tabula_core::chart::{self, Series, BLUE, GREEN, RED};
use tabula_core::imaging::{
    self, color_histogram, decode, resolve_output_format, CropBox, DecodedImage, Hsv,
    OutputFormat,
};
use tabula_core::naming::secure_filename;
use tabula_core::pagination::{Page, DEFAULT_IMAGE_PER_PAGE};
use tabula_core::types::DbId;
use tabula_db::models::image::{CreateImage, Image};
use tabula_db::repositories::ImageRepo;

use super::{read_file_fields, run_blocking, UploadedFile};
use crate::error::{AppError, AppResult};
use crate::query::{FormatParams, PaginationParams};
use crate::response::{png_response, MessageResponse};
use crate::state::AppState;

/// Longest filename stored in the `images` table.
const MAX_FILENAME_LENGTH: usize = 255;

/// Stored name when sanitizing leaves nothing usable.
const FALLBACK_FILENAME: &str = "image";

// ---------------------------------------------------------------------------
// Request / response types
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub struct ImageUploadedResponse {
    pub message: String,
    pub image_url: String,
    pub image: Image,
}

/// One file of a batch upload that could not be stored.
#[derive(Debug, Serialize)]
pub struct FailedUpload {
    pub filename: String,
    pub error: String,
}

#[derive(Debug, Serialize)]
pub struct BatchUploadResponse {
    pub message: String,
    pub image_urls: Vec<String>,
    pub uploaded: Vec<Image>,
    pub failed: Vec<FailedUpload>,
}

/// Reply of the transforms that re-host an image.
#[derive(Debug, Serialize)]
pub struct ImageUrlResponse {
    pub message: String,
    pub image_url: String,
}

/// Body of `POST /images/{id}/segmentation`: inclusive HSV bounds.
#[derive(Debug, Deserialize)]
pub struct SegmentationRequest {
    pub lower_bound: Option<Vec<i64>>,
    pub upper_bound: Option<Vec<i64>>,
}

/// Body of `POST /images/{id}/resize`.
#[derive(Debug, Deserialize)]
pub struct ResizeRequest {
    pub width: Option<i64>,
    pub height: Option<i64>,
    /// `png`, `jpeg`/`jpg` or `webp`; defaults to the source format.
    pub format_type: Option<String>,
}

/// Body of `POST /images/{id}/crop`.
#[derive(Debug, Deserialize)]
pub struct CropRequest {
    pub x: Option<i64>,
    pub y: Option<i64>,
    pub width: Option<i64>,
    pub height: Option<i64>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

fn image_not_found() -> AppError {
    AppError::NotFound("Image not found in database".to_string())
}

/// Sanitize a client filename for storage.
fn stored_filename(raw: &str) -> String {
    let mut name = secure_filename(raw);
    if name.is_empty() {
        name = FALLBACK_FILENAME.to_string();
    }
    // Sanitized names are ASCII, so byte truncation is safe.
    name.truncate(MAX_FILENAME_LENGTH);
    name
}

async fn find_image(state: &AppState, id: DbId) -> AppResult<Image> {
    ImageRepo::find_by_id(&state.pool, id)
        .await?
        .ok_or_else(image_not_found)
}

/// Look up an image row and download and decode its current bytes.
async fn load_image(state: &AppState, id: DbId) -> AppResult<(Image, DecodedImage)> {
    let image = find_image(state, id).await?;
    let bytes = state.image_host.fetch(&image.public_id).await?;
    let decoded = run_blocking(move || decode(&bytes)).await?;
    Ok((image, decoded))
}

/// Validate, host and record one uploaded file.
///
/// If recording the row fails, the freshly hosted asset is removed again.
async fn store_upload(state: &AppState, file: UploadedFile) -> AppResult<Image> {
    if file.filename.is_empty() {
        return Err(AppError::BadRequest("No selected file".to_string()));
    }
    let filename = stored_filename(&file.filename);

    let bytes = file.bytes;
    let (bytes, format) = run_blocking(move || {
        let decoded = decode(&bytes)?;
        let format = resolve_output_format(None, decoded.format)?;
        Ok((bytes, format))
    })
    .await?;

    let hosted = state
        .image_host
        .upload(bytes, UploadOptions::new(filename.clone(), format.extension()))
        .await?;

    let input = CreateImage {
        filename,
        url: hosted.secure_url,
        public_id: hosted.public_id,
    };
    match ImageRepo::create(&state.pool, &input).await {
        Ok(image) => {
            tracing::info!(image_id = image.id, public_id = %image.public_id, "Image uploaded");
            Ok(image)
        }
        Err(err) => {
            if let Err(cleanup) = state.image_host.destroy(&input.public_id).await {
                tracing::warn!(
                    public_id = %input.public_id,
                    error = %cleanup,
                    "Failed to remove hosted image after database error",
                );
            }
            Err(err.into())
        }
    }
}

/// Re-host transformed bytes under the row's public id and point the row at
/// the new URL.
async fn replace_hosted(
    state: &AppState,
    image: &Image,
    bytes: Vec<u8>,
    format: OutputFormat,
) -> AppResult<String> {
    let hosted = state
        .image_host
        .upload(
            bytes,
            UploadOptions::replace(&image.public_id, &image.filename, format.extension()),
        )
        .await?;
    let updated = ImageRepo::update_url(&state.pool, image.id, &hosted.secure_url)
        .await?
        .ok_or_else(image_not_found)?;
    Ok(updated.url)
}

// ---------------------------------------------------------------------------
// Upload and lookup
// ---------------------------------------------------------------------------

/// POST /api/v1/images/upload_image
///
/// Multipart field `image`.
pub async fn upload_image(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<(StatusCode, Json<ImageUploadedResponse>)> {
    let file = read_file_fields(&mut multipart, "image")
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::BadRequest("No file part".to_string()))?;

    let image = store_upload(&state, file).await?;
    Ok((
        StatusCode::CREATED,
        Json(ImageUploadedResponse {
            message: "Image uploaded successfully".to_string(),
            image_url: image.url.clone(),
            image,
        }),
    ))
}

/// POST /api/v1/images/upload_images
///
/// Repeated multipart field `images`. A file that fails is reported in
/// `failed` and does not stop the rest of the batch.
pub async fn upload_images(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> AppResult<Json<BatchUploadResponse>> {
    let files = read_file_fields(&mut multipart, "images").await?;
    if files.is_empty() {
        return Err(AppError::BadRequest("No files provided".to_string()));
    }

    let mut uploaded = Vec::with_capacity(files.len());
    let mut failed = Vec::new();
    for file in files {
        let filename = file.filename.clone();
        match store_upload(&state, file).await {
            Ok(image) => uploaded.push(image),
            Err(err) => {
                let (_, _, message) = err.classify();
                tracing::warn!(filename = %filename, error = %err, "Image in batch rejected");
                failed.push(FailedUpload {
                    filename,
                    error: message,
                });
            }
        }
    }

    let message = if failed.is_empty() {
        "Images uploaded successfully".to_string()
    } else {
        format!(
            "{} of {} images uploaded successfully",
            uploaded.len(),
            uploaded.len() + failed.len()
        )
    };
    Ok(Json(BatchUploadResponse {
        message,
        image_urls: uploaded.iter().map(|i| i.url.clone()).collect(),
        uploaded,
        failed,
    }))
}

/// GET /api/v1/images/{id}
pub async fn get_by_id(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<Image>> {
    Ok(Json(find_image(&state, id).await?))
}

/// GET /api/v1/images/public/{public_id}
pub async fn get_by_public_id(
    State(state): State<AppState>,
    Path(public_id): Path<String>,
) -> AppResult<Json<Image>> {
    let image = ImageRepo::find_by_public_id(&state.pool, &public_id)
        .await?
        .ok_or_else(image_not_found)?;
    Ok(Json(image))
}

/// GET /api/v1/images?page=&per_page=
pub async fn list(
    State(state): State<AppState>,
    Query(params): Query<PaginationParams>,
) -> AppResult<Json<Page<Image>>> {
    let page = params.resolve(DEFAULT_IMAGE_PER_PAGE);
    let total = ImageRepo::count(&state.pool).await?;
    let images = ImageRepo::list(&state.pool, page).await?;
    Ok(Json(Page::new(page, total, images)))
}

/// DELETE /api/v1/images/{id}
///
/// Removes the hosted asset first, then the row.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
) -> AppResult<Json<MessageResponse>> {
    let image = find_image(&state, id).await?;
    state.image_host.destroy(&image.public_id).await?;
    if !ImageRepo::delete(&state.pool, id).await? {
        return Err(image_not_found());
    }
    tracing::info!(image_id = id, public_id = %image.public_id, "Image deleted");
    Ok(Json(MessageResponse::new("Image deleted")))
}

// ---------------------------------------------------------------------------
// Analysis and transforms
// ---------------------------------------------------------------------------

/// GET /api/v1/images/{id}/histogram?format=png|json
///
/// Per-channel RGB intensity counts, drawn as three lines or returned raw.
pub async fn histogram(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Query(params): Query<FormatParams>,
) -> AppResult<Response> {
    let format = params
        .format
        .as_deref()
        .map(|f| f.trim().to_ascii_lowercase())
        .unwrap_or_else(|| "png".to_string());
    if format != "png" && format != "json" {
        return Err(AppError::BadRequest(format!(
            "Unsupported format '{format}'. Must be png or json"
        )));
    }

    let (_, decoded) = load_image(&state, id).await?;
    let hist = run_blocking(move || Ok(color_histogram(&decoded.image))).await?;
    if format == "json" {
        return Ok(Json(hist).into_response());
    }

    let png = run_blocking(move || {
        let to_f64 = |counts: &[u64]| counts.iter().map(|c| *c as f64).collect::<Vec<_>>();
        chart::line_chart(
            &[
                Series::indexed(&to_f64(&hist.red), RED),
                Series::indexed(&to_f64(&hist.green), GREEN),
                Series::indexed(&to_f64(&hist.blue), BLUE),
            ],
            chart::DEFAULT_WIDTH,
            chart::DEFAULT_HEIGHT,
        )
    })
    .await?;
    Ok(png_response(png).into_response())
}

/// POST /api/v1/images/{id}/segmentation
///
/// Keeps pixels inside the HSV box and blackens the rest; answers with PNG.
pub async fn segmentation(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<SegmentationRequest>,
) -> AppResult<impl IntoResponse> {
    let (Some(lower), Some(upper)) = (&input.lower_bound, &input.upper_bound) else {
        return Err(AppError::BadRequest("Color bounds are required".to_string()));
    };
    let lower = Hsv::from_components(lower, "lower_bound")?;
    let upper = Hsv::from_components(upper, "upper_bound")?;

    let (_, decoded) = load_image(&state, id).await?;
    let png = run_blocking(move || {
        let mask = imaging::segment_by_hsv(&decoded.image, lower, upper);
        imaging::encode_png(&mask)
    })
    .await?;
    Ok(png_response(png))
}

/// POST /api/v1/images/{id}/resize
///
/// Resizes to exactly `width` x `height`, optionally converting format, and
/// replaces the hosted image.
pub async fn resize(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<ResizeRequest>,
) -> AppResult<Json<ImageUrlResponse>> {
    let (Some(width), Some(height)) = (
        input.width.filter(|w| *w != 0),
        input.height.filter(|h| *h != 0),
    ) else {
        return Err(AppError::BadRequest(
            "Width and height are required".to_string(),
        ));
    };
    let requested = input
        .format_type
        .as_deref()
        .filter(|f| !f.trim().is_empty())
        .map(OutputFormat::parse)
        .transpose()?;

    let (image, decoded) = load_image(&state, id).await?;
    let (bytes, format) = run_blocking(move || {
        let format = match requested {
            Some(format) => format,
            None => resolve_output_format(None, decoded.format)?,
        };
        let resized = imaging::resize(&decoded.image, width, height)?;
        Ok((imaging::encode(&resized, format)?, format))
    })
    .await?;

    let image_url = replace_hosted(&state, &image, bytes, format).await?;
    tracing::info!(image_id = id, width, height, ?format, "Image resized");
    Ok(Json(ImageUrlResponse {
        message: "Image resized and transformed successfully".to_string(),
        image_url,
    }))
}

/// POST /api/v1/images/{id}/crop
///
/// Crops to the given rectangle, keeping the source format, and replaces the
/// hosted image.
pub async fn crop(
    State(state): State<AppState>,
    Path(id): Path<DbId>,
    Json(input): Json<CropRequest>,
) -> AppResult<Json<ImageUrlResponse>> {
    let (Some(x), Some(y), Some(width), Some(height)) =
        (input.x, input.y, input.width, input.height)
    else {
        return Err(AppError::BadRequest(
            "x, y, width, and height are required for cropping".to_string(),
        ));
    };

    let (image, decoded) = load_image(&state, id).await?;
    let (bytes, format) = run_blocking(move || {
        let area = CropBox::new(
            x,
            y,
            width,
            height,
            decoded.image.width(),
            decoded.image.height(),
        )?;
        let format = resolve_output_format(None, decoded.format)?;
        let cropped = imaging::crop(&decoded.image, area);
        Ok((imaging::encode(&cropped, format)?, format))
    })
    .await?;

    let image_url = replace_hosted(&state, &image, bytes, format).await?;
    tracing::info!(image_id = id, x, y, width, height, "Image cropped");
    Ok(Json(ImageUrlResponse {
        message: "Image cropped successfully".to_string(),
        image_url,
    }))
}
