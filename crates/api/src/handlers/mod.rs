//! Request handlers, one submodule per resource.
//!
//! Handlers delegate storage to the repositories in `tabula_db`, pure
//! computation to `tabula_core`, and map errors via [`AppError`]. CPU-bound
//! work (image transforms, chart rendering, t-SNE) runs on the blocking pool.

pub mod images;
pub mod loans;
pub mod movies;
pub mod text;

use axum::extract::Multipart;
use tabula_core::error::CoreError;
use tabula_core::naming::has_extension;

use crate::error::{AppError, AppResult};

/// Run CPU-bound work on the blocking thread pool.
pub(crate) async fn run_blocking<T, F>(work: F) -> AppResult<T>
where
    F: FnOnce() -> Result<T, CoreError> + Send + 'static,
    T: Send + 'static,
{
    let result = tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| AppError::InternalError(format!("Blocking task failed: {e}")))?;
    Ok(result?)
}

/// A file part pulled out of a multipart body.
pub(crate) struct UploadedFile {
    /// Client-supplied filename; empty when the part had none.
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Collect every part named `field`, in request order. Other parts are skipped.
pub(crate) async fn read_file_fields(
    multipart: &mut Multipart,
    field: &str,
) -> AppResult<Vec<UploadedFile>> {
    let mut files = Vec::new();
    while let Some(part) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(e.to_string()))?
    {
        if part.name() != Some(field) {
            continue;
        }
        let filename = part.file_name().unwrap_or_default().to_string();
        let bytes = part
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(e.to_string()))?;
        files.push(UploadedFile {
            filename,
            bytes: bytes.to_vec(),
        });
    }
    Ok(files)
}

/// Read the CSV file uploaded in the `file` part.
pub(crate) async fn read_csv_upload(multipart: &mut Multipart) -> AppResult<Vec<u8>> {
    let file = read_file_fields(multipart, "file")
        .await?
        .into_iter()
        .next()
        .ok_or_else(|| AppError::BadRequest("No file part".to_string()))?;
    if file.filename.is_empty() {
        return Err(AppError::BadRequest("No selected file".to_string()));
    }
    if !has_extension(&file.filename, "csv") {
        return Err(AppError::BadRequest(
            "Invalid file format. Please upload a CSV file.".to_string(),
        ));
    }
    Ok(file.bytes)
}

/// Prefix a row-level validation message with the row it came from.
pub(crate) fn in_row(err: CoreError, id_column: &str, id: i64) -> CoreError {
    match err {
        CoreError::Validation(msg) => CoreError::Validation(format!("{id_column} {id}: {msg}")),
        other => other,
    }
}
