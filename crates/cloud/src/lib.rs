//! Image hosting backends.
//!
//! Handlers talk to an [`ImageHost`] trait object so the storage backend
//! (Cloudinary or the local media directory) is chosen once at startup.

use async_trait::async_trait;
use serde::Serialize;

pub mod cloudinary;
pub mod local;

pub use cloudinary::{CloudinaryConfig, CloudinaryHost};
pub use local::LocalHost;

/// Errors from an image host.
#[derive(Debug, thiserror::Error)]
pub enum HostError {
    /// The HTTP request itself failed (network, DNS, TLS, etc.).
    #[error("HTTP request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The host returned a non-2xx status code.
    #[error("Image host error ({status}): {body}")]
    Api { status: u16, body: String },

    /// Reading or writing the local store failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// No asset is stored under the given public id.
    #[error("Image not found: {0}")]
    NotFound(String),

    /// The host is missing configuration or was handed an unusable id.
    #[error("Image host misconfigured: {0}")]
    Config(String),
}

/// How an asset should be stored.
#[derive(Debug, Clone)]
pub struct UploadOptions {
    /// Original (sanitized) filename, used for the multipart part name.
    pub filename: String,
    /// File extension of the encoded bytes, e.g. `png`.
    pub format: String,
    /// Reuse this public id instead of letting the host assign one.
    pub public_id: Option<String>,
    /// Replace an existing asset with the same public id.
    pub overwrite: bool,
}

impl UploadOptions {
    /// Options for a brand-new asset.
    pub fn new(filename: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            format: format.into(),
            public_id: None,
            overwrite: false,
        }
    }

    /// Options replacing the asset stored under `public_id`.
    pub fn replace(public_id: impl Into<String>, filename: impl Into<String>, format: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            format: format.into(),
            public_id: Some(public_id.into()),
            overwrite: true,
        }
    }
}

/// A stored asset as reported by the host.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HostedImage {
    pub public_id: String,
    pub secure_url: String,
    pub format: String,
}

/// A place images can be stored, downloaded from and removed from.
#[async_trait]
pub trait ImageHost: Send + Sync {
    /// Store `bytes`, returning the public id and delivery URL.
    async fn upload(&self, bytes: Vec<u8>, options: UploadOptions) -> Result<HostedImage, HostError>;

    /// Download the current bytes of an asset.
    async fn fetch(&self, public_id: &str) -> Result<Vec<u8>, HostError>;

    /// Remove an asset. Removing a missing asset is not an error.
    async fn destroy(&self, public_id: &str) -> Result<(), HostError>;
}

/// Generate a fresh public id.
pub fn new_public_id() -> String {
    uuid::Uuid::new_v4().simple().to_string()
}
