use std::path::PathBuf;

/// Which [`tabula_cloud::ImageHost`] backs the image endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageHostKind {
    /// Files on local disk, served under `/media`.
    Local,
    /// Cloudinary REST API (credentials from `CLOUDINARY_*`).
    Cloudinary,
}

impl ImageHostKind {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "local" => Some(Self::Local),
            "cloudinary" => Some(Self::Cloudinary),
            _ => None,
        }
    }
}

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `3000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Largest accepted request body, in bytes (default: 20 MiB).
    pub max_upload_bytes: usize,
    /// Image storage backend (default: `local`).
    pub image_host: ImageHostKind,
    /// Directory of the local image store (default: `./media`).
    pub media_dir: PathBuf,
    /// Public URL prefix of the local image store.
    pub media_base_url: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                       |
    /// |------------------------|-------------------------------|
    /// | `HOST`                 | `0.0.0.0`                     |
    /// | `PORT`                 | `3000`                        |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`       |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                          |
    /// | `MAX_UPLOAD_BYTES`     | `20971520`                    |
    /// | `IMAGE_HOST`           | `local`                       |
    /// | `MEDIA_DIR`            | `./media`                     |
    /// | `MEDIA_BASE_URL`       | `http://localhost:3000/media` |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "3000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let max_upload_bytes: usize = std::env::var("MAX_UPLOAD_BYTES")
            .unwrap_or_else(|_| "20971520".into())
            .parse()
            .expect("MAX_UPLOAD_BYTES must be a valid usize");

        let image_host = std::env::var("IMAGE_HOST")
            .map(|v| ImageHostKind::parse(&v).expect("IMAGE_HOST must be 'local' or 'cloudinary'"))
            .unwrap_or(ImageHostKind::Local);

        let media_dir = PathBuf::from(std::env::var("MEDIA_DIR").unwrap_or_else(|_| "./media".into()));

        let media_base_url = std::env::var("MEDIA_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:3000/media".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            max_upload_bytes,
            image_host,
            media_dir,
            media_base_url,
        }
    }
}
