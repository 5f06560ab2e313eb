//! Shared helpers for API integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::io::Cursor;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use axum::body::Body;
use axum::http::{header, Method, Request};
use axum::response::Response;
use axum::Router;
use http_body_util::BodyExt;
use image::{ImageFormat, Rgb, RgbImage};
use sqlx::PgPool;
use tower::ServiceExt;

use tabula_api::config::{ImageHostKind, ServerConfig};
use tabula_api::router::build_app_router;
use tabula_api::state::AppState;
use tabula_cloud::{new_public_id, HostError, HostedImage, ImageHost, UploadOptions};

const BOUNDARY: &str = "tabula-test-boundary";

// ---------------------------------------------------------------------------
// App construction
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` with safe defaults.
pub fn test_config() -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        max_upload_bytes: 5 * 1024 * 1024,
        image_host: ImageHostKind::Cloudinary,
        media_dir: std::env::temp_dir(),
        media_base_url: "http://localhost/media".to_string(),
    }
}

/// Build the full application router backed by a fresh in-memory image host.
pub fn build_test_app(pool: PgPool) -> Router {
    build_test_app_with_host(pool, Arc::new(MemoryHost::default()))
}

/// Build the full application router with the production middleware stack
/// and the given image host.
pub fn build_test_app_with_host(pool: PgPool, image_host: Arc<dyn ImageHost>) -> Router {
    let config = test_config();
    let state = AppState {
        pool,
        config: Arc::new(config.clone()),
        image_host,
    };
    build_app_router(state, &config)
}

// ---------------------------------------------------------------------------
// In-memory image host
// ---------------------------------------------------------------------------

/// [`ImageHost`] keeping assets in a map, keyed by public id.
#[derive(Default)]
pub struct MemoryHost {
    assets: Mutex<HashMap<String, (Vec<u8>, String)>>,
}

impl MemoryHost {
    pub fn contains(&self, public_id: &str) -> bool {
        self.assets.lock().unwrap().contains_key(public_id)
    }

    pub fn len(&self) -> usize {
        self.assets.lock().unwrap().len()
    }

    pub fn bytes(&self, public_id: &str) -> Option<Vec<u8>> {
        self.assets
            .lock()
            .unwrap()
            .get(public_id)
            .map(|(bytes, _)| bytes.clone())
    }
}

#[async_trait]
impl ImageHost for MemoryHost {
    async fn upload(
        &self,
        bytes: Vec<u8>,
        options: UploadOptions,
    ) -> Result<HostedImage, HostError> {
        let public_id = options.public_id.unwrap_or_else(new_public_id);
        let mut assets = self.assets.lock().unwrap();
        if !options.overwrite && assets.contains_key(&public_id) {
            return Err(HostError::Config(format!("{public_id} already exists")));
        }
        assets.insert(public_id.clone(), (bytes, options.format.clone()));
        Ok(HostedImage {
            secure_url: format!("memory://{public_id}.{}", options.format),
            public_id,
            format: options.format,
        })
    }

    async fn fetch(&self, public_id: &str) -> Result<Vec<u8>, HostError> {
        self.bytes(public_id)
            .ok_or_else(|| HostError::NotFound(public_id.to_string()))
    }

    async fn destroy(&self, public_id: &str) -> Result<(), HostError> {
        self.assets.lock().unwrap().remove(public_id);
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str) -> Response {
    let request = Request::builder().uri(uri).body(Body::empty()).unwrap();
    send(app, request).await
}

pub async fn delete(app: Router, uri: &str) -> Response {
    let request = Request::builder()
        .method(Method::DELETE)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    send(app, request).await
}

async fn send_json(app: Router, method: Method, uri: &str, body: serde_json::Value) -> Response {
    let request = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    send(app, request).await
}

pub async fn post_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::POST, uri, body).await
}

pub async fn put_json(app: Router, uri: &str, body: serde_json::Value) -> Response {
    send_json(app, Method::PUT, uri, body).await
}

/// One part of a multipart body.
pub struct FilePart<'a> {
    pub field: &'a str,
    pub filename: &'a str,
    pub content_type: &'a str,
    pub bytes: &'a [u8],
}

impl<'a> FilePart<'a> {
    pub fn csv(filename: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            field: "file",
            filename,
            content_type: "text/csv",
            bytes,
        }
    }

    pub fn png(field: &'a str, filename: &'a str, bytes: &'a [u8]) -> Self {
        Self {
            field,
            filename,
            content_type: "image/png",
            bytes,
        }
    }
}

pub async fn post_multipart(app: Router, uri: &str, parts: &[FilePart<'_>]) -> Response {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                part.field, part.filename, part.content_type
            )
            .as_bytes(),
        );
        body.extend_from_slice(part.bytes);
        body.extend_from_slice(b"\r\n");
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    let request = Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap();
    send(app, request).await
}

// ---------------------------------------------------------------------------
// Response helpers
// ---------------------------------------------------------------------------

pub async fn body_bytes(response: Response) -> Vec<u8> {
    response.into_body().collect().await.unwrap().to_bytes().to_vec()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

pub fn content_type(response: &Response) -> &str {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

// ---------------------------------------------------------------------------
// Fixtures
// ---------------------------------------------------------------------------

/// Encode a `width` x `height` PNG: left half red, right half blue.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = RgbImage::from_fn(width, height, |x, _| {
        if x < width / 2 {
            Rgb([255, 0, 0])
        } else {
            Rgb([0, 0, 255])
        }
    });
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).unwrap();
    out.into_inner()
}

pub const LOAN_CSV: &str = "loan_id,income,loan_amount,credit_score,loan_status,asset_value\n\
1,50000,10000,700,Approved,80000\n\
2,30000,20000,580,Rejected,20000\n\
3,90000,5000,810.4,Approved,150000\n\
4,,1000,600,Rejected,1000\n";

pub const MOVIE_CSV: &str = "id,title,director,release_year,runtime,genre,rating,gross\n\
1,Heat,Michael Mann,1995,170,Crime,8.3,187.4\n\
2,Collateral,Michael Mann,2004,120,Crime Thriller,7.5,220.9\n\
3,Alien,Ridley Scott,1979,117,Horror,8.5,106.3\n";
