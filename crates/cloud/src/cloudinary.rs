//! Cloudinary REST client.
//!
//! Uploads and destroys go through the signed upload API; downloads resolve
//! the current delivery URL through the admin API first, so an asset that
//! was overwritten is always fetched at its latest version.

use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::StatusCode;
use serde::Deserialize;
use sha2::{Digest, Sha256};

use crate::{HostError, HostedImage, ImageHost, UploadOptions};

/// Base URL of the Cloudinary API.
pub const DEFAULT_API_BASE: &str = "https://api.cloudinary.com/v1_1";

/// Account credentials. Never compiled in; loaded from the environment.
#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
}

impl CloudinaryConfig {
    /// Load credentials from the environment.
    ///
    /// | Env Var                 |
    /// |-------------------------|
    /// | `CLOUDINARY_CLOUD_NAME` |
    /// | `CLOUDINARY_API_KEY`    |
    /// | `CLOUDINARY_API_SECRET` |
    pub fn from_env() -> Result<Self, HostError> {
        let var = |name: &str| {
            std::env::var(name)
                .ok()
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| HostError::Config(format!("{name} must be set")))
        };
        Ok(Self {
            cloud_name: var("CLOUDINARY_CLOUD_NAME")?,
            api_key: var("CLOUDINARY_API_KEY")?,
            api_secret: var("CLOUDINARY_API_SECRET")?,
        })
    }
}

/// Response of the upload endpoint (only the fields we keep).
#[derive(Debug, Deserialize)]
struct UploadResponse {
    public_id: String,
    secure_url: String,
    format: String,
}

/// Response of the admin resource lookup.
#[derive(Debug, Deserialize)]
struct ResourceResponse {
    secure_url: String,
}

/// Response of the destroy endpoint: `ok` or `not found`.
#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

/// [`ImageHost`] backed by a Cloudinary account.
pub struct CloudinaryHost {
    client: reqwest::Client,
    config: CloudinaryConfig,
    api_base: String,
}

impl CloudinaryHost {
    pub fn new(config: CloudinaryConfig) -> Self {
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Reuse an existing [`reqwest::Client`] (connection pooling).
    pub fn with_client(client: reqwest::Client, config: CloudinaryConfig) -> Self {
        Self {
            client,
            config,
            api_base: DEFAULT_API_BASE.to_string(),
        }
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}/{}/{path}", self.api_base, self.config.cloud_name)
    }

    /// Build the common signed form fields for an upload-API call.
    fn signed_form(&self, mut params: Vec<(&'static str, String)>) -> Form {
        params.push(("timestamp", unix_timestamp().to_string()));
        let signature = sign_params(&params, &self.config.api_secret);

        let mut form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("signature", signature)
            .text("signature_algorithm", "sha256");
        for (key, value) in params {
            form = form.text(key, value);
        }
        form
    }

    /// Ensure the response has a success status code, mapping 404 to
    /// [`HostError::NotFound`].
    async fn ensure_success(
        response: reqwest::Response,
        public_id: &str,
    ) -> Result<reqwest::Response, HostError> {
        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(HostError::NotFound(public_id.to_string()));
        }
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "<unreadable body>".to_string());
            return Err(HostError::Api {
                status: status.as_u16(),
                body,
            });
        }
        Ok(response)
    }
}

#[async_trait]
impl ImageHost for CloudinaryHost {
    async fn upload(&self, bytes: Vec<u8>, options: UploadOptions) -> Result<HostedImage, HostError> {
        let mut params = vec![("overwrite", options.overwrite.to_string())];
        if let Some(public_id) = &options.public_id {
            params.push(("public_id", public_id.clone()));
        }

        let form = self
            .signed_form(params)
            .part("file", Part::bytes(bytes).file_name(options.filename.clone()));

        let response = self
            .client
            .post(self.endpoint("image/upload"))
            .multipart(form)
            .send()
            .await?;
        let label = options.public_id.as_deref().unwrap_or(&options.filename);
        let uploaded: UploadResponse = Self::ensure_success(response, label).await?.json().await?;

        tracing::info!(public_id = %uploaded.public_id, "Uploaded image to Cloudinary");
        Ok(HostedImage {
            public_id: uploaded.public_id,
            secure_url: uploaded.secure_url,
            format: uploaded.format,
        })
    }

    async fn fetch(&self, public_id: &str) -> Result<Vec<u8>, HostError> {
        let response = self
            .client
            .get(self.endpoint(&format!("resources/image/upload/{public_id}")))
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await?;
        let resource: ResourceResponse = Self::ensure_success(response, public_id)
            .await?
            .json()
            .await?;

        let response = self.client.get(&resource.secure_url).send().await?;
        let bytes = Self::ensure_success(response, public_id).await?.bytes().await?;
        Ok(bytes.to_vec())
    }

    async fn destroy(&self, public_id: &str) -> Result<(), HostError> {
        let form = self.signed_form(vec![("public_id", public_id.to_string())]);
        let response = self
            .client
            .post(self.endpoint("image/destroy"))
            .multipart(form)
            .send()
            .await?;
        let destroyed: DestroyResponse = Self::ensure_success(response, public_id)
            .await?
            .json()
            .await?;

        if destroyed.result != "ok" {
            tracing::warn!(%public_id, result = %destroyed.result, "Cloudinary destroy was a no-op");
        }
        Ok(())
    }
}

fn unix_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

/// Sign upload-API parameters: sort by key, join as `k=v` pairs with `&`,
/// append the API secret and take the SHA-256 hex digest. Empty values are
/// left out, as Cloudinary does when verifying.
pub fn sign_params(params: &[(&str, String)], api_secret: &str) -> String {
    let mut sorted: Vec<&(&str, String)> = params.iter().filter(|(_, v)| !v.is_empty()).collect();
    sorted.sort_by(|a, b| a.0.cmp(b.0));

    let to_sign = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let hash = Sha256::digest(format!("{to_sign}{api_secret}").as_bytes());
    format!("{hash:x}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn signature_sorts_params_and_appends_secret() {
        let params = vec![
            ("timestamp", "1315060510".to_string()),
            ("public_id", "sample_image".to_string()),
            ("eager", "w_400,h_300,c_pad|w_260,h_200,c_crop".to_string()),
        ];
        let expected = {
            let raw = "eager=w_400,h_300,c_pad|w_260,h_200,c_crop&public_id=sample_image\
                       &timestamp=1315060510abcd";
            format!("{:x}", Sha256::digest(raw.as_bytes()))
        };
        assert_eq!(sign_params(&params, "abcd"), expected);
    }

    #[test]
    fn signature_skips_empty_values() {
        let with_empty = vec![("a", "1".to_string()), ("b", String::new())];
        let without = vec![("a", "1".to_string())];
        assert_eq!(sign_params(&with_empty, "s"), sign_params(&without, "s"));
    }

    #[test]
    fn endpoint_includes_cloud_name() {
        let host = CloudinaryHost::new(CloudinaryConfig {
            cloud_name: "demo".into(),
            api_key: "k".into(),
            api_secret: "s".into(),
        });
        assert_eq!(
            host.endpoint("image/upload"),
            "https://api.cloudinary.com/v1_1/demo/image/upload"
        );
    }
}
