//! Filesystem image store served by the API under `/media`.
//!
//! Assets live at `<root>/<public_id>.<ext>`; at most one file per public id
//! exists at any time, so replacing an asset with a different format removes
//! the old file.

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::{new_public_id, HostError, HostedImage, ImageHost, UploadOptions};

/// [`ImageHost`] writing to a local directory.
pub struct LocalHost {
    root: PathBuf,
    base_url: String,
}

impl LocalHost {
    /// `base_url` is the public URL prefix the directory is served under.
    pub fn new(root: impl Into<PathBuf>, base_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Create the media directory if it does not exist.
    pub async fn ensure_root(&self) -> Result<(), HostError> {
        tokio::fs::create_dir_all(&self.root).await?;
        Ok(())
    }

    fn url_for(&self, file_name: &str) -> String {
        format!("{}/{file_name}", self.base_url)
    }

    /// Find the stored file for `public_id`, whatever its extension.
    async fn find(&self, public_id: &str) -> Result<Option<PathBuf>, HostError> {
        let mut entries = match tokio::fs::read_dir(&self.root).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.file_stem().and_then(|s| s.to_str()) == Some(public_id) {
                return Ok(Some(path));
            }
        }
        Ok(None)
    }
}

/// Public ids become file names, so only a conservative character set is
/// accepted.
fn check_public_id(public_id: &str) -> Result<(), HostError> {
    let valid = !public_id.is_empty()
        && public_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');
    if valid {
        Ok(())
    } else {
        Err(HostError::Config(format!("Invalid public id: {public_id}")))
    }
}

fn check_extension(format: &str) -> Result<(), HostError> {
    if !format.is_empty() && format.chars().all(|c| c.is_ascii_alphanumeric()) {
        Ok(())
    } else {
        Err(HostError::Config(format!("Invalid image format: {format}")))
    }
}

#[async_trait]
impl ImageHost for LocalHost {
    async fn upload(&self, bytes: Vec<u8>, options: UploadOptions) -> Result<HostedImage, HostError> {
        let format = options.format.to_ascii_lowercase();
        check_extension(&format)?;
        let public_id = options.public_id.unwrap_or_else(new_public_id);
        check_public_id(&public_id)?;

        self.ensure_root().await?;
        if let Some(existing) = self.find(&public_id).await? {
            if !options.overwrite {
                let file_name = existing
                    .file_name()
                    .and_then(|n| n.to_str())
                    .unwrap_or_default()
                    .to_string();
                let format = existing
                    .extension()
                    .and_then(|e| e.to_str())
                    .unwrap_or_default()
                    .to_string();
                return Ok(HostedImage {
                    secure_url: self.url_for(&file_name),
                    public_id,
                    format,
                });
            }
            tokio::fs::remove_file(&existing).await?;
        }

        let file_name = format!("{public_id}.{format}");
        tokio::fs::write(self.root.join(&file_name), &bytes).await?;
        tracing::info!(%public_id, bytes = bytes.len(), "Stored image on local disk");

        Ok(HostedImage {
            secure_url: self.url_for(&file_name),
            public_id,
            format,
        })
    }

    async fn fetch(&self, public_id: &str) -> Result<Vec<u8>, HostError> {
        check_public_id(public_id)?;
        let path = self
            .find(public_id)
            .await?
            .ok_or_else(|| HostError::NotFound(public_id.to_string()))?;
        Ok(tokio::fs::read(path).await?)
    }

    async fn destroy(&self, public_id: &str) -> Result<(), HostError> {
        check_public_id(public_id)?;
        if let Some(path) = self.find(public_id).await? {
            tokio::fs::remove_file(path).await?;
            tracing::info!(%public_id, "Removed image from local disk");
        }
        Ok(())
    }
}
