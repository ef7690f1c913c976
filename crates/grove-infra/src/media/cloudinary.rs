//! Cloudinary image host, via its signed upload API.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use serde::Deserialize;
use sha2::{Digest, Sha256};

use grove_core::ports::{ImageUpload, MediaError, MediaStore, StoredImage};

const API_BASE: &str = "https://api.cloudinary.com/v1_1";
const DELIVERY_BASE: &str = "https://res.cloudinary.com";

#[derive(Debug, Clone)]
pub struct CloudinaryConfig {
    pub cloud_name: String,
    pub api_key: String,
    pub api_secret: String,
    /// Folder uploads are placed in.
    pub folder: String,
}

impl CloudinaryConfig {
    /// Returns `None` unless cloud name, key and secret are all set.
    pub fn from_env() -> Option<Self> {
        let var = |name: &str| std::env::var(name).ok().filter(|v| !v.is_empty());
        Some(Self {
            cloud_name: var("CLOUDINARY_CLOUD_NAME")?,
            api_key: var("CLOUDINARY_API_KEY")?,
            api_secret: var("CLOUDINARY_API_SECRET")?,
            folder: var("CLOUDINARY_FOLDER").unwrap_or_else(|| "grove".to_string()),
        })
    }
}

#[derive(Debug, Deserialize)]
struct UploadResponse {
    secure_url: String,
    public_id: String,
    width: Option<u32>,
    height: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DestroyResponse {
    result: String,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

pub struct CloudinaryMediaStore {
    client: reqwest::Client,
    config: CloudinaryConfig,
}

impl CloudinaryMediaStore {
    pub fn new(config: CloudinaryConfig) -> Result<Self, MediaError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| MediaError::Transport(e.to_string()))?;

        Ok(Self { client, config })
    }

    fn endpoint(&self, action: &str) -> String {
        format!("{API_BASE}/{}/image/{action}", self.config.cloud_name)
    }

    async fn post(&self, action: &str, form: Form) -> Result<reqwest::Response, MediaError> {
        let response = self
            .client
            .post(self.endpoint(action))
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, action, "Cloudinary request failed");
                MediaError::Transport(e.to_string())
            })?;

        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let message = match response.json::<ErrorBody>().await {
            Ok(body) => body.error.message,
            Err(_) => status.to_string(),
        };
        tracing::warn!(%status, action, %message, "Cloudinary rejected request");
        Err(MediaError::Rejected(message))
    }
}

/// SHA-256 over the `&`-joined, key-sorted parameters followed by the secret.
fn sign(params: &[(&str, &str)], api_secret: &str) -> String {
    let mut sorted = params.to_vec();
    sorted.sort_by(|a, b| a.0.cmp(b.0));
    let joined = sorted
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");

    let mut hasher = Sha256::new();
    hasher.update(joined.as_bytes());
    hasher.update(api_secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// Public id of an image in our folder, from its delivery URL
/// (`https://res.cloudinary.com/<cloud>/image/upload/v<version>/<folder>/<name>.<ext>`).
fn public_id_from_url(url: &str, cloud_name: &str, folder: &str) -> Option<String> {
    let path = url
        .strip_prefix(DELIVERY_BASE)?
        .strip_prefix('/')?
        .strip_prefix(cloud_name)?
        .strip_prefix("/image/upload/")?;

    let path = match path.split_once('/') {
        Some((version, rest))
            if version.len() > 1
                && version.starts_with('v')
                && version[1..].bytes().all(|b| b.is_ascii_digit()) =>
        {
            rest
        }
        _ => path,
    };

    let name = path.strip_prefix(folder)?.strip_prefix('/')?;
    let name = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    if name.is_empty() || name.contains('/') {
        return None;
    }
    Some(format!("{folder}/{name}"))
}

fn file_extension(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        "image/svg+xml" => "svg",
        _ => "jpg",
    }
}

#[async_trait]
impl MediaStore for CloudinaryMediaStore {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[("folder", self.config.folder.as_str()), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let size = image.bytes.len();
        let part = Part::bytes(image.bytes)
            .file_name(format!("upload.{}", file_extension(&image.content_type)))
            .mime_str(&image.content_type)
            .map_err(|e| MediaError::Rejected(e.to_string()))?;

        let form = Form::new()
            .part("file", part)
            .text("api_key", self.config.api_key.clone())
            .text("folder", self.config.folder.clone())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let body: UploadResponse = self
            .post("upload", form)
            .await?
            .json()
            .await
            .map_err(|e| MediaError::Response(e.to_string()))?;

        tracing::info!(public_id = %body.public_id, size, "Image uploaded");

        Ok(StoredImage {
            url: body.secure_url,
            delete_id: body.public_id,
            width: body.width,
            height: body.height,
        })
    }

    async fn delete(&self, delete_id: &str) -> Result<(), MediaError> {
        let timestamp = Utc::now().timestamp().to_string();
        let signature = sign(
            &[("public_id", delete_id), ("timestamp", timestamp.as_str())],
            &self.config.api_secret,
        );

        let form = Form::new()
            .text("api_key", self.config.api_key.clone())
            .text("public_id", delete_id.to_string())
            .text("timestamp", timestamp)
            .text("signature_algorithm", "sha256")
            .text("signature", signature);

        let body: DestroyResponse = self
            .post("destroy", form)
            .await?
            .json()
            .await
            .map_err(|e| MediaError::Response(e.to_string()))?;

        match body.result.as_str() {
            "ok" | "not found" => {
                tracing::debug!(public_id = delete_id, result = %body.result, "Image destroyed");
                Ok(())
            }
            other => Err(MediaError::Response(format!("unexpected destroy result: {other}"))),
        }
    }

    fn delete_id_for(&self, url: &str) -> Option<String> {
        public_id_from_url(url, &self.config.cloud_name, &self.config.folder)
    }
}
