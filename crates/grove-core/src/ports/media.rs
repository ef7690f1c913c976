//! Media port - the external image host.

use async_trait::async_trait;

/// Largest accepted upload, in bytes.
pub const MAX_IMAGE_BYTES: usize = 5 * 1024 * 1024;

/// An image received from a client, not yet validated.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Result of a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredImage {
    pub url: String,
    /// Identifier accepted by [`MediaStore::delete`].
    pub delete_id: String,
    pub width: Option<u32>,
    pub height: Option<u32>,
}

#[async_trait]
pub trait MediaStore: Send + Sync {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, MediaError>;

    async fn delete(&self, delete_id: &str) -> Result<(), MediaError>;

    /// Delete handle of an image this host serves at `url`, `None` for any
    /// other URL.
    fn delete_id_for(&self, url: &str) -> Option<String>;
}

#[derive(Debug, thiserror::Error)]
pub enum MediaError {
    #[error("Media host rejected the request: {0}")]
    Rejected(String),

    #[error("Media host unreachable: {0}")]
    Transport(String),

    #[error("Unexpected media host response: {0}")]
    Response(String),
}
