//! In-memory image host - used in development and tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use grove_core::ports::{ImageUpload, MediaError, MediaStore, StoredImage};

/// Keeps uploaded bytes in a map and serves them under `base_url`.
pub struct InMemoryMediaStore {
    base_url: String,
    images: RwLock<HashMap<String, ImageUpload>>,
    deleted: RwLock<Vec<String>>,
    failing: AtomicBool,
}

impl InMemoryMediaStore {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            images: RwLock::new(HashMap::new()),
            deleted: RwLock::new(Vec::new()),
            failing: AtomicBool::new(false),
        }
    }

    /// Make every subsequent call fail with a transport error.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    /// Delete ids received so far, in call order.
    pub async fn deleted(&self) -> Vec<String> {
        self.deleted.read().await.clone()
    }

    pub async fn contains(&self, delete_id: &str) -> bool {
        self.images.read().await.contains_key(delete_id)
    }

    fn check_available(&self) -> Result<(), MediaError> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(MediaError::Transport("media store unavailable".to_string()));
        }
        Ok(())
    }
}

impl Default for InMemoryMediaStore {
    fn default() -> Self {
        Self::new("http://localhost/media")
    }
}

#[async_trait]
impl MediaStore for InMemoryMediaStore {
    async fn upload(&self, image: ImageUpload) -> Result<StoredImage, MediaError> {
        self.check_available()?;

        let delete_id = format!("grove/{}", Uuid::new_v4().simple());
        let url = format!("{}/{}", self.base_url, delete_id);
        self.images.write().await.insert(delete_id.clone(), image);

        Ok(StoredImage {
            url,
            delete_id,
            width: None,
            height: None,
        })
    }

    async fn delete(&self, delete_id: &str) -> Result<(), MediaError> {
        self.deleted.write().await.push(delete_id.to_string());
        self.check_available()?;
        self.images.write().await.remove(delete_id);
        Ok(())
    }

    fn delete_id_for(&self, url: &str) -> Option<String> {
        url.strip_prefix(self.base_url.as_str())?
            .strip_prefix('/')
            .filter(|id| !id.is_empty())
            .map(String::from)
    }
}
