//! Image uploads forwarded to the media host.

use std::sync::Arc;

use crate::domain::Actor;
use crate::error::DomainError;
use crate::ports::{ImageUpload, MAX_IMAGE_BYTES, MediaStore, StoredImage};

use super::require_user;

pub struct UploadService {
    store: Arc<dyn MediaStore>,
}

impl UploadService {
    pub fn new(store: Arc<dyn MediaStore>) -> Self {
        Self { store }
    }

    /// Validate an image and store it with the media host.
    pub async fn upload(
        &self,
        actor: Option<&Actor>,
        image: ImageUpload,
    ) -> Result<StoredImage, DomainError> {
        let actor = require_user(actor)?;

        if !image.content_type.starts_with("image/") {
            return Err(DomainError::invalid(
                "image",
                "Invalid file type. Please upload an image.",
            ));
        }
        if image.bytes.is_empty() {
            return Err(DomainError::invalid("image", "No image data provided"));
        }
        if image.bytes.len() > MAX_IMAGE_BYTES {
            return Err(DomainError::invalid(
                "image",
                "File size too large. Maximum size is 5MB.",
            ));
        }

        let size = image.bytes.len();
        let stored = self.store.upload(image).await.map_err(|e| {
            tracing::error!(user_id = %actor.user_id, error = %e, "Image upload failed");
            DomainError::Internal(format!("image upload failed: {e}"))
        })?;

        tracing::info!(user_id = %actor.user_id, size, delete_id = %stored.delete_id, "Image uploaded");
        Ok(stored)
    }
}
