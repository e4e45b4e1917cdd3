//! Image service implementation.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::error::ImageError;
use super::types::{
    Image, ImageChanges, ImageUpdate, ImageUpload, NewImage, NewImageRecord, clean_title,
};
use crate::storage::{IMAGE_KEY_PREFIX, ObjectStore, UploadPolicy, content_type_for_key};

/// Repository trait for image persistence.
///
/// This trait is implemented by the db crate to provide actual database operations.
pub trait ImageRepository: Send + Sync {
    /// Insert a new image row.
    fn insert(
        &self,
        record: NewImageRecord,
    ) -> impl std::future::Future<Output = Result<Image, ImageError>> + Send;

    /// Find image by ID.
    fn find_by_id(
        &self,
        id: i32,
    ) -> impl std::future::Future<Output = Result<Option<Image>, ImageError>> + Send;

    /// All rows, newest first (`uploaded_at` desc, then `id` desc).
    fn list(&self) -> impl std::future::Future<Output = Result<Vec<Image>, ImageError>> + Send;

    /// Apply changes to a row. Returns `None` if the row does not exist.
    fn update(
        &self,
        id: i32,
        changes: ImageChanges,
    ) -> impl std::future::Future<Output = Result<Option<Image>, ImageError>> + Send;

    /// Delete a row. Returns `false` if it did not exist.
    fn delete(&self, id: i32)
    -> impl std::future::Future<Output = Result<bool, ImageError>> + Send;

    /// Number of rows whose `storage_key` equals `storage_key`.
    fn count_by_key(
        &self,
        storage_key: &str,
    ) -> impl std::future::Future<Output = Result<u64, ImageError>> + Send;
}

/// Image service keeping rows and stored files in step.
pub struct ImageService<R: ImageRepository> {
    store: Arc<dyn ObjectStore>,
    repo: Arc<R>,
    policy: UploadPolicy,
}

impl<R: ImageRepository> ImageService<R> {
    /// Create a new image service.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, repo: Arc<R>, policy: UploadPolicy) -> Self {
        Self {
            store,
            repo,
            policy,
        }
    }

    /// List images, newest first.
    ///
    /// # Errors
    ///
    /// Returns an error if the repository fails.
    pub async fn list(&self) -> Result<Vec<Image>, ImageError> {
        self.repo.list().await
    }

    /// Get image by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is not found or the repository fails.
    pub async fn get(&self, id: i32) -> Result<Image, ImageError> {
        self.repo
            .find_by_id(id)
            .await?
            .ok_or(ImageError::NotFound(id))
    }

    /// Store an uploaded file and create its row.
    ///
    /// The file is written first. If the row cannot be written the file is
    /// deleted again before the error is returned.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a rejected upload, a storage error if
    /// the write fails, or the repository error.
    pub async fn commit_image(&self, input: NewImage) -> Result<Image, ImageError> {
        let title = clean_title(input.title)?;
        let key = self.store_upload(input.upload).await?;

        let record = NewImageRecord {
            title,
            storage_key: key.clone(),
            uploaded_at: Utc::now(),
        };

        match self.repo.insert(record).await {
            Ok(image) => {
                info!(image_id = image.id, key = %key, "Image committed");
                Ok(image)
            }
            Err(err) => {
                self.release_blob(&key).await;
                Err(err)
            }
        }
    }

    /// Update an image's title and optionally swap its file.
    ///
    /// A new file is written before the row changes; the previous file is
    /// removed only after the row points at the new one.
    ///
    /// # Errors
    ///
    /// Returns not found, validation, storage or repository errors.
    pub async fn update_image(&self, id: i32, update: ImageUpdate) -> Result<Image, ImageError> {
        let current = self.get(id).await?;

        let mut changes = ImageChanges {
            title: update.title.map(clean_title).transpose()?,
            storage_key: None,
        };

        let Some(upload) = update.upload else {
            if changes.is_empty() {
                return Ok(current);
            }
            return self
                .repo
                .update(id, changes)
                .await?
                .ok_or(ImageError::NotFound(id));
        };

        let new_key = self.store_upload(upload).await?;
        changes.storage_key = Some(new_key.clone());

        let updated = match self.repo.update(id, changes).await {
            Ok(Some(image)) => image,
            Ok(None) => {
                self.release_blob(&new_key).await;
                return Err(ImageError::NotFound(id));
            }
            Err(err) => {
                self.release_blob(&new_key).await;
                return Err(err);
            }
        };

        if let Some(old_key) = current.stored_key().filter(|old| *old != new_key) {
            self.release_blob(old_key).await;
        }

        info!(image_id = id, key = %new_key, "Image file replaced");
        Ok(updated)
    }

    /// Delete an image row, then its file.
    ///
    /// A file that cannot be deleted is left as an orphan and logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the image is not found or the repository fails.
    pub async fn delete_image(&self, id: i32) -> Result<(), ImageError> {
        let image = self.get(id).await?;

        if !self.repo.delete(id).await? {
            return Err(ImageError::NotFound(id));
        }

        if let Some(key) = image.stored_key() {
            self.release_blob(key).await;
        }

        info!(image_id = id, "Image deleted");
        Ok(())
    }

    /// Validate an upload against the policy and write it under `images/`.
    async fn store_upload(&self, upload: ImageUpload) -> Result<String, ImageError> {
        let name = upload.base_name().to_string();
        if name.is_empty() {
            return Err(ImageError::invalid("image", "No file was submitted."));
        }
        if upload.content.is_empty() {
            return Err(ImageError::invalid("image", "The submitted file is empty."));
        }

        let content_type = upload
            .content_type
            .as_deref()
            .filter(|ct| !ct.is_empty() && *ct != "application/octet-stream")
            .or_else(|| content_type_for_key(&name))
            .ok_or_else(|| ImageError::invalid("image", "Upload a valid image."))?
            .to_string();

        self.policy
            .validate(&content_type, upload.size())
            .map_err(|e| ImageError::invalid("image", e.to_string()))?;

        let key = self
            .store
            .save(
                &format!("{IMAGE_KEY_PREFIX}{name}"),
                upload.content,
                Some(&content_type),
            )
            .await?;
        Ok(key)
    }

    /// Delete a blob unless a row still points at it.
    ///
    /// With `file_overwrite` enabled two rows can share a key; the file goes
    /// only with its last reference.
    async fn release_blob(&self, key: &str) {
        match self.repo.count_by_key(key).await {
            Ok(0) => self.discard_blob(key).await,
            Ok(references) => {
                debug!(key = %key, references, "Stored file still referenced; kept");
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Could not count references; stored file kept");
            }
        }
    }

    /// Delete a blob without failing the caller.
    async fn discard_blob(&self, key: &str) {
        if let Err(e) = self.store.delete(key).await {
            warn!(key = %key, error = %e, "Failed to delete stored file; it is now orphaned");
        }
    }
}
