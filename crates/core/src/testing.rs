//! Test doubles shared by the unit tests of this crate.

use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use bytes::Bytes;

use crate::image::{Image, ImageChanges, ImageError, ImageRepository, NewImageRecord};
use crate::storage::{ObjectInfo, ObjectStore, StorageError, StoreDescriptor, StoredObject};

/// In-memory image repository.
#[derive(Default)]
pub struct MockImageRepository {
    images: Mutex<Vec<Image>>,
    next_id: Mutex<i32>,
    fail_writes: AtomicBool,
}

impl MockImageRepository {
    /// Repository whose writes all fail.
    pub fn failing() -> Self {
        let repo = Self::default();
        repo.fail_writes.store(true, Ordering::SeqCst);
        repo
    }

    /// Repository seeded with rows for the given keys, ids starting at 1.
    pub fn with_keys(keys: &[&str]) -> Self {
        let repo = Self::default();
        {
            let mut images = repo.images.lock().unwrap();
            let mut next_id = repo.next_id.lock().unwrap();
            for key in keys {
                *next_id += 1;
                images.push(Image {
                    id: *next_id,
                    title: None,
                    storage_key: (*key).to_string(),
                    uploaded_at: chrono::Utc::now(),
                });
            }
        }
        repo
    }

    /// Current rows in insertion order.
    pub fn rows(&self) -> Vec<Image> {
        self.images.lock().unwrap().clone()
    }

    fn check_writable(&self) -> Result<(), ImageError> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(ImageError::repository("database unavailable"));
        }
        Ok(())
    }
}

impl ImageRepository for MockImageRepository {
    async fn insert(&self, record: NewImageRecord) -> Result<Image, ImageError> {
        self.check_writable()?;
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        let image = Image {
            id: *next_id,
            title: record.title,
            storage_key: record.storage_key,
            uploaded_at: record.uploaded_at,
        };
        self.images.lock().unwrap().push(image.clone());
        Ok(image)
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Image>, ImageError> {
        Ok(self
            .images
            .lock()
            .unwrap()
            .iter()
            .find(|i| i.id == id)
            .cloned())
    }

    async fn list(&self) -> Result<Vec<Image>, ImageError> {
        let mut images = self.rows();
        images.sort_by(|a, b| b.uploaded_at.cmp(&a.uploaded_at).then(b.id.cmp(&a.id)));
        Ok(images)
    }

    async fn update(&self, id: i32, changes: ImageChanges) -> Result<Option<Image>, ImageError> {
        self.check_writable()?;
        let mut images = self.images.lock().unwrap();
        let Some(image) = images.iter_mut().find(|i| i.id == id) else {
            return Ok(None);
        };
        if let Some(title) = changes.title {
            image.title = title;
        }
        if let Some(key) = changes.storage_key {
            image.storage_key = key;
        }
        Ok(Some(image.clone()))
    }

    async fn delete(&self, id: i32) -> Result<bool, ImageError> {
        self.check_writable()?;
        let mut images = self.images.lock().unwrap();
        let before = images.len();
        images.retain(|i| i.id != id);
        Ok(images.len() != before)
    }

    async fn count_by_key(&self, storage_key: &str) -> Result<u64, ImageError> {
        let count = self
            .images
            .lock()
            .unwrap()
            .iter()
            .filter(|i| i.storage_key == storage_key)
            .count();
        Ok(count as u64)
    }
}

/// Store whose every operation fails as an unreachable backend would.
pub struct UnavailableStore;

#[async_trait]
impl ObjectStore for UnavailableStore {
    async fn save(
        &self,
        key_hint: &str,
        _content: Bytes,
        _content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        Err(StorageError::Write {
            key: key_hint.to_string(),
            reason: "connection refused".to_string(),
        })
    }

    async fn fetch(&self, key: &str) -> Result<StoredObject, StorageError> {
        Err(StorageError::Read {
            key: key.to_string(),
            reason: "connection refused".to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        Err(StorageError::Delete {
            key: key.to_string(),
            reason: "connection refused".to_string(),
        })
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        Err(StorageError::Read {
            key: key.to_string(),
            reason: "connection refused".to_string(),
        })
    }

    async fn list_objects(&self) -> Result<Vec<ObjectInfo>, StorageError> {
        Err(StorageError::List("connection refused".to_string()))
    }

    fn describe(&self) -> StoreDescriptor {
        StoreDescriptor {
            provider: "unavailable",
            bucket: "unavailable".to_string(),
            endpoint: None,
        }
    }
}
