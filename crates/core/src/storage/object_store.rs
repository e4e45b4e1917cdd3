//! The object storage capability and its key rules.

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;
use uuid::Uuid;

use super::error::StorageError;

/// Content type served when neither the backend nor the key says otherwise.
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/jpeg";

/// Bytes fetched from storage with whatever metadata the backend kept.
#[derive(Debug, Clone)]
pub struct StoredObject {
    /// Key the object was fetched under.
    pub key: String,
    /// Raw content.
    pub content: Bytes,
    /// Declared content type, if the backend stores one.
    pub content_type: Option<String>,
}

impl StoredObject {
    /// Content type to serve: declared type, else guessed from the key, else
    /// [`DEFAULT_IMAGE_CONTENT_TYPE`].
    #[must_use]
    pub fn served_content_type(&self) -> &str {
        self.content_type
            .as_deref()
            .filter(|ct| !ct.is_empty())
            .or_else(|| content_type_for_key(&self.key))
            .unwrap_or(DEFAULT_IMAGE_CONTENT_TYPE)
    }
}

/// One entry of a bucket listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectInfo {
    /// Storage key.
    pub key: String,
    /// Size in bytes.
    pub size: u64,
    /// Last modification time as reported by the backend.
    pub last_modified: Option<String>,
}

/// Identity of a store, for diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StoreDescriptor {
    /// Provider name (`local`, `local_s3`, `s3`, `memory`).
    pub provider: &'static str,
    /// Bucket or root directory.
    pub bucket: String,
    /// Endpoint URL, if any.
    pub endpoint: Option<String>,
}

/// Where image bytes live.
///
/// One implementation is chosen from configuration at startup; callers never
/// branch on the backend.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write `content` under a key derived from `key_hint` and return the final key.
    ///
    /// Depending on the overwrite policy, a colliding key is either replaced
    /// or swapped for a free alternative.
    async fn save(
        &self,
        key_hint: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, StorageError>;

    /// Read the object stored under `key`.
    async fn fetch(&self, key: &str) -> Result<StoredObject, StorageError>;

    /// Remove the object under `key`. Succeeds silently if it is already gone.
    async fn delete(&self, key: &str) -> Result<(), StorageError>;

    /// Whether an object exists under `key`.
    async fn exists(&self, key: &str) -> Result<bool, StorageError>;

    /// Every stored object with size and modification time.
    async fn list_objects(&self) -> Result<Vec<ObjectInfo>, StorageError>;

    /// Every stored key, flattened across pages.
    async fn list_keys(&self) -> Result<Vec<String>, StorageError> {
        Ok(self
            .list_objects()
            .await?
            .into_iter()
            .map(|object| object.key)
            .collect())
    }

    /// Provider, bucket and endpoint of this store.
    fn describe(&self) -> StoreDescriptor;
}

/// Normalize a key hint into a storage key.
///
/// Each `/`-separated segment keeps ASCII alphanumerics, dots, hyphens and
/// underscores; anything else becomes `_`. Empty segments are dropped.
///
/// # Errors
///
/// Returns `InvalidKey` if nothing remains or a segment is `.` or `..`.
pub fn normalize_key(hint: &str) -> Result<String, StorageError> {
    let segments: Vec<String> = hint
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(sanitize_segment)
        .collect();

    if segments.is_empty() {
        return Err(StorageError::InvalidKey(hint.to_string()));
    }
    if segments.iter().any(|s| s == "." || s == "..") {
        return Err(StorageError::InvalidKey(hint.to_string()));
    }

    Ok(segments.join("/"))
}

/// Reject keys that could escape the bucket root.
///
/// # Errors
///
/// Returns `InvalidKey` for empty keys and `.`/`..` segments.
pub fn validate_key(key: &str) -> Result<(), StorageError> {
    let trimmed = key.trim_start_matches('/');
    if trimmed.is_empty() || trimmed.split('/').any(|s| s == "." || s == "..") {
        return Err(StorageError::InvalidKey(key.to_string()));
    }
    Ok(())
}

/// Sanitize one path segment for storage.
fn sanitize_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

/// A fresh key next to `key`: `dir/stem_abc1234.ext`.
#[must_use]
pub fn alternative_key(key: &str) -> String {
    let suffix: String = Uuid::new_v4().simple().to_string().chars().take(7).collect();
    let (dir, file) = key.rsplit_once('/').unwrap_or(("", key));
    let (stem, ext) = match file.rfind('.') {
        Some(idx) if idx > 0 => file.split_at(idx),
        _ => (file, ""),
    };

    if dir.is_empty() {
        format!("{stem}_{suffix}{ext}")
    } else {
        format!("{dir}/{stem}_{suffix}{ext}")
    }
}

/// Guess an image content type from the key's extension.
#[must_use]
pub fn content_type_for_key(key: &str) -> Option<&'static str> {
    let ext = key.rsplit_once('.')?.1.to_ascii_lowercase();
    match ext.as_str() {
        "png" => Some("image/png"),
        "jpg" | "jpeg" => Some("image/jpeg"),
        "gif" => Some("image/gif"),
        "webp" => Some("image/webp"),
        "svg" => Some("image/svg+xml"),
        "bmp" => Some("image/bmp"),
        "ico" => Some("image/x-icon"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}
