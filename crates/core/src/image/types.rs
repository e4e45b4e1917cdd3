//! Image types and data structures.

use bytes::Bytes;
use chrono::{DateTime, Utc};
use pinboard_shared::ValidationErrors;
use serde::Serialize;

/// Longest accepted title, in characters.
pub const TITLE_MAX_LENGTH: usize = 200;

/// A stored image row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Image {
    /// Generated ID.
    pub id: i32,
    /// Optional caption.
    pub title: Option<String>,
    /// Key of the file in the object store. Empty when the row has no file.
    pub storage_key: String,
    /// Creation time, set once.
    pub uploaded_at: DateTime<Utc>,
}

impl Image {
    /// The storage key, or `None` when the row references no file.
    #[must_use]
    pub fn stored_key(&self) -> Option<&str> {
        Some(self.storage_key.as_str()).filter(|key| !key.is_empty())
    }
}

/// Row to insert after the file was written.
#[derive(Debug, Clone)]
pub struct NewImageRecord {
    /// Optional caption.
    pub title: Option<String>,
    /// Final key returned by the object store.
    pub storage_key: String,
    /// Creation time.
    pub uploaded_at: DateTime<Utc>,
}

/// Partial update of an image row. `None` leaves the column untouched.
#[derive(Debug, Clone, Default)]
pub struct ImageChanges {
    /// New caption; `Some(None)` clears it.
    pub title: Option<Option<String>>,
    /// New storage key.
    pub storage_key: Option<String>,
}

impl ImageChanges {
    /// Returns true if nothing would change.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.title.is_none() && self.storage_key.is_none()
    }
}

/// A file received from a client.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    /// Client-supplied file name.
    pub filename: String,
    /// Declared content type, if the client sent one.
    pub content_type: Option<String>,
    /// File content.
    pub content: Bytes,
}

impl ImageUpload {
    /// The bare file name with any client directory components removed.
    #[must_use]
    pub fn base_name(&self) -> &str {
        self.filename
            .rsplit(['/', '\\'])
            .next()
            .unwrap_or_default()
            .trim()
    }

    /// Size of the content in bytes.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.content.len() as u64
    }
}

/// Input for creating an image.
#[derive(Debug, Clone)]
pub struct NewImage {
    /// Optional caption.
    pub title: Option<String>,
    /// The file.
    pub upload: ImageUpload,
}

/// Input for updating an image (PUT or PATCH).
#[derive(Debug, Clone, Default)]
pub struct ImageUpdate {
    /// New caption; `Some(None)` clears it.
    pub title: Option<Option<String>>,
    /// Replacement file.
    pub upload: Option<ImageUpload>,
}

/// Normalize a submitted title: blank becomes `None`.
///
/// # Errors
///
/// Returns a `title` field error when longer than [`TITLE_MAX_LENGTH`].
pub fn clean_title(title: Option<String>) -> Result<Option<String>, ValidationErrors> {
    let Some(title) = title else {
        return Ok(None);
    };

    let trimmed = title.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    if trimmed.chars().count() > TITLE_MAX_LENGTH {
        return Err(ValidationErrors::single(
            "title",
            format!("Ensure this field has no more than {TITLE_MAX_LENGTH} characters."),
        ));
    }

    Ok(Some(trimmed.to_string()))
}
