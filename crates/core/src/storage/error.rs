//! Storage error types.

use thiserror::Error;

/// Storage operation errors.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No object stored under the key.
    #[error("object not found: {key}")]
    NotFound {
        /// Storage key that was not found.
        key: String,
    },

    /// Writing failed: backend unavailable, permission denied, network fault.
    #[error("failed to write {key}: {reason}")]
    Write {
        /// Key being written.
        key: String,
        /// Backend detail.
        reason: String,
    },

    /// Reading failed for a reason other than a missing key.
    #[error("failed to read {key}: {reason}")]
    Read {
        /// Key being read.
        key: String,
        /// Backend detail.
        reason: String,
    },

    /// Deletion failed.
    #[error("failed to delete {key}: {reason}")]
    Delete {
        /// Key being deleted.
        key: String,
        /// Backend detail.
        reason: String,
    },

    /// Listing the bucket failed.
    #[error("failed to list objects: {0}")]
    List(String),

    /// Invalid storage key format.
    #[error("invalid storage key: {0}")]
    InvalidKey(String),

    /// File size exceeds maximum allowed.
    #[error("file size {size} bytes exceeds maximum allowed {max} bytes")]
    FileTooLarge {
        /// Actual file size.
        size: u64,
        /// Maximum allowed size.
        max: u64,
    },

    /// Content type not allowed.
    #[error("content type '{content_type}' is not allowed")]
    InvalidContentType {
        /// The rejected content type.
        content_type: String,
    },

    /// Storage provider configuration error.
    #[error("storage configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// Create a not found error.
    #[must_use]
    pub fn not_found(key: impl Into<String>) -> Self {
        Self::NotFound { key: key.into() }
    }

    /// Create a file too large error.
    #[must_use]
    pub fn file_too_large(size: u64, max: u64) -> Self {
        Self::FileTooLarge { size, max }
    }

    /// Create an invalid content type error.
    #[must_use]
    pub fn invalid_content_type(content_type: impl Into<String>) -> Self {
        Self::InvalidContentType {
            content_type: content_type.into(),
        }
    }

    /// Create a configuration error.
    #[must_use]
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Map a backend error raised while writing `key`.
    #[must_use]
    pub fn write(key: &str, err: &opendal::Error) -> Self {
        Self::Write {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }

    /// Map a backend error raised while reading `key`.
    #[must_use]
    pub fn read(key: &str, err: &opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::NotFound => Self::not_found(key),
            _ => Self::Read {
                key: key.to_string(),
                reason: err.to_string(),
            },
        }
    }

    /// Map a backend error raised while deleting `key`.
    #[must_use]
    pub fn delete(key: &str, err: &opendal::Error) -> Self {
        Self::Delete {
            key: key.to_string(),
            reason: err.to_string(),
        }
    }

    /// Returns true if the key simply does not exist.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Returns true for upload policy violations (client mistakes).
    #[must_use]
    pub fn is_rejected_upload(&self) -> bool {
        matches!(
            self,
            Self::FileTooLarge { .. } | Self::InvalidContentType { .. } | Self::InvalidKey(_)
        )
    }
}

impl From<opendal::Error> for StorageError {
    fn from(err: opendal::Error) -> Self {
        match err.kind() {
            opendal::ErrorKind::ConfigInvalid => Self::Configuration(err.to_string()),
            _ => Self::List(err.to_string()),
        }
    }
}
