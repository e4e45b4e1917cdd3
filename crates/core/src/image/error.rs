//! Image error types.

use pinboard_shared::ValidationErrors;
use thiserror::Error;

use crate::storage::StorageError;

/// Image operation errors.
#[derive(Debug, Error)]
pub enum ImageError {
    /// Image row not found.
    #[error("image not found: {0}")]
    NotFound(i32),

    /// Rejected upload or form data.
    #[error("invalid image data: {0}")]
    Validation(ValidationErrors),

    /// Object store operation failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl ImageError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }

    /// Create a validation error for a single field.
    #[must_use]
    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        Self::Validation(ValidationErrors::single(field, message))
    }
}

impl From<ValidationErrors> for ImageError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}
