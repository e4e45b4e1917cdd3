//! Message error types.

use pinboard_shared::ValidationErrors;
use thiserror::Error;

/// Message operation errors.
#[derive(Debug, Error)]
pub enum MessageError {
    /// Message not found.
    #[error("message not found: {0}")]
    NotFound(i32),

    /// Malformed message body.
    #[error("invalid message: {0}")]
    Validation(#[from] ValidationErrors),

    /// Repository operation failed.
    #[error("repository error: {0}")]
    Repository(String),
}

impl MessageError {
    /// Create a repository error.
    #[must_use]
    pub fn repository(msg: impl Into<String>) -> Self {
        Self::Repository(msg.into())
    }
}
