//! Application-wide error types.

use thiserror::Error;

use crate::validation::ValidationErrors;

/// Result type alias using `AppError`.
pub type AppResult<T> = Result<T, AppError>;

/// Application error types.
#[derive(Debug, Error)]
pub enum AppError {
    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Malformed request body.
    #[error("Validation error: {0}")]
    Validation(ValidationErrors),

    /// Conflict (e.g., duplicate entry).
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Database error.
    #[error("Database error: {0}")]
    Database(String),

    /// Object storage error.
    #[error("Storage error: {0}")]
    Storage(String),

    /// Internal server error.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::NotFound(_) => 404,
            Self::Validation(_) => 400,
            Self::Conflict(_) => 409,
            Self::Database(_) | Self::Storage(_) | Self::Internal(_) => 500,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation_error",
            Self::Conflict(_) => "conflict",
            Self::Database(_) => "database_error",
            Self::Storage(_) => "storage_error",
            Self::Internal(_) => "internal_error",
        }
    }

    /// Message safe to show to API clients.
    ///
    /// Server-side failures are reduced to a generic sentence; the detail
    /// belongs in operator logs.
    #[must_use]
    pub fn public_message(&self) -> String {
        match self {
            Self::NotFound(_) | Self::Validation(_) | Self::Conflict(_) => self.to_string(),
            Self::Storage(_) => "Storage operation failed".to_string(),
            Self::Database(_) | Self::Internal(_) => "An error occurred".to_string(),
        }
    }

    /// Returns true for errors caused by the server rather than the request.
    #[must_use]
    pub const fn is_server_error(&self) -> bool {
        self.status_code() >= 500
    }
}

impl From<ValidationErrors> for AppError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotFound(String::new()), 404, "not_found")]
    #[case(AppError::Validation(ValidationErrors::new()), 400, "validation_error")]
    #[case(AppError::Conflict(String::new()), 409, "conflict")]
    #[case(AppError::Database(String::new()), 500, "database_error")]
    #[case(AppError::Storage(String::new()), 500, "storage_error")]
    #[case(AppError::Internal(String::new()), 500, "internal_error")]
    fn test_error_status_and_code(
        #[case] error: AppError,
        #[case] status: u16,
        #[case] code: &str,
    ) {
        assert_eq!(error.status_code(), status);
        assert_eq!(error.error_code(), code);
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            AppError::NotFound("image 4".into()).to_string(),
            "Not found: image 4"
        );
        assert_eq!(
            AppError::Validation(ValidationErrors::single("body", "required")).to_string(),
            "Validation error: body: required"
        );
        assert_eq!(
            AppError::Storage("bucket unreachable".into()).to_string(),
            "Storage error: bucket unreachable"
        );
    }

    #[test]
    fn test_public_message_hides_server_detail() {
        let err = AppError::Storage("connect ECONNREFUSED 10.0.0.4:4566".into());
        assert!(err.is_server_error());
        assert_eq!(err.public_message(), "Storage operation failed");

        let err = AppError::Database("relation images does not exist".into());
        assert_eq!(err.public_message(), "An error occurred");

        let err = AppError::NotFound("message 9".into());
        assert!(!err.is_server_error());
        assert_eq!(err.public_message(), "Not found: message 9");
    }
}
