//! Message types and validation.

use pinboard_shared::ValidationErrors;
use serde::Serialize;

/// A text message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Message {
    /// Generated ID.
    pub id: i32,
    /// Message text.
    pub body: String,
}

/// Validate a submitted body.
///
/// # Errors
///
/// Returns a `body` field error when the body is missing or blank.
pub fn validate_body(body: Option<&str>) -> Result<String, ValidationErrors> {
    match body {
        None => Err(ValidationErrors::single("body", "This field is required.")),
        Some(body) if body.trim().is_empty() => Err(ValidationErrors::single(
            "body",
            "This field may not be blank.",
        )),
        Some(body) => Ok(body.to_string()),
    }
}
