//! Migration error types.

use thiserror::Error;

use crate::image::ImageError;

/// Errors that abort a whole migration run.
#[derive(Debug, Error)]
pub enum MigrationError {
    /// The image rows could not be enumerated.
    #[error("failed to enumerate image rows: {0}")]
    Repository(#[from] ImageError),
}
