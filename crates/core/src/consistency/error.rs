//! Consistency checker error types.

use thiserror::Error;

use crate::image::ImageError;
use crate::storage::StorageError;

/// Errors that abort a whole check.
#[derive(Debug, Error)]
pub enum ConsistencyError {
    /// The object store could not be enumerated.
    #[error("failed to enumerate stored objects: {0}")]
    Storage(#[from] StorageError),

    /// The image rows could not be enumerated.
    #[error("failed to enumerate image rows: {0}")]
    Repository(#[from] ImageError),
}
