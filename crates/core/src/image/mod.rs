//! Image records and the operations that keep rows and stored files together.
//!
//! Every write touches both the Record Store and the object store. The pair is
//! not atomic, so each operation orders its steps to leave at worst an orphaned
//! file, never a row pointing at nothing:
//! - `commit_image`: blob first, then row; a failed row write deletes the blob
//! - `replace_image`: new blob, row update, then old blob deleted best-effort
//! - `delete_image`: row first, then blob deleted best-effort

mod error;
mod service;
mod types;
mod url;

pub use error::ImageError;
pub use service::{ImageRepository, ImageService};
pub use types::{
    Image, ImageChanges, ImageUpdate, ImageUpload, NewImage, NewImageRecord, TITLE_MAX_LENGTH,
};
pub use url::{ImageUrlBuilder, PROXY_PATH};
