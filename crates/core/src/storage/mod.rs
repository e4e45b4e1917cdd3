//! Object Storage Adapter built on Apache OpenDAL.
//!
//! One capability ([`ObjectStore`]) with a single OpenDAL-backed
//! implementation that is pointed at one of:
//! - Local filesystem rooted at `media_root`
//! - An S3 emulator (LocalStack, MinIO) on a local endpoint
//! - A production S3-compatible endpoint, optionally fronted by a custom domain
//! - In-process memory (tests)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                     dyn ObjectStore                          │
//! │   save / fetch / delete / exists / list_objects / describe   │
//! ├──────────────────────────────────────────────────────────────┤
//! │                 StorageService (OpenDAL)                     │
//! │      op.write_with   op.read   op.stat   op.list_with        │
//! ├──────────────────────────────────────────────────────────────┤
//! │                    StorageObserver                           │
//! │          one StorageEvent per backend operation              │
//! └──────────────────────────────────────────────────────────────┘
//! ```

mod config;
mod error;
mod object_store;
mod service;
mod telemetry;

use std::sync::Arc;

use pinboard_shared::StorageSettings;

pub use config::{LOCAL_S3_ENDPOINT, StorageConfig, StorageProvider, UploadPolicy};
pub use error::StorageError;
pub use object_store::{
    DEFAULT_IMAGE_CONTENT_TYPE, ObjectInfo, ObjectStore, StoreDescriptor, StoredObject,
    alternative_key, content_type_for_key, normalize_key, validate_key,
};
pub use service::StorageService;
pub use telemetry::{EventOutcome, StorageEvent, StorageObserver, StorageOp, TracingObserver};

/// Prefix under which uploaded image files are stored.
pub const IMAGE_KEY_PREFIX: &str = "images/";

/// Build the configured object store.
///
/// # Errors
///
/// Returns a configuration error if the settings are incomplete or the
/// backend cannot be initialized.
pub fn build_store(settings: &StorageSettings) -> Result<Arc<dyn ObjectStore>, StorageError> {
    let config = StorageConfig::from_settings(settings)?;
    Ok(Arc::new(StorageService::from_config(config)?))
}
