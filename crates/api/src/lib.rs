//! HTTP API layer with Axum routes.
//!
//! This crate provides:
//! - REST API routes for messages and images
//! - The image proxy and storage inventory endpoints
//! - Request extractors
//! - Error-to-response mapping

pub mod error;
pub mod extractors;
pub mod routes;

#[cfg(test)]
mod test_support;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use pinboard_core::image::{ImageService, ImageUrlBuilder};
use pinboard_core::message::MessageService;
use pinboard_core::storage::{ObjectStore, StorageConfig, StorageError, UploadPolicy};
use pinboard_db::{ImageRepository, MessageRepository};
use pinboard_shared::AppConfig;
use sea_orm::DatabaseConnection;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Allowance for multipart boundaries and form fields on top of the file itself.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub db: Arc<DatabaseConnection>,
    /// Object store holding image files.
    pub store: Arc<dyn ObjectStore>,
    /// Builds `image_url` for responses.
    pub image_urls: Arc<ImageUrlBuilder>,
    /// Upload limits.
    pub upload_policy: Arc<UploadPolicy>,
}

impl AppState {
    /// Create state from its parts.
    #[must_use]
    pub fn new(
        db: DatabaseConnection,
        store: Arc<dyn ObjectStore>,
        image_urls: ImageUrlBuilder,
        upload_policy: UploadPolicy,
    ) -> Self {
        Self {
            db: Arc::new(db),
            store,
            image_urls: Arc::new(image_urls),
            upload_policy: Arc::new(upload_policy),
        }
    }

    /// Create state from application configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage settings are incomplete.
    pub fn from_config(
        db: DatabaseConnection,
        store: Arc<dyn ObjectStore>,
        config: &AppConfig,
    ) -> Result<Self, StorageError> {
        let storage = StorageConfig::from_settings(&config.storage)?;
        let image_urls = ImageUrlBuilder::new(
            config.storage.url_mode,
            config.server.public_url.clone(),
            storage.provider.public_base_url(),
        );

        Ok(Self::new(db, store, image_urls, storage.upload))
    }

    /// Message service over this state's database.
    #[must_use]
    pub fn message_service(&self) -> MessageService<MessageRepository> {
        MessageService::new(Arc::new(MessageRepository::new((*self.db).clone())))
    }

    /// Image service over this state's database and store.
    #[must_use]
    pub fn image_service(&self) -> ImageService<ImageRepository> {
        ImageService::new(
            self.store.clone(),
            Arc::new(ImageRepository::new((*self.db).clone())),
            (*self.upload_policy).clone(),
        )
    }

    fn body_limit(&self) -> usize {
        usize::try_from(self.upload_policy.max_file_size)
            .unwrap_or(usize::MAX)
            .saturating_add(MULTIPART_OVERHEAD)
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    let body_limit = state.body_limit();

    Router::new()
        .nest("/api", routes::api_routes())
        .layer(DefaultBodyLimit::max(body_limit))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
