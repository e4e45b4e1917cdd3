//! API route definitions.
//!
//! Collection and detail routes answer with and without a trailing slash.

use axum::Router;

use crate::AppState;

pub mod health;
pub mod images;
pub mod media;
pub mod messages;

/// Creates the API router with all routes.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(messages::routes())
        .merge(images::routes())
        .merge(media::routes())
}
