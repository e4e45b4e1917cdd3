//! Image proxy and storage inventory.
//!
//! The proxy hides the storage backend from clients: every stored image is
//! reachable under `/api/s3-image/<key>` whatever the configured provider.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::get,
};
use serde::Serialize;
use tracing::{debug, warn};

use crate::{AppState, error::ApiError};
use pinboard_core::storage::ObjectInfo;
use pinboard_shared::AppError;

/// Creates the media routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/s3-image/{*path}", get(serve_image))
        .route("/debug-s3", get(storage_inventory))
        .route("/debug-s3/", get(storage_inventory))
}

/// Inventory of the configured bucket.
#[derive(Debug, Serialize)]
pub struct InventoryResponse {
    /// Bucket or root directory.
    pub bucket: String,
    /// Endpoint URL, if any.
    pub endpoint: Option<String>,
    /// Number of stored objects.
    pub object_count: usize,
    /// Every stored object.
    pub objects: Vec<ObjectInfo>,
}

/// Body returned when the backend cannot be listed.
#[derive(Debug, Serialize)]
pub struct InventoryFailure {
    /// What went wrong.
    pub error: String,
    /// Bucket or root directory.
    pub bucket: String,
    /// Endpoint URL, if any.
    pub endpoint: Option<String>,
}

/// GET `/s3-image/{*path}`
///
/// Any failure, missing object or unreachable backend alike, answers 404.
async fn serve_image(
    State(state): State<AppState>,
    Path(path): Path<String>,
) -> Result<Response, ApiError> {
    match state.store.fetch(&path).await {
        Ok(object) => {
            let content_type = object.served_content_type().to_string();
            Ok(([(header::CONTENT_TYPE, content_type)], object.content).into_response())
        }
        Err(e) => {
            if e.is_not_found() {
                debug!(key = %path, "Proxied image not found");
            } else {
                warn!(key = %path, error = %e, "Proxied image could not be read");
            }
            Err(AppError::NotFound("image".to_string()).into())
        }
    }
}

/// GET `/debug-s3/`
async fn storage_inventory(State(state): State<AppState>) -> Response {
    let descriptor = state.store.describe();

    match state.store.list_objects().await {
        Ok(objects) => Json(InventoryResponse {
            bucket: descriptor.bucket,
            endpoint: descriptor.endpoint,
            object_count: objects.len(),
            objects,
        })
        .into_response(),
        Err(e) => {
            warn!(error = %e, provider = descriptor.provider, "Storage inventory failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(InventoryFailure {
                    error: e.to_string(),
                    bucket: descriptor.bucket,
                    endpoint: descriptor.endpoint,
                }),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::Request};
    use bytes::Bytes;
    use rstest::rstest;

    use super::*;
    use crate::test_support::{
        UnreachableStore, body_bytes, body_json, send, state_with_store, test_state,
    };

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    #[tokio::test]
    async fn test_proxy_returns_stored_bytes() {
        let state = test_state().await;
        let content = Bytes::from_static(b"\x89PNG\r\n\x1a\nbytes");
        let key = state
            .store
            .save("images/cat.png", content.clone(), Some("image/png"))
            .await
            .unwrap();

        let response = send(&state, get_request(&format!("/api/s3-image/{key}"))).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(body_bytes(response).await, content);
    }

    #[tokio::test]
    async fn test_proxy_guesses_content_type_from_key() {
        let state = test_state().await;
        state
            .store
            .save("images/photo.webp", Bytes::from_static(b"webp"), None)
            .await
            .unwrap();

        let response = send(&state, get_request("/api/s3-image/images/photo.webp")).await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/webp");
    }

    #[rstest]
    #[case("/api/s3-image/images/missing.png")]
    #[case("/api/s3-image/images/../secret")]
    #[tokio::test]
    async fn test_proxy_missing_is_not_found(#[case] uri: &str) {
        let state = test_state().await;
        let response = send(&state, get_request(uri)).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_proxy_backend_failure_is_not_found() {
        let state = state_with_store(Arc::new(UnreachableStore)).await;
        let response = send(&state, get_request("/api/s3-image/images/cat.png")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_inventory_lists_objects() {
        let state = test_state().await;
        for name in ["images/b.png", "images/a.png"] {
            state
                .store
                .save(name, Bytes::from_static(b"1234"), None)
                .await
                .unwrap();
        }

        let response = send(&state, get_request("/api/debug-s3/")).await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = body_json(response).await;
        assert_eq!(body["object_count"], 2);
        assert_eq!(body["objects"][0]["key"], "images/a.png");
        assert_eq!(body["objects"][0]["size"], 4);
    }

    #[tokio::test]
    async fn test_inventory_backend_failure() {
        let state = state_with_store(Arc::new(UnreachableStore)).await;

        let response = send(&state, get_request("/api/debug-s3")).await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(response).await;
        assert_eq!(body["bucket"], "pinboard-media");
        assert_eq!(body["endpoint"], "http://localhost:4566");
        assert!(body["error"].is_string());
    }
}
