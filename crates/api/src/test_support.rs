//! Helpers shared by the route tests.

use std::sync::Arc;

use async_trait::async_trait;
use axum::{Router, body::Body, http::Request, response::Response};
use bytes::Bytes;
use http_body_util::BodyExt;
use pinboard_core::image::ImageUrlBuilder;
use pinboard_core::storage::{
    ObjectInfo, ObjectStore, StorageConfig, StorageError, StorageProvider, StorageService,
    StoreDescriptor, StoredObject, UploadPolicy,
};
use pinboard_db::migration::{Migrator, MigratorTrait};
use sea_orm::{ConnectOptions, Database};
use tower::ServiceExt;

use crate::{AppState, create_router};

pub const BOUNDARY: &str = "pinboard-test-boundary";

/// State over an in-memory SQLite database and the given store.
pub async fn state_with_store(store: Arc<dyn ObjectStore>) -> AppState {
    let mut options = ConnectOptions::new("sqlite::memory:");
    options
        .max_connections(1)
        .min_connections(1)
        .sqlx_logging(false);
    let db = Database::connect(options)
        .await
        .expect("Failed to connect to database");
    Migrator::up(&db, None)
        .await
        .expect("Failed to run migrations");

    AppState::new(db, store, ImageUrlBuilder::proxy(), UploadPolicy::default())
}

/// State over an in-memory SQLite database and an in-memory store.
pub async fn test_state() -> AppState {
    state_with_store(memory_store()).await
}

pub fn memory_store() -> Arc<dyn ObjectStore> {
    Arc::new(
        StorageService::from_config(StorageConfig::new(StorageProvider::Memory))
            .expect("should create store"),
    )
}

pub async fn send(state: &AppState, request: Request<Body>) -> Response {
    let app: Router = create_router(state.clone());
    app.oneshot(request).await.expect("request should complete")
}

pub async fn body_bytes(response: Response) -> Bytes {
    response
        .into_body()
        .collect()
        .await
        .expect("body should be readable")
        .to_bytes()
}

pub async fn body_json(response: Response) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).expect("body should be JSON")
}

/// One part of a multipart form.
pub enum Part<'a> {
    Text(&'a str, &'a str),
    File {
        name: &'a str,
        filename: &'a str,
        content_type: &'a str,
        content: &'a [u8],
    },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Body {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File {
                name,
                filename,
                content_type,
                content,
            } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: {content_type}\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(content);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
    Body::from(body)
}

pub fn multipart_request(method: &str, uri: &str, parts: &[Part<'_>]) -> Request<Body> {
    Request::builder()
        .method(method)
        .uri(uri)
        .header("host", "localhost:8000")
        .header(
            "content-type",
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(multipart_body(parts))
        .unwrap()
}

/// Store whose backend is unreachable.
pub struct UnreachableStore;

#[async_trait]
impl ObjectStore for UnreachableStore {
    async fn save(
        &self,
        key_hint: &str,
        _content: Bytes,
        _content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        Err(StorageError::Write {
            key: key_hint.to_string(),
            reason: "connection refused".to_string(),
        })
    }

    async fn fetch(&self, key: &str) -> Result<StoredObject, StorageError> {
        Err(StorageError::Read {
            key: key.to_string(),
            reason: "connection refused".to_string(),
        })
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        Err(StorageError::Delete {
            key: key.to_string(),
            reason: "connection refused".to_string(),
        })
    }

    async fn exists(&self, _key: &str) -> Result<bool, StorageError> {
        Err(StorageError::List("connection refused".to_string()))
    }

    async fn list_objects(&self) -> Result<Vec<ObjectInfo>, StorageError> {
        Err(StorageError::List("connection refused".to_string()))
    }

    fn describe(&self) -> StoreDescriptor {
        StoreDescriptor {
            provider: "s3",
            bucket: "pinboard-media".to_string(),
            endpoint: Some("http://localhost:4566".to_string()),
        }
    }
}
