//! Storage service implementation using Apache OpenDAL.

use std::sync::Arc;
use std::time::Instant;

use async_trait::async_trait;
use bytes::Bytes;
use opendal::layers::HttpClientLayer;
use opendal::raw::HttpClient;
use opendal::{ErrorKind, Operator, services};
use tracing::warn;

use super::config::{StorageConfig, StorageProvider};
use super::error::StorageError;
use super::object_store::{
    ObjectInfo, ObjectStore, StoreDescriptor, StoredObject, alternative_key, normalize_key,
    validate_key,
};
use super::telemetry::{EventOutcome, StorageEvent, StorageObserver, StorageOp, TracingObserver};

/// Attempts at finding a free alternative name before giving up.
const MAX_RENAME_ATTEMPTS: usize = 16;

/// Object store backed by an OpenDAL operator.
///
/// The same type serves every configured provider; only the operator differs.
pub struct StorageService {
    operator: Operator,
    config: StorageConfig,
    observer: Arc<dyn StorageObserver>,
}

impl StorageService {
    /// Create a new storage service from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if the storage provider cannot be initialized.
    pub fn from_config(config: StorageConfig) -> Result<Self, StorageError> {
        if !config.verify_tls && config.provider.endpoint().is_some() {
            warn!(
                provider = config.provider.name(),
                "TLS certificate verification disabled for the storage endpoint"
            );
        }
        if let Some(acl) = &config.default_acl {
            warn!(
                acl = %acl,
                "default ACL is not set per object; configure it as a bucket policy"
            );
        }

        let operator = Self::create_operator(&config)?;
        Ok(Self {
            operator,
            config,
            observer: Arc::new(TracingObserver),
        })
    }

    /// Replace the default tracing observer.
    #[must_use]
    pub fn with_observer(mut self, observer: Arc<dyn StorageObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Create OpenDAL operator from provider config.
    fn create_operator(config: &StorageConfig) -> Result<Operator, StorageError> {
        let operator = match &config.provider {
            StorageProvider::LocalS3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
            }
            | StorageProvider::S3 {
                endpoint,
                bucket,
                access_key_id,
                secret_access_key,
                region,
                ..
            } => {
                let builder = services::S3::default()
                    .endpoint(endpoint)
                    .bucket(bucket)
                    .access_key_id(access_key_id)
                    .secret_access_key(secret_access_key)
                    .region(region);

                let operator = Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?;
                if config.verify_tls {
                    operator.finish()
                } else {
                    operator
                        .layer(HttpClientLayer::new(Self::insecure_http_client()?))
                        .finish()
                }
            }
            StorageProvider::LocalFs { root } => {
                let builder = services::Fs::default().root(
                    root.to_str()
                        .ok_or_else(|| StorageError::configuration("invalid path"))?,
                );

                Operator::new(builder)
                    .map_err(|e| StorageError::configuration(e.to_string()))?
                    .finish()
            }
            StorageProvider::Memory => Operator::new(services::Memory::default())
                .map_err(|e| StorageError::configuration(e.to_string()))?
                .finish(),
        };

        Ok(operator)
    }

    /// HTTP client that accepts any certificate, for endpoints with self-signed TLS.
    fn insecure_http_client() -> Result<HttpClient, StorageError> {
        let client = reqwest::Client::builder()
            .danger_accept_invalid_certs(true)
            .build()
            .map_err(|e| StorageError::configuration(e.to_string()))?;
        Ok(HttpClient::with(client))
    }

    /// Get the configuration.
    #[must_use]
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Get the storage provider name.
    #[must_use]
    pub fn provider_name(&self) -> &'static str {
        self.config.provider.name()
    }

    fn observe(
        &self,
        op: StorageOp,
        key: Option<&str>,
        size: Option<u64>,
        started: Instant,
        outcome: EventOutcome,
    ) {
        self.observer.record(&StorageEvent {
            op,
            provider: self.provider_name(),
            key: key.map(String::from),
            size,
            elapsed: started.elapsed(),
            outcome,
        });
    }

    async fn probe(&self, key: &str) -> Result<bool, StorageError> {
        match self.operator.stat(key).await {
            Ok(_) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StorageError::read(key, &e)),
        }
    }

    /// Pick the key to write: the normalized hint, or a free alternative when
    /// overwriting is off and the hint is taken.
    async fn available_key(&self, key: String) -> Result<String, StorageError> {
        if self.config.file_overwrite || !self.probe(&key).await? {
            return Ok(key);
        }

        for _ in 0..MAX_RENAME_ATTEMPTS {
            let candidate = alternative_key(&key);
            if !self.probe(&candidate).await? {
                return Ok(candidate);
            }
        }

        Err(StorageError::Write {
            key,
            reason: "no free alternative name".to_string(),
        })
    }

    async fn write_object(
        &self,
        key: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> Result<(), opendal::Error> {
        let keeps_content_type = self
            .operator
            .info()
            .full_capability()
            .write_with_content_type;

        match content_type.filter(|_| keeps_content_type) {
            Some(content_type) => self
                .operator
                .write_with(key, content)
                .content_type(content_type)
                .await
                .map(|_| ()),
            None => self.operator.write(key, content).await.map(|_| ()),
        }
    }
}

#[async_trait]
impl ObjectStore for StorageService {
    async fn save(
        &self,
        key_hint: &str,
        content: Bytes,
        content_type: Option<&str>,
    ) -> Result<String, StorageError> {
        let started = Instant::now();
        let size = content.len() as u64;

        let result: Result<String, StorageError> = async {
            let key = self.available_key(normalize_key(key_hint)?).await?;
            self.write_object(&key, content, content_type)
                .await
                .map_err(|e| StorageError::write(&key, &e))?;
            Ok(key)
        }
        .await;

        match &result {
            Ok(key) => self.observe(
                StorageOp::Save,
                Some(key),
                Some(size),
                started,
                EventOutcome::Ok,
            ),
            Err(e) => self.observe(
                StorageOp::Save,
                Some(key_hint),
                Some(size),
                started,
                EventOutcome::Failed(e.to_string()),
            ),
        }
        result
    }

    async fn fetch(&self, key: &str) -> Result<StoredObject, StorageError> {
        let started = Instant::now();

        let result: Result<StoredObject, StorageError> = async {
            validate_key(key)?;
            let content = self
                .operator
                .read(key)
                .await
                .map_err(|e| StorageError::read(key, &e))?
                .to_bytes();
            let content_type = self
                .operator
                .stat(key)
                .await
                .ok()
                .and_then(|meta| meta.content_type().map(String::from));

            Ok(StoredObject {
                key: key.to_string(),
                content,
                content_type,
            })
        }
        .await;

        let (size, outcome) = match &result {
            Ok(object) => (Some(object.content.len() as u64), EventOutcome::Ok),
            Err(e) if e.is_not_found() => (None, EventOutcome::NotFound),
            Err(e) => (None, EventOutcome::Failed(e.to_string())),
        };
        self.observe(StorageOp::Fetch, Some(key), size, started, outcome);
        result
    }

    async fn delete(&self, key: &str) -> Result<(), StorageError> {
        let started = Instant::now();

        let result: Result<(), StorageError> = async {
            validate_key(key)?;
            self.operator
                .delete(key)
                .await
                .map_err(|e| StorageError::delete(key, &e))
        }
        .await;

        let outcome = match &result {
            Ok(()) => EventOutcome::Ok,
            Err(e) => EventOutcome::Failed(e.to_string()),
        };
        self.observe(StorageOp::Delete, Some(key), None, started, outcome);
        result
    }

    async fn exists(&self, key: &str) -> Result<bool, StorageError> {
        let started = Instant::now();

        let result = match validate_key(key) {
            Ok(()) => self.probe(key).await,
            Err(e) => Err(e),
        };

        let outcome = match &result {
            Ok(true) => EventOutcome::Ok,
            Ok(false) => EventOutcome::NotFound,
            Err(e) => EventOutcome::Failed(e.to_string()),
        };
        self.observe(StorageOp::Exists, Some(key), None, started, outcome);
        result
    }

    async fn list_objects(&self) -> Result<Vec<ObjectInfo>, StorageError> {
        let started = Instant::now();

        let result: Result<Vec<ObjectInfo>, StorageError> = async {
            let entries = self
                .operator
                .list_with("/")
                .recursive(true)
                .await
                .map_err(|e| StorageError::List(e.to_string()))?;

            let mut objects = Vec::with_capacity(entries.len());
            for entry in entries {
                if !entry.metadata().mode().is_file() {
                    continue;
                }
                let key = entry.path().trim_start_matches('/').to_string();

                // Some backends (filesystem) return bare entries from a listing.
                let listed = entry.metadata();
                let (size, last_modified) = if listed.last_modified().is_some() {
                    (
                        listed.content_length(),
                        listed.last_modified().map(|t| t.to_string()),
                    )
                } else {
                    let meta = self
                        .operator
                        .stat(&key)
                        .await
                        .map_err(|e| StorageError::List(e.to_string()))?;
                    (
                        meta.content_length(),
                        meta.last_modified().map(|t| t.to_string()),
                    )
                };

                objects.push(ObjectInfo {
                    key,
                    size,
                    last_modified,
                });
            }
            objects.sort_by(|a, b| a.key.cmp(&b.key));
            Ok(objects)
        }
        .await;

        let (size, outcome) = match &result {
            Ok(objects) => (Some(objects.len() as u64), EventOutcome::Ok),
            Err(e) => (None, EventOutcome::Failed(e.to_string())),
        };
        self.observe(StorageOp::List, None, size, started, outcome);
        result
    }

    fn describe(&self) -> StoreDescriptor {
        StoreDescriptor {
            provider: self.provider_name(),
            bucket: self.config.provider.bucket().to_string(),
            endpoint: self.config.provider.endpoint().map(String::from),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<StorageEvent>>,
    }

    impl StorageObserver for RecordingObserver {
        fn record(&self, event: &StorageEvent) {
            self.events.lock().unwrap().push(event.clone());
        }
    }

    fn memory_store() -> StorageService {
        StorageService::from_config(StorageConfig::new(StorageProvider::Memory))
            .expect("should create service")
    }

    #[tokio::test]
    async fn test_save_then_fetch_returns_same_bytes() {
        let store = memory_store();
        let key = store
            .save("images/cat.png", Bytes::from_static(b"\x89PNG"), Some("image/png"))
            .await
            .unwrap();

        assert_eq!(key, "images/cat.png");
        let object = store.fetch(&key).await.unwrap();
        assert_eq!(object.content.as_ref(), b"\x89PNG");
        assert_eq!(object.served_content_type(), "image/png");
    }

    #[tokio::test]
    async fn test_save_normalizes_hint() {
        let store = memory_store();
        let key = store
            .save("images/my cat.png", Bytes::from_static(b"x"), None)
            .await
            .unwrap();
        assert_eq!(key, "images/my_cat.png");
    }

    #[tokio::test]
    async fn test_save_renames_on_collision() {
        let store = memory_store();
        let first = store
            .save("images/dup.png", Bytes::from_static(b"one"), None)
            .await
            .unwrap();
        let second = store
            .save("images/dup.png", Bytes::from_static(b"two"), None)
            .await
            .unwrap();

        assert_eq!(first, "images/dup.png");
        assert_ne!(first, second);
        assert!(second.starts_with("images/dup_"));
        assert_eq!(store.fetch(&first).await.unwrap().content.as_ref(), b"one");
        assert_eq!(store.fetch(&second).await.unwrap().content.as_ref(), b"two");
    }

    #[tokio::test]
    async fn test_save_overwrites_when_configured() {
        let config = StorageConfig::new(StorageProvider::Memory).with_file_overwrite(true);
        let store = StorageService::from_config(config).unwrap();

        store
            .save("images/dup.png", Bytes::from_static(b"one"), None)
            .await
            .unwrap();
        let key = store
            .save("images/dup.png", Bytes::from_static(b"two"), None)
            .await
            .unwrap();

        assert_eq!(key, "images/dup.png");
        assert_eq!(store.fetch(&key).await.unwrap().content.as_ref(), b"two");
        assert_eq!(store.list_keys().await.unwrap(), vec!["images/dup.png"]);
    }

    #[tokio::test]
    async fn test_fetch_missing_is_not_found() {
        let store = memory_store();
        let err = store.fetch("images/nope.png").await.unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn test_fetch_rejects_traversal() {
        let store = memory_store();
        let err = store.fetch("../outside.png").await.unwrap_err();
        assert!(matches!(err, StorageError::InvalidKey(_)));
    }

    #[tokio::test]
    async fn test_delete_is_silent_when_absent() {
        let store = memory_store();
        let key = store
            .save("images/a.png", Bytes::from_static(b"a"), None)
            .await
            .unwrap();

        store.delete(&key).await.unwrap();
        assert!(!store.exists(&key).await.unwrap());
        store.delete(&key).await.unwrap();
    }

    #[tokio::test]
    async fn test_list_objects_reports_sizes() {
        let store = memory_store();
        store
            .save("images/b.png", Bytes::from_static(b"bb"), None)
            .await
            .unwrap();
        store
            .save("images/a.png", Bytes::from_static(b"a"), None)
            .await
            .unwrap();

        let objects = store.list_objects().await.unwrap();
        let keys: Vec<&str> = objects.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["images/a.png", "images/b.png"]);
        assert_eq!(objects[1].size, 2);
    }

    #[tokio::test]
    async fn test_filesystem_backend_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store =
            StorageService::from_config(StorageConfig::new(StorageProvider::local_fs(dir.path())))
                .unwrap();

        let key = store
            .save("images/photo.jpg", Bytes::from_static(b"jpeg-bytes"), Some("image/jpeg"))
            .await
            .unwrap();

        assert!(dir.path().join("images/photo.jpg").exists());
        let object = store.fetch(&key).await.unwrap();
        assert_eq!(object.content.as_ref(), b"jpeg-bytes");
        assert_eq!(object.served_content_type(), "image/jpeg");

        let objects = store.list_objects().await.unwrap();
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].key, "images/photo.jpg");
        assert_eq!(objects[0].size, 10);
        assert!(objects[0].last_modified.is_some());
    }

    #[tokio::test]
    async fn test_observer_sees_every_operation() {
        let observer = Arc::new(RecordingObserver::default());
        let store = memory_store().with_observer(observer.clone());

        let key = store
            .save("images/a.png", Bytes::from_static(b"a"), None)
            .await
            .unwrap();
        store.fetch(&key).await.unwrap();
        let _ = store.fetch("images/missing.png").await;
        store.list_keys().await.unwrap();

        let events = observer.events.lock().unwrap();
        let ops: Vec<StorageOp> = events.iter().map(|e| e.op).collect();
        assert_eq!(
            ops,
            vec![
                StorageOp::Save,
                StorageOp::Fetch,
                StorageOp::Fetch,
                StorageOp::List
            ]
        );
        assert_eq!(events[0].size, Some(1));
        assert_eq!(events[2].outcome, EventOutcome::NotFound);
        assert!(events.iter().all(|e| e.provider == "memory"));
    }

    #[test]
    fn test_describe() {
        let store = memory_store();
        let descriptor = store.describe();
        assert_eq!(descriptor.provider, "memory");
        assert!(descriptor.endpoint.is_none());
    }

    #[test]
    fn test_local_s3_without_tls_verification_builds() {
        let config = StorageConfig::new(StorageProvider::local_s3(
            "https://localhost:4566",
            "pinboard-media",
        ))
        .with_verify_tls(false);

        let store = StorageService::from_config(config).expect("should build operator");
        assert!(!store.config().verify_tls);
        assert_eq!(store.describe().provider, "local_s3");
    }
}
