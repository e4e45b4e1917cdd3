//! Application configuration management.

use serde::Deserialize;

/// Application configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Server configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Database configuration.
    pub database: DatabaseConfig,
    /// Object storage configuration.
    #[serde(default)]
    pub storage: StorageSettings,
}

/// Server configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host to bind to.
    #[serde(default = "default_host")]
    pub host: String,
    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
    /// Absolute origin (e.g. `http://localhost:8000`) used to build image URLs
    /// when no inbound request is available.
    #[serde(default)]
    pub public_url: Option<String>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            public_url: None,
        }
    }
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    8000
}

/// Database configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    /// Database connection URL.
    pub url: String,
    /// Maximum number of connections in the pool.
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    /// Minimum number of connections in the pool.
    #[serde(default = "default_min_connections")]
    pub min_connections: u32,
    /// Apply pending schema migrations when the server starts.
    #[serde(default)]
    pub auto_migrate: bool,
}

fn default_max_connections() -> u32 {
    10
}

fn default_min_connections() -> u32 {
    1
}

/// Which object storage backend holds image bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageBackend {
    /// Local filesystem under `media_root`.
    #[default]
    Local,
    /// S3 protocol against a local emulator (LocalStack, MinIO).
    LocalS3,
    /// Production S3-compatible endpoint.
    S3,
    /// In-process memory store; contents vanish on exit.
    Memory,
}

/// How `image_url` is rendered for clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UrlMode {
    /// Point at the API's own image proxy endpoint.
    #[default]
    Proxy,
    /// Point straight at the object store (or its custom domain).
    Direct,
}

/// Object storage configuration as read from config files and environment.
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// Backend selection, fixed for the lifetime of the process.
    #[serde(default)]
    pub backend: StorageBackend,
    /// Root directory for the `local` backend.
    #[serde(default = "default_media_root")]
    pub media_root: String,
    /// Bucket name for S3 backends.
    #[serde(default = "default_bucket")]
    pub bucket: String,
    /// Endpoint URL for S3 backends.
    #[serde(default)]
    pub endpoint_url: Option<String>,
    /// Access key ID for S3 backends.
    #[serde(default)]
    pub access_key_id: Option<String>,
    /// Secret access key for S3 backends.
    #[serde(default)]
    pub secret_access_key: Option<String>,
    /// Region for S3 backends.
    #[serde(default = "default_region")]
    pub region: String,
    /// Verify TLS certificates of the storage endpoint.
    #[serde(default = "default_true")]
    pub verify_tls: bool,
    /// Replace an existing object on name collision instead of renaming.
    #[serde(default)]
    pub file_overwrite: bool,
    /// Canned ACL applied to new objects, if any.
    #[serde(default)]
    pub default_acl: Option<String>,
    /// Public domain fronting the production bucket.
    #[serde(default)]
    pub custom_domain: Option<String>,
    /// Proxied or direct image URLs.
    #[serde(default)]
    pub url_mode: UrlMode,
    /// Maximum accepted upload size in bytes.
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,
    /// Accepted upload content types.
    #[serde(default = "default_allowed_content_types")]
    pub allowed_content_types: Vec<String>,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::default(),
            media_root: default_media_root(),
            bucket: default_bucket(),
            endpoint_url: None,
            access_key_id: None,
            secret_access_key: None,
            region: default_region(),
            verify_tls: true,
            file_overwrite: false,
            default_acl: None,
            custom_domain: None,
            url_mode: UrlMode::default(),
            max_upload_bytes: default_max_upload_bytes(),
            allowed_content_types: default_allowed_content_types(),
        }
    }
}

fn default_media_root() -> String {
    "media".to_string()
}

fn default_bucket() -> String {
    "pinboard-media".to_string()
}

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_true() -> bool {
    true
}

fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024 // 10 MiB
}

fn default_allowed_content_types() -> Vec<String> {
    ["image/png", "image/jpeg", "image/gif", "image/webp", "image/svg+xml"]
        .into_iter()
        .map(String::from)
        .collect()
}

impl AppConfig {
    /// Loads configuration from environment and config files.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration cannot be loaded.
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = std::env::var("RUN_MODE").unwrap_or_else(|_| "development".to_string());

        let config = config::Config::builder()
            .add_source(config::File::with_name("config/default").required(false))
            .add_source(config::File::with_name(&format!("config/{run_mode}")).required(false))
            .add_source(
                config::Environment::with_prefix("PINBOARD")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("storage.allowed_content_types"),
            )
            .build()?;

        config.try_deserialize()
    }
}
