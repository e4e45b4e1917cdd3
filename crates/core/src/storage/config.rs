//! Storage configuration types.

use std::path::PathBuf;

use pinboard_shared::{StorageBackend, StorageSettings};
use serde::{Deserialize, Serialize};

use super::error::StorageError;

/// Default endpoint of a local S3 emulator (LocalStack).
pub const LOCAL_S3_ENDPOINT: &str = "http://localhost:4566";

/// Storage provider configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StorageProvider {
    /// Local filesystem.
    LocalFs {
        /// Root directory path.
        root: PathBuf,
    },
    /// S3 protocol against a local emulator (LocalStack, MinIO).
    LocalS3 {
        /// Emulator endpoint URL.
        endpoint: String,
        /// Bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
    },
    /// Production S3-compatible storage: AWS S3, Cloudflare R2, DigitalOcean Spaces.
    S3 {
        /// S3 endpoint URL.
        endpoint: String,
        /// S3 bucket name.
        bucket: String,
        /// Access key ID.
        access_key_id: String,
        /// Secret access key.
        secret_access_key: String,
        /// Region.
        region: String,
        /// Public domain serving the bucket, used for direct URLs.
        custom_domain: Option<String>,
    },
    /// In-process memory (tests, throwaway dev).
    Memory,
}

impl StorageProvider {
    /// Create local filesystem provider.
    #[must_use]
    pub fn local_fs(root: impl Into<PathBuf>) -> Self {
        Self::LocalFs { root: root.into() }
    }

    /// Create provider for a local S3 emulator with its conventional credentials.
    #[must_use]
    pub fn local_s3(endpoint: impl Into<String>, bucket: impl Into<String>) -> Self {
        Self::LocalS3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: "test".to_string(),
            secret_access_key: "test".to_string(),
            region: "us-east-1".to_string(),
        }
    }

    /// Create production S3-compatible provider.
    #[must_use]
    pub fn s3(
        endpoint: impl Into<String>,
        bucket: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
        region: impl Into<String>,
    ) -> Self {
        Self::S3 {
            endpoint: endpoint.into(),
            bucket: bucket.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            region: region.into(),
            custom_domain: None,
        }
    }

    /// Get the provider name.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LocalFs { .. } => "local",
            Self::LocalS3 { .. } => "local_s3",
            Self::S3 { .. } => "s3",
            Self::Memory => "memory",
        }
    }

    /// Get the bucket name (or root directory for the filesystem).
    #[must_use]
    pub fn bucket(&self) -> &str {
        match self {
            Self::LocalS3 { bucket, .. } | Self::S3 { bucket, .. } => bucket,
            Self::LocalFs { root } => root.to_str().unwrap_or("local"),
            Self::Memory => "memory",
        }
    }

    /// Get the endpoint URL, if the provider talks to one.
    #[must_use]
    pub fn endpoint(&self) -> Option<&str> {
        match self {
            Self::LocalS3 { endpoint, .. } | Self::S3 { endpoint, .. } => Some(endpoint),
            Self::LocalFs { .. } | Self::Memory => None,
        }
    }

    /// Base URL for direct (non-proxied) object links.
    ///
    /// Prefers the custom domain of a production bucket, falling back to
    /// path-style `{endpoint}/{bucket}`.
    #[must_use]
    pub fn public_base_url(&self) -> Option<String> {
        match self {
            Self::S3 {
                custom_domain: Some(domain),
                ..
            } => Some(format!("https://{}", domain.trim_end_matches('/'))),
            Self::S3 {
                endpoint, bucket, ..
            }
            | Self::LocalS3 {
                endpoint, bucket, ..
            } => Some(format!("{}/{bucket}", endpoint.trim_end_matches('/'))),
            Self::LocalFs { .. } | Self::Memory => None,
        }
    }
}

/// Limits applied to uploads before anything is written.
#[derive(Debug, Clone)]
pub struct UploadPolicy {
    /// Maximum file size in bytes.
    pub max_file_size: u64,
    /// Allowed content types.
    pub allowed_content_types: Vec<String>,
}

impl Default for UploadPolicy {
    fn default() -> Self {
        Self {
            max_file_size: StorageConfig::DEFAULT_MAX_FILE_SIZE,
            allowed_content_types: StorageConfig::default_content_types(),
        }
    }
}

impl UploadPolicy {
    /// Check if a content type is allowed. Parameters such as `; charset=` are ignored.
    #[must_use]
    pub fn is_content_type_allowed(&self, content_type: &str) -> bool {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        self.allowed_content_types.iter().any(|t| *t == essence)
    }

    /// Validate an upload against size and content type limits.
    ///
    /// # Errors
    ///
    /// Returns `FileTooLarge` or `InvalidContentType`.
    pub fn validate(&self, content_type: &str, size: u64) -> Result<(), StorageError> {
        if size > self.max_file_size {
            return Err(StorageError::file_too_large(size, self.max_file_size));
        }

        if !self.is_content_type_allowed(content_type) {
            return Err(StorageError::invalid_content_type(content_type));
        }

        Ok(())
    }
}

/// Storage service configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Storage provider configuration.
    pub provider: StorageProvider,
    /// Replace existing objects on key collision instead of picking a new name.
    pub file_overwrite: bool,
    /// Canned ACL for new objects.
    pub default_acl: Option<String>,
    /// Verify TLS certificates of the endpoint.
    pub verify_tls: bool,
    /// Upload limits.
    pub upload: UploadPolicy,
}

impl StorageConfig {
    /// Default max file size: 10MB.
    pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

    /// Create a new storage config with default settings.
    #[must_use]
    pub fn new(provider: StorageProvider) -> Self {
        Self {
            provider,
            file_overwrite: false,
            default_acl: None,
            verify_tls: true,
            upload: UploadPolicy::default(),
        }
    }

    /// Build from the application's storage settings.
    ///
    /// # Errors
    ///
    /// Returns a configuration error when the production backend is selected
    /// without an endpoint or credentials.
    pub fn from_settings(settings: &StorageSettings) -> Result<Self, StorageError> {
        let provider = match settings.backend {
            StorageBackend::Local => StorageProvider::local_fs(&settings.media_root),
            StorageBackend::Memory => StorageProvider::Memory,
            StorageBackend::LocalS3 => StorageProvider::LocalS3 {
                endpoint: settings
                    .endpoint_url
                    .clone()
                    .unwrap_or_else(|| LOCAL_S3_ENDPOINT.to_string()),
                bucket: settings.bucket.clone(),
                access_key_id: settings
                    .access_key_id
                    .clone()
                    .unwrap_or_else(|| "test".to_string()),
                secret_access_key: settings
                    .secret_access_key
                    .clone()
                    .unwrap_or_else(|| "test".to_string()),
                region: settings.region.clone(),
            },
            StorageBackend::S3 => StorageProvider::S3 {
                endpoint: required(settings.endpoint_url.as_ref(), "endpoint_url")?,
                bucket: settings.bucket.clone(),
                access_key_id: required(settings.access_key_id.as_ref(), "access_key_id")?,
                secret_access_key: required(
                    settings.secret_access_key.as_ref(),
                    "secret_access_key",
                )?,
                region: settings.region.clone(),
                custom_domain: settings.custom_domain.clone(),
            },
        };

        Ok(Self {
            provider,
            file_overwrite: settings.file_overwrite,
            default_acl: settings.default_acl.clone(),
            verify_tls: settings.verify_tls,
            upload: UploadPolicy {
                max_file_size: settings.max_upload_bytes,
                allowed_content_types: settings.allowed_content_types.clone(),
            },
        })
    }

    /// Set whether colliding keys are overwritten.
    #[must_use]
    pub fn with_file_overwrite(mut self, overwrite: bool) -> Self {
        self.file_overwrite = overwrite;
        self
    }

    /// Set whether the endpoint's TLS certificate is verified.
    #[must_use]
    pub fn with_verify_tls(mut self, verify: bool) -> Self {
        self.verify_tls = verify;
        self
    }

    /// Set maximum file size.
    #[must_use]
    pub fn with_max_file_size(mut self, size: u64) -> Self {
        self.upload.max_file_size = size;
        self
    }

    /// Set allowed content types.
    #[must_use]
    pub fn with_allowed_content_types(mut self, types: Vec<String>) -> Self {
        self.upload.allowed_content_types = types;
        self
    }

    /// Default allowed content types for images.
    #[must_use]
    pub fn default_content_types() -> Vec<String> {
        vec![
            "image/png".to_string(),
            "image/jpeg".to_string(),
            "image/gif".to_string(),
            "image/webp".to_string(),
            "image/svg+xml".to_string(),
        ]
    }
}

fn required(value: Option<&String>, name: &str) -> Result<String, StorageError> {
    value
        .filter(|v| !v.is_empty())
        .cloned()
        .ok_or_else(|| StorageError::configuration(format!("storage.{name} is required for s3")))
}
