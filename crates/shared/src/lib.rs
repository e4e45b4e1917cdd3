//! Shared configuration and error types for Pinboard.
//!
//! This crate provides common types used across all other crates:
//! - Configuration management (server, database, object storage)
//! - Application-wide error types
//! - Field-level validation errors

pub mod config;
pub mod error;
pub mod validation;

pub use config::{
    AppConfig, DatabaseConfig, ServerConfig, StorageBackend, StorageSettings, UrlMode,
};
pub use error::{AppError, AppResult};
pub use validation::ValidationErrors;
