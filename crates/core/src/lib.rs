//! Core logic for Pinboard.
//!
//! This crate contains domain logic with ZERO web or database dependencies.
//! Persistence is reached through repository traits implemented by
//! `pinboard-db`; object storage through the [`storage::ObjectStore`] trait.
//!
//! # Modules
//!
//! - `storage` - Object Storage Adapter (filesystem, S3 emulator, S3, memory)
//! - `image` - Image rows kept in step with their stored files
//! - `message` - Text messages
//! - `consistency` - Broken-row and orphaned-file detection and repair
//! - `migration` - Copying files from a legacy filesystem store

pub mod consistency;
pub mod image;
pub mod message;
pub mod migration;
pub mod storage;

#[cfg(test)]
mod testing;
