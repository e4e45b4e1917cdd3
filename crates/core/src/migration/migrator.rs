//! Row-by-row copy from a legacy store.

use std::sync::Arc;

use serde::Serialize;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::error::MigrationError;
use crate::image::{Image, ImageChanges, ImageRepository};
use crate::storage::{ObjectStore, StorageError, StoredObject};

/// A row whose file was copied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MigratedRow {
    /// Row ID.
    pub id: i32,
    /// Key in the legacy store.
    pub from: String,
    /// Key in the target store.
    pub to: String,
}

/// A row that was skipped or failed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RowIssue {
    /// Row ID.
    pub id: i32,
    /// Key the row points at.
    pub storage_key: String,
    /// What happened.
    pub reason: String,
}

/// Outcome of a migration run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MigrationReport {
    /// Rows whose file was copied.
    pub migrated: Vec<MigratedRow>,
    /// Rows whose file already was in the target.
    pub already_migrated: Vec<i32>,
    /// Rows left unchanged because there was nothing to copy.
    pub skipped: Vec<RowIssue>,
    /// Rows that hit a storage or database error.
    pub failed: Vec<RowIssue>,
}

enum RowOutcome {
    Migrated(MigratedRow),
    AlreadyMigrated,
    Skipped(String),
    Failed(String),
}

/// Copies each image row's file from `source` to `target`.
pub struct LegacyMigrator<R: ImageRepository> {
    source: Arc<dyn ObjectStore>,
    target: Arc<dyn ObjectStore>,
    repo: Arc<R>,
    verify_checksum: bool,
}

impl<R: ImageRepository> LegacyMigrator<R> {
    /// Create a migrator.
    #[must_use]
    pub fn new(source: Arc<dyn ObjectStore>, target: Arc<dyn ObjectStore>, repo: Arc<R>) -> Self {
        Self {
            source,
            target,
            repo,
            verify_checksum: false,
        }
    }

    /// Compare SHA-256 digests before trusting a file already in the target.
    #[must_use]
    pub fn with_checksum_verification(mut self, verify: bool) -> Self {
        self.verify_checksum = verify;
        self
    }

    /// Migrate every row.
    ///
    /// # Errors
    ///
    /// Returns an error only if the rows cannot be listed. Per-row failures
    /// are collected in the report.
    pub async fn run(&self) -> Result<MigrationReport, MigrationError> {
        let rows = self.repo.list().await?;
        let mut report = MigrationReport::default();

        for row in rows {
            let issue = |reason: String| RowIssue {
                id: row.id,
                storage_key: row.storage_key.clone(),
                reason,
            };

            match self.migrate_row(&row).await {
                RowOutcome::Migrated(migrated) => {
                    info!(image_id = row.id, from = %migrated.from, to = %migrated.to, "Migrated image file");
                    report.migrated.push(migrated);
                }
                RowOutcome::AlreadyMigrated => {
                    debug!(image_id = row.id, key = %row.storage_key, "Already migrated");
                    report.already_migrated.push(row.id);
                }
                RowOutcome::Skipped(reason) => {
                    info!(image_id = row.id, key = %row.storage_key, reason = %reason, "Skipped image row");
                    report.skipped.push(issue(reason));
                }
                RowOutcome::Failed(reason) => {
                    warn!(image_id = row.id, key = %row.storage_key, reason = %reason, "Failed to migrate image row");
                    report.failed.push(issue(reason));
                }
            }
        }

        Ok(report)
    }

    async fn migrate_row(&self, row: &Image) -> RowOutcome {
        let Some(key) = row.stored_key() else {
            return RowOutcome::Skipped("row has no file reference".to_string());
        };

        match self.target.exists(key).await {
            Ok(false) => {}
            Ok(true) if !self.verify_checksum => return RowOutcome::AlreadyMigrated,
            Ok(true) => match self.matches_target(key).await {
                Ok(true) => return RowOutcome::AlreadyMigrated,
                Ok(false) => {}
                Err(e) => return RowOutcome::Failed(e.to_string()),
            },
            Err(e) => return RowOutcome::Failed(e.to_string()),
        }

        let legacy = match self.source.fetch(key).await {
            Ok(object) => object,
            Err(e) if e.is_not_found() => {
                return RowOutcome::Skipped("legacy file not found".to_string());
            }
            Err(e) => return RowOutcome::Failed(e.to_string()),
        };

        let content_type = legacy.served_content_type().to_string();
        let new_key = match self
            .target
            .save(key, legacy.content, Some(&content_type))
            .await
        {
            Ok(new_key) => new_key,
            Err(e) => return RowOutcome::Failed(e.to_string()),
        };

        if new_key != key {
            let changes = ImageChanges {
                storage_key: Some(new_key.clone()),
                ..ImageChanges::default()
            };
            match self.repo.update(row.id, changes).await {
                Ok(Some(_)) => {}
                Ok(None) => {
                    self.discard(&new_key).await;
                    return RowOutcome::Failed("row no longer exists".to_string());
                }
                Err(e) => {
                    self.discard(&new_key).await;
                    return RowOutcome::Failed(e.to_string());
                }
            }
        }

        RowOutcome::Migrated(MigratedRow {
            id: row.id,
            from: key.to_string(),
            to: new_key,
        })
    }

    /// Whether the target copy matches the legacy file. A legacy file that is
    /// gone leaves nothing to compare, so the target copy is trusted.
    async fn matches_target(&self, key: &str) -> Result<bool, StorageError> {
        let legacy = match self.source.fetch(key).await {
            Ok(object) => object,
            Err(e) if e.is_not_found() => return Ok(true),
            Err(e) => return Err(e),
        };
        let stored = self.target.fetch(key).await?;
        Ok(digest(&legacy) == digest(&stored))
    }

    async fn discard(&self, key: &str) {
        if let Err(e) = self.target.delete(key).await {
            warn!(key = %key, error = %e, "Failed to delete copied file; it is now orphaned");
        }
    }
}

fn digest(object: &StoredObject) -> String {
    hex::encode(Sha256::digest(&object.content))
}
