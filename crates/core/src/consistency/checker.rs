//! Check and repair runs against a live store and repository.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use super::error::ConsistencyError;
use super::report::{ConsistencyReport, reconcile};
use crate::image::ImageRepository;
use crate::storage::ObjectStore;

/// Word an operator must type to authorize a destructive repair.
pub const CONFIRMATION_TOKEN: &str = "DELETE";

/// Proof that the operator confirmed a destructive repair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Confirmation(());

impl Confirmation {
    /// Accepts exactly [`CONFIRMATION_TOKEN`], ignoring surrounding whitespace.
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        (input.trim() == CONFIRMATION_TOKEN).then_some(Self(()))
    }
}

/// One item a repair could not fix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepairFailure {
    /// Row ID or storage key.
    pub item: String,
    /// Why it failed.
    pub reason: String,
}

/// Outcome of a repair run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RepairSummary {
    /// Items removed.
    pub removed: Vec<String>,
    /// Items that could not be removed.
    pub failed: Vec<RepairFailure>,
}

/// Runs consistency checks and repairs.
pub struct ConsistencyChecker<R: ImageRepository> {
    store: Arc<dyn ObjectStore>,
    repo: Arc<R>,
}

impl<R: ImageRepository> ConsistencyChecker<R> {
    /// Create a new checker.
    #[must_use]
    pub fn new(store: Arc<dyn ObjectStore>, repo: Arc<R>) -> Self {
        Self { store, repo }
    }

    /// Enumerate both sides and reconcile them. Writes nothing.
    ///
    /// # Errors
    ///
    /// Returns an error, and no partial report, if either side cannot be
    /// enumerated.
    pub async fn check(&self) -> Result<ConsistencyReport, ConsistencyError> {
        let keys = self.store.list_keys().await?;
        let rows = self.repo.list().await?;
        let report = reconcile(keys, &rows);

        info!(
            stored_keys = report.stored_keys,
            rows = report.rows,
            broken = report.broken.len(),
            orphaned = report.orphaned.len(),
            "Consistency check complete"
        );
        Ok(report)
    }

    /// Delete the broken rows listed in `report`.
    pub async fn repair_broken(
        &self,
        report: &ConsistencyReport,
        _confirmed: Confirmation,
    ) -> RepairSummary {
        let mut summary = RepairSummary::default();

        for row in &report.broken {
            let item = row.id.to_string();
            match self.repo.delete(row.id).await {
                Ok(true) => {
                    info!(image_id = row.id, key = %row.storage_key, "Deleted broken image row");
                    summary.removed.push(item);
                }
                Ok(false) => summary.failed.push(RepairFailure {
                    item,
                    reason: "row no longer exists".to_string(),
                }),
                Err(e) => {
                    warn!(image_id = row.id, error = %e, "Failed to delete broken image row");
                    summary.failed.push(RepairFailure {
                        item,
                        reason: e.to_string(),
                    });
                }
            }
        }

        summary
    }

    /// Delete the orphaned objects listed in `report`.
    pub async fn purge_orphans(
        &self,
        report: &ConsistencyReport,
        _confirmed: Confirmation,
    ) -> RepairSummary {
        let mut summary = RepairSummary::default();

        for key in &report.orphaned {
            match self.store.delete(key).await {
                Ok(()) => {
                    info!(key = %key, "Deleted orphaned object");
                    summary.removed.push(key.clone());
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Failed to delete orphaned object");
                    summary.failed.push(RepairFailure {
                        item: key.clone(),
                        reason: e.to_string(),
                    });
                }
            }
        }

        summary
    }
}
