//! Migration Utility: copy image files from a legacy store into the current one.
//!
//! Rows are never deleted. A row's key changes only after its file was
//! written to the target, so an interrupted run can simply be repeated.

mod error;
mod migrator;

pub use error::MigrationError;
pub use migrator::{LegacyMigrator, MigratedRow, MigrationReport, RowIssue};
