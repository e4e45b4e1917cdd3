//! Text and JSON rendering of command results.

use std::fmt::Write as _;

use serde::Serialize;

use pinboard_core::consistency::{ConsistencyReport, RepairSummary};
use pinboard_core::migration::MigrationReport;
use pinboard_core::storage::ObjectInfo;

/// Output format for command results.
#[derive(Debug, Clone, Copy, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text.
    Text,
    /// JSON for scripting.
    Json,
}

/// A command result that can be printed as text.
pub trait Render: Serialize {
    /// Human-readable form.
    fn render_text(&self) -> String;
}

/// Print `value` to stdout in `format`.
pub fn emit<T: Render>(value: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Text => print!("{}", value.render_text()),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
    }
    Ok(())
}

/// Result of `repair-rows`, `purge-orphans` and `repair-all`.
///
/// A step that was not requested or was cancelled stays `None`.
#[derive(Debug, Serialize)]
pub struct RepairOutput {
    /// Check taken before repairing.
    pub report: ConsistencyReport,
    /// Broken-row deletion.
    pub broken_rows: Option<RepairSummary>,
    /// Orphan deletion.
    pub orphaned_objects: Option<RepairSummary>,
}

impl RepairOutput {
    pub fn new(report: ConsistencyReport) -> Self {
        Self {
            report,
            broken_rows: None,
            orphaned_objects: None,
        }
    }

    pub fn has_failures(&self) -> bool {
        [&self.broken_rows, &self.orphaned_objects]
            .into_iter()
            .flatten()
            .any(|summary| !summary.failed.is_empty())
    }
}

/// Result of `migrate`.
#[derive(Debug, Serialize)]
pub struct MigrateOutput {
    /// Per-row outcome.
    pub report: MigrationReport,
    /// Target store contents after the run.
    pub inventory: Vec<ObjectInfo>,
}

impl Render for ConsistencyReport {
    fn render_text(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "Stored objects:   {}", self.stored_keys);
        let _ = writeln!(out, "Image rows:       {}", self.rows);
        let _ = writeln!(out, "Valid rows:       {}", self.valid_rows);
        let _ = writeln!(out, "Broken rows:      {}", self.broken.len());
        let _ = writeln!(out, "Orphaned objects: {}", self.orphaned.len());

        if !self.broken.is_empty() {
            let _ = writeln!(out, "\nBroken rows:");
            for row in &self.broken {
                let key = if row.storage_key.is_empty() {
                    "<no key>"
                } else {
                    row.storage_key.as_str()
                };
                let _ = writeln!(
                    out,
                    "  #{:<6} {key}  {}",
                    row.id,
                    row.title.as_deref().unwrap_or("")
                );
            }
        }

        if !self.orphaned.is_empty() {
            let _ = writeln!(out, "\nOrphaned objects:");
            for key in &self.orphaned {
                let _ = writeln!(out, "  {key}");
            }
        }

        if self.is_consistent() {
            let _ = writeln!(out, "\nStorage and database are consistent.");
        }
        out
    }
}

fn render_summary(out: &mut String, heading: &str, summary: Option<&RepairSummary>) {
    let _ = writeln!(out, "\n{heading}:");
    let Some(summary) = summary else {
        let _ = writeln!(out, "  skipped, no changes made");
        return;
    };

    let _ = writeln!(out, "  removed {}", summary.removed.len());
    for item in &summary.removed {
        let _ = writeln!(out, "    {item}");
    }
    if !summary.failed.is_empty() {
        let _ = writeln!(out, "  failed {}", summary.failed.len());
        for failure in &summary.failed {
            let _ = writeln!(out, "    {}: {}", failure.item, failure.reason);
        }
    }
}

impl Render for RepairOutput {
    fn render_text(&self) -> String {
        let mut out = self.report.render_text();
        render_summary(&mut out, "Broken rows", self.broken_rows.as_ref());
        render_summary(&mut out, "Orphaned objects", self.orphaned_objects.as_ref());
        out
    }
}

impl Render for MigrateOutput {
    fn render_text(&self) -> String {
        let report = &self.report;
        let mut out = String::new();
        let _ = writeln!(out, "Migrated:         {}", report.migrated.len());
        let _ = writeln!(out, "Already migrated: {}", report.already_migrated.len());
        let _ = writeln!(out, "Skipped:          {}", report.skipped.len());
        let _ = writeln!(out, "Failed:           {}", report.failed.len());

        for row in &report.migrated {
            let _ = writeln!(out, "  #{:<6} {} -> {}", row.id, row.from, row.to);
        }
        for (label, issues) in [("Skipped", &report.skipped), ("Failed", &report.failed)] {
            if issues.is_empty() {
                continue;
            }
            let _ = writeln!(out, "\n{label}:");
            for issue in issues {
                let _ = writeln!(
                    out,
                    "  #{:<6} {}  ({})",
                    issue.id, issue.storage_key, issue.reason
                );
            }
        }

        let _ = writeln!(out, "\nTarget inventory ({} objects):", self.inventory.len());
        for object in &self.inventory {
            let _ = writeln!(
                out,
                "  {:<48} {:>10}  {}",
                object.key,
                object.size,
                object.last_modified.as_deref().unwrap_or("-")
            );
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use pinboard_core::consistency::{BrokenRow, RepairFailure};

    use super::*;

    fn report() -> ConsistencyReport {
        ConsistencyReport {
            stored_keys: 2,
            rows: 2,
            valid_rows: 1,
            broken: vec![BrokenRow {
                id: 7,
                title: Some("Lost".to_string()),
                storage_key: String::new(),
            }],
            orphaned: vec!["images/stray.png".to_string()],
        }
    }

    #[test]
    fn test_report_text_lists_items() {
        let text = report().render_text();
        assert!(text.contains("Broken rows:      1"));
        assert!(text.contains("<no key>"));
        assert!(text.contains("images/stray.png"));
        assert!(!text.contains("consistent."));
    }

    #[test]
    fn test_cancelled_step_is_reported_as_skipped() {
        let output = RepairOutput::new(report());
        assert!(output.render_text().contains("skipped, no changes made"));
        assert!(!output.has_failures());
    }

    #[test]
    fn test_failures_are_detected() {
        let mut output = RepairOutput::new(report());
        output.orphaned_objects = Some(RepairSummary {
            removed: vec![],
            failed: vec![RepairFailure {
                item: "images/stray.png".to_string(),
                reason: "access denied".to_string(),
            }],
        });
        assert!(output.has_failures());
        assert!(output.render_text().contains("access denied"));
    }
}
