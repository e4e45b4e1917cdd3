//! Pure reconciliation of stored keys against image rows.

use std::collections::BTreeSet;

use serde::Serialize;

use crate::image::Image;

/// An image row whose file is missing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BrokenRow {
    /// Row ID.
    pub id: i32,
    /// Row title.
    pub title: Option<String>,
    /// Key the row points at; empty when it has none.
    pub storage_key: String,
}

/// Result of one consistency check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConsistencyReport {
    /// Number of distinct stored keys.
    pub stored_keys: usize,
    /// Number of image rows.
    pub rows: usize,
    /// Rows whose key resolves.
    pub valid_rows: usize,
    /// Rows whose key is empty or not stored, ordered by ID.
    pub broken: Vec<BrokenRow>,
    /// Stored keys no row references, sorted.
    pub orphaned: Vec<String>,
}

impl ConsistencyReport {
    /// Returns true when there is nothing to repair.
    #[must_use]
    pub fn is_consistent(&self) -> bool {
        self.broken.is_empty() && self.orphaned.is_empty()
    }
}

/// Compare the stored keys with the image rows.
#[must_use]
pub fn reconcile<I, S>(keys: I, rows: &[Image]) -> ConsistencyReport
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let stored: BTreeSet<String> = keys.into_iter().map(Into::into).collect();
    let referenced: BTreeSet<&str> = rows.iter().filter_map(Image::stored_key).collect();

    let mut broken: Vec<BrokenRow> = rows
        .iter()
        .filter(|row| row.stored_key().is_none_or(|key| !stored.contains(key)))
        .map(|row| BrokenRow {
            id: row.id,
            title: row.title.clone(),
            storage_key: row.storage_key.clone(),
        })
        .collect();
    broken.sort_by_key(|row| row.id);

    let orphaned = stored
        .iter()
        .filter(|key| !referenced.contains(key.as_str()))
        .cloned()
        .collect();

    ConsistencyReport {
        stored_keys: stored.len(),
        rows: rows.len(),
        valid_rows: rows.len() - broken.len(),
        broken,
        orphaned,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use proptest::prelude::*;

    fn rows(keys: &[&str]) -> Vec<Image> {
        keys.iter()
            .zip(1..)
            .map(|(key, id)| Image {
                id,
                title: None,
                storage_key: (*key).to_string(),
                uploaded_at: Utc::now(),
            })
            .collect()
    }

    #[test]
    fn test_reconcile_finds_broken_and_orphaned() {
        let report = reconcile(["a", "b", "c"], &rows(&["a", "b", "d"]));

        assert_eq!(report.stored_keys, 3);
        assert_eq!(report.rows, 3);
        assert_eq!(report.valid_rows, 2);
        assert_eq!(
            report.broken.iter().map(|r| r.storage_key.as_str()).collect::<Vec<_>>(),
            vec!["d"]
        );
        assert_eq!(report.orphaned, vec!["c"]);
        assert!(!report.is_consistent());
    }

    #[test]
    fn test_empty_key_is_broken() {
        let report = reconcile(["a"], &rows(&["a", ""]));
        assert_eq!(report.broken.len(), 1);
        assert_eq!(report.broken[0].id, 2);
        assert!(report.orphaned.is_empty());
    }

    #[test]
    fn test_consistent_state() {
        let report = reconcile(Vec::<String>::new(), &[]);
        assert!(report.is_consistent());

        let report = reconcile(["x", "y"], &rows(&["y", "x"]));
        assert!(report.is_consistent());
        assert_eq!(report.valid_rows, 2);
    }

    proptest! {
        #[test]
        fn prop_reconcile_partitions(
            stored in proptest::collection::btree_set("[a-e]", 0..6),
            keys in proptest::collection::vec("[a-g]?", 0..8),
        ) {
            let key_refs: Vec<&str> = keys.iter().map(String::as_str).collect();
            let rows = rows(&key_refs);
            let report = reconcile(stored.iter().cloned(), &rows);

            prop_assert_eq!(report.valid_rows + report.broken.len(), rows.len());
            for row in &report.broken {
                prop_assert!(row.storage_key.is_empty() || !stored.contains(&row.storage_key));
            }
            for key in &report.orphaned {
                prop_assert!(stored.contains(key));
                prop_assert!(!keys.contains(key));
            }
            prop_assert_eq!(&report, &reconcile(stored.iter().cloned(), &rows));
        }
    }
}
