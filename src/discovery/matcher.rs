//! Snapshot-based value matching.
//!
//! Stands in for an anti-join on the source database: the parent column is
//! loaded into a hash set and the child column is streamed against it.
//!
//! ```text
//!  parent snapshot ──▶ HashSet<String> ◀── contains? ── child snapshot (streamed)
//!                                               │
//!                                               ▼
//!                                    matched / examined = ratio
//! ```
//!
//! Values are compared ordinally after trimming surrounding whitespace. An
//! empty value is a NULL. Empty child values never take part in the ratio;
//! `include_nulls` only decides whether an empty parent value is kept in the
//! parent set.

use std::collections::HashSet;
use std::path::Path;

use crate::snapshot::{ColumnValues, SnapshotError};

/// Counts gathered while matching one child column against one parent key.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchStats {
    /// Rows in the child snapshot.
    pub child_rows: u64,
    /// Child rows whose value is empty.
    pub child_nulls: u64,
    /// Non-empty child values.
    pub examined: u64,
    /// Examined values found in the parent.
    pub matched: u64,
    /// Distinct examined child values.
    pub child_distinct: u64,
    /// Distinct parent values.
    pub parent_distinct: u64,
}

impl MatchStats {
    /// `matched / examined`, or 0.0 when the child has no non-empty values.
    pub fn match_ratio(&self) -> f64 {
        if self.examined == 0 {
            return 0.0;
        }
        self.matched as f64 / self.examined as f64
    }

    /// Examined child values with no counterpart in the parent.
    pub fn missing_in_parent(&self) -> u64 {
        self.examined - self.matched
    }

    /// Empty child values over child rows.
    pub fn null_ratio(&self) -> f64 {
        if self.child_rows == 0 {
            return 0.0;
        }
        self.child_nulls as f64 / self.child_rows as f64
    }
}

/// Distinct values of a parent key column.
#[derive(Debug, Clone, Default)]
pub struct ParentValues {
    values: HashSet<String>,
}

impl ParentValues {
    /// Load the distinct trimmed values of `column` from a snapshot.
    pub fn load(path: &Path, column: &str, include_nulls: bool) -> Result<Self, SnapshotError> {
        let mut values = HashSet::new();
        for value in ColumnValues::open(path, column)? {
            let value = value?;
            let value = value.trim();
            if value.is_empty() && !include_nulls {
                continue;
            }
            if !values.contains(value) {
                values.insert(value.to_string());
            }
        }
        Ok(Self { values })
    }

    pub fn contains(&self, value: &str) -> bool {
        self.values.contains(value)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl<S: Into<String>> FromIterator<S> for ParentValues {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Stream `column` of the child snapshot against the parent values.
pub fn match_column(
    child_path: &Path,
    column: &str,
    parent: &ParentValues,
) -> Result<MatchStats, SnapshotError> {
    let mut stats = MatchStats {
        parent_distinct: parent.len() as u64,
        ..Default::default()
    };
    let mut distinct: HashSet<String> = HashSet::new();

    for value in ColumnValues::open(child_path, column)? {
        let value = value?;
        let value = value.trim();
        stats.child_rows += 1;

        if value.is_empty() {
            stats.child_nulls += 1;
            continue;
        }

        stats.examined += 1;
        if parent.contains(value) {
            stats.matched += 1;
        }
        if !distinct.contains(value) {
            distinct.insert(value.to_string());
        }
    }

    stats.child_distinct = distinct.len() as u64;
    Ok(stats)
}

/// Distinct non-empty values over non-empty values of a snapshot column.
///
/// A column with no non-empty values has uniqueness 0.0.
pub fn column_uniqueness(path: &Path, column: &str) -> Result<f64, SnapshotError> {
    let mut total = 0u64;
    let mut distinct: HashSet<String> = HashSet::new();

    for value in ColumnValues::open(path, column)? {
        let value = value?;
        let value = value.trim();
        if value.is_empty() {
            continue;
        }
        total += 1;
        if !distinct.contains(value) {
            distinct.insert(value.to_string());
        }
    }

    if total == 0 {
        return Ok(0.0);
    }
    Ok(distinct.len() as f64 / total as f64)
}
