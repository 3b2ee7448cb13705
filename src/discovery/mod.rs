//! Relationship discovery over table snapshots.
//!
//! ```text
//! TableMetadata ──▶ KeyClassifier ──▶ parent keys, child columns
//!                                              │
//!                                              ▼
//!                                     is_type_compatible
//!                                              │
//!                                              ▼
//!     snapshots ──▶ ParentValues, match_column ──▶ MatchStats ──▶ build_candidate
//! ```
//!
//! Every child column of every table is tried against every parent key of
//! every other table. Pairs already covered by a declared foreign key and
//! pairs with incompatible types are skipped before any snapshot is read.
//! Output order follows input order: child table, child column, parent
//! table, parent key. Within one child table each parent key is loaded once
//! and matched against all of the child's columns.

mod candidate;
mod classifier;
mod matcher;
mod naming;
mod types;

use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;

use crate::ignore::IgnorePolicy;
use crate::joblog::JobLogger;
use crate::model::{ColumnInfo, MissingFkCandidate, Options, TableMetadata, TableRef};
use crate::snapshot::{snapshot_path, SnapshotError};

pub use candidate::build_candidate;
pub use classifier::{KeyClassifier, ParentKeyCandidate, ASSUMED_CANDIDATE_UNIQUENESS};
pub use matcher::{column_uniqueness, match_column, MatchStats, ParentValues};
pub use naming::{
    IdentifierPattern, NamingConventions, SuffixPattern, DEFAULT_CHILD_COLUMN_SUFFIXES,
    DEFAULT_PARENT_KEY_SUFFIXES,
};
pub use types::is_type_compatible;

/// A snapshot could not be analyzed.
#[derive(Debug, Error)]
#[error("failed to analyze snapshot of {table}: {source}")]
pub struct AnalysisError {
    pub table: TableRef,
    #[source]
    pub source: SnapshotError,
}

/// What the analysis phase produced.
#[derive(Debug, Clone, Default)]
pub struct AnalysisOutcome {
    pub candidates: Vec<MissingFkCandidate>,
    pub tables_without_keys: Vec<TableRef>,
    /// (child column, parent key) pairs whose values were compared.
    pub pairs_evaluated: usize,
}

/// Runs classification and matching over a snapshot directory.
pub struct Analyzer {
    options: Options,
    ignore: Arc<dyn IgnorePolicy>,
    naming: NamingConventions,
    log: JobLogger,
    snapshot_dir: PathBuf,
}

impl Analyzer {
    pub fn new(
        options: Options,
        ignore: Arc<dyn IgnorePolicy>,
        naming: NamingConventions,
        log: JobLogger,
        snapshot_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            options,
            ignore,
            naming,
            log,
            snapshot_dir: snapshot_dir.into(),
        }
    }

    /// Analyze `tables`, all of which must have a snapshot in the directory.
    pub fn run(&self, tables: &[TableMetadata]) -> Result<AnalysisOutcome, AnalysisError> {
        let classifier = KeyClassifier::new(self.ignore.as_ref(), &self.naming);
        let mut outcome = AnalysisOutcome::default();

        let mut parent_keys = Vec::with_capacity(tables.len());
        for table in tables {
            let mut keys = classifier.parent_keys(table);
            if self.options.verify_candidate_keys {
                self.verify_candidate_keys(table, &mut keys)?;
            }
            if keys.is_empty() {
                self.log
                    .info(format!("{} has no primary, unique or candidate key", table.full_name()));
                outcome.tables_without_keys.push(table.table_ref());
            }
            parent_keys.push(keys);
        }

        for child in tables {
            let child_path = snapshot_path(&self.snapshot_dir, &child.table_ref());
            let columns = classifier.child_columns(child);
            if columns.is_empty() {
                continue;
            }

            // (child column, parent table, parent key) positions restore output order
            let mut found = Vec::new();

            for (parent_idx, (parent, keys)) in tables.iter().zip(&parent_keys).enumerate() {
                if parent.is_same_table(child) {
                    continue;
                }

                for (key_idx, key) in keys.iter().enumerate() {
                    let pairs: Vec<(usize, &ColumnInfo)> = columns
                        .iter()
                        .enumerate()
                        .filter(|(_, column)| {
                            !child.has_foreign_key(&column.name, &parent.schema, &parent.name)
                                && is_type_compatible(column, &key.column)
                        })
                        .map(|(idx, column)| (idx, *column))
                        .collect();
                    if pairs.is_empty() {
                        continue;
                    }

                    // One parent set in memory at a time, shared by the child's columns.
                    let parent_path = snapshot_path(&self.snapshot_dir, &parent.table_ref());
                    let values = ParentValues::load(
                        &parent_path,
                        &key.column.name,
                        self.options.include_nulls_in_match,
                    )
                    .map_err(|source| AnalysisError {
                        table: parent.table_ref(),
                        source,
                    })?;

                    for (column_idx, column) in pairs {
                        let stats = match_column(&child_path, &column.name, &values).map_err(
                            |source| AnalysisError {
                                table: child.table_ref(),
                                source,
                            },
                        )?;
                        outcome.pairs_evaluated += 1;

                        tracing::debug!(
                            child = %child.full_name(),
                            column = %column.name,
                            parent = %parent.full_name(),
                            key = %key.column.name,
                            ratio = stats.match_ratio(),
                            "evaluated pair"
                        );

                        if let Some(candidate) =
                            build_candidate(child, column, parent, key, &stats, &self.options)
                        {
                            found.push(((column_idx, parent_idx, key_idx), candidate));
                        }
                    }
                }
            }

            found.sort_by_key(|(position, _)| *position);
            for (_, candidate) in found {
                self.log.info(format!(
                    "Candidate {}.{} -> {}.{} ratio={:.4} {}",
                    candidate.child_table.full_name(),
                    candidate.child_columns.join(","),
                    candidate.parent_table.full_name(),
                    candidate.parent_columns.join(","),
                    candidate.match_ratio,
                    candidate.confidence
                ));
                outcome.candidates.push(candidate);
            }
        }

        Ok(outcome)
    }

    fn verify_candidate_keys(
        &self,
        table: &TableMetadata,
        keys: &mut Vec<ParentKeyCandidate>,
    ) -> Result<(), AnalysisError> {
        let path = snapshot_path(&self.snapshot_dir, &table.table_ref());
        let mut verified = Vec::with_capacity(keys.len());

        for mut key in keys.drain(..) {
            if key.key_type.is_declared() {
                verified.push(key);
                continue;
            }

            let uniqueness =
                column_uniqueness(&path, &key.column.name).map_err(|source| AnalysisError {
                    table: table.table_ref(),
                    source,
                })?;
            if uniqueness < self.options.min_key_uniqueness {
                self.log.info(format!(
                    "Dropped candidate key {}.{} (uniqueness {:.4})",
                    table.full_name(),
                    key.column.name,
                    uniqueness
                ));
                continue;
            }
            key.uniqueness_ratio = uniqueness;
            verified.push(key);
        }

        *keys = verified;
        Ok(())
    }
}
