//! Table snapshots.
//!
//! A snapshot is a point-in-time CSV export of one table, written to the job's
//! output directory and used as the substrate for matching instead of live
//! queries. Snapshots are scratch artifacts: they stay on disk after the job
//! for post-hoc debugging and are never cleaned up automatically.
//!
//! Format: UTF-8, comma delimited, first line holds the column names, one line
//! per source row. Fields containing a comma, quote or line break are quoted
//! and embedded quotes are doubled. NULL is written as an empty field.

mod extract;
mod reader;
mod writer;

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::model::TableRef;

pub use extract::{ExtractError, ExtractedTable, Extractor};
pub use reader::ColumnValues;
pub use writer::SnapshotWriter;

/// Errors raised while writing or reading snapshot files.
#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("snapshot I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed snapshot {path}: {source}")]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("snapshot {path} has no column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    #[error("row {row} of {path} has {actual} fields, expected {expected}")]
    RowWidth {
        path: PathBuf,
        row: u64,
        expected: usize,
        actual: usize,
    },
}

impl SnapshotError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Deterministic snapshot file name for a table: `{schema}.{table}.csv`
/// with characters that are invalid in file names replaced by `_`.
pub fn snapshot_file_name(table: &TableRef) -> String {
    format!("{}.{}.csv", table.schema, table.name)
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

/// Path of a table's snapshot inside `dir`.
pub fn snapshot_path(dir: &Path, table: &TableRef) -> PathBuf {
    dir.join(snapshot_file_name(table))
}
