//! Snapshot column reader.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecordsIntoIter};

use super::SnapshotError;

/// Streams the values of one column of a snapshot, in file order.
///
/// The column is located by header name, ignoring surrounding whitespace.
/// An exact match wins; otherwise the first match ignoring case is used.
/// Values are returned exactly as stored.
pub struct ColumnValues {
    path: PathBuf,
    records: StringRecordsIntoIter<File>,
    index: usize,
}

impl ColumnValues {
    pub fn open(path: &Path, column: &str) -> Result<Self, SnapshotError> {
        let file = File::open(path).map_err(|e| SnapshotError::io(path, e))?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(false)
            .from_reader(file);

        let headers = reader.headers().map_err(|e| SnapshotError::csv(path, e))?;
        let index = headers
            .iter()
            .position(|h| h.trim() == column)
            .or_else(|| headers.iter().position(|h| h.trim().eq_ignore_ascii_case(column)))
            .ok_or_else(|| SnapshotError::MissingColumn {
                path: path.to_path_buf(),
                column: column.to_string(),
            })?;

        Ok(Self {
            path: path.to_path_buf(),
            records: reader.into_records(),
            index,
        })
    }
}

impl Iterator for ColumnValues {
    type Item = Result<String, SnapshotError>;

    fn next(&mut self) -> Option<Self::Item> {
        let record = self.records.next()?;
        Some(
            record
                .map(|r| r.get(self.index).unwrap_or_default().to_string())
                .map_err(|e| SnapshotError::csv(&self.path, e)),
        )
    }
}
