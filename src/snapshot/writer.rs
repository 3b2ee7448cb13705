//! Snapshot file writer.

use std::fs::File;
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, WriterBuilder};

use super::SnapshotError;

/// Streams rows into a snapshot file.
///
/// The header fixes the row width; every row must have exactly one value per
/// header column.
pub struct SnapshotWriter {
    path: PathBuf,
    writer: csv::Writer<File>,
    width: usize,
    rows: u64,
}

impl SnapshotWriter {
    /// Create (or truncate) the snapshot file and write its header.
    pub fn create<S: AsRef<str>>(path: &Path, header: &[S]) -> Result<Self, SnapshotError> {
        let file = File::create(path).map_err(|e| SnapshotError::io(path, e))?;
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Necessary)
            .from_writer(file);

        writer
            .write_record(header.iter().map(|h| h.as_ref()))
            .map_err(|e| SnapshotError::csv(path, e))?;

        Ok(Self {
            path: path.to_path_buf(),
            writer,
            width: header.len(),
            rows: 0,
        })
    }

    /// Write one row. `None` is written as an empty field.
    pub fn write_row(&mut self, row: &[Option<String>]) -> Result<(), SnapshotError> {
        if row.len() != self.width {
            return Err(SnapshotError::RowWidth {
                path: self.path.clone(),
                row: self.rows + 1,
                expected: self.width,
                actual: row.len(),
            });
        }

        self.writer
            .write_record(row.iter().map(|v| v.as_deref().unwrap_or("")))
            .map_err(|e| SnapshotError::csv(&self.path, e))?;
        self.rows += 1;
        Ok(())
    }

    /// Flush the file and return the number of data rows written.
    pub fn finish(mut self) -> Result<u64, SnapshotError> {
        self.writer
            .flush()
            .map_err(|e| SnapshotError::io(&self.path, e))?;
        Ok(self.rows)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}
