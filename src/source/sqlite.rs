//! SQLite query executor.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OpenFlags};

use super::error::{SourceError, SourceResult};
use super::executor::{QueryExecutor, QueryResult};

/// [`QueryExecutor`] over a SQLite database file.
///
/// Each query opens its own read-only connection on the blocking pool, so
/// concurrent extraction tasks never share a connection.
#[derive(Debug, Clone)]
pub struct SqliteExecutor {
    path: PathBuf,
}

impl SqliteExecutor {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn open(path: &Path) -> SourceResult<Connection> {
        Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| SourceError::ConnectionFailed(format!("{}: {}", path.display(), e)))
    }

    fn run(path: &Path, sql: &str) -> SourceResult<QueryResult> {
        let conn = Self::open(path)?;
        let mut stmt = conn.prepare(sql)?;
        let columns: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let width = columns.len();

        let mut rows = Vec::new();
        let mut cursor = stmt.query([])?;
        while let Some(row) = cursor.next()? {
            let mut values = Vec::with_capacity(width);
            for idx in 0..width {
                values.push(render_value(row.get_ref(idx)?));
            }
            rows.push(values);
        }

        Ok(QueryResult::new(columns, rows))
    }
}

/// Render a SQLite value as text. NULL becomes `None`, blobs become lowercase hex.
fn render_value(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        ValueRef::Blob(bytes) => Some(bytes.iter().map(|b| format!("{b:02x}")).collect()),
    }
}

#[async_trait]
impl QueryExecutor for SqliteExecutor {
    async fn execute_query(&self, sql: &str) -> SourceResult<QueryResult> {
        let path = self.path.clone();
        let sql = sql.to_string();
        tokio::task::spawn_blocking(move || Self::run(&path, &sql)).await?
    }
}
