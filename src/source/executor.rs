//! QueryExecutor trait definition.

use async_trait::async_trait;

use super::error::SourceResult;

/// A fully materialized query result.
///
/// Values are rendered as text; `None` is a database NULL.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryResult {
    /// Result column names, in select order.
    pub columns: Vec<String>,
    /// Rows, each with one value per column.
    pub rows: Vec<Vec<Option<String>>>,
}

impl QueryResult {
    pub fn new(columns: Vec<String>, rows: Vec<Vec<Option<String>>>) -> Self {
        Self { columns, rows }
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Executes SQL against the source database.
///
/// The engine treats the executor as a black box and assumes nothing about
/// the dialect. Extraction issues up to `max_parallel_tables` queries at
/// once, so implementations must accept concurrent calls (for example by
/// opening one connection per query).
#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Run a query and return all of its rows.
    async fn execute_query(&self, sql: &str) -> SourceResult<QueryResult>;
}
