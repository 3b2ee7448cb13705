//! Parallel table extraction.
//!
//! Every qualifying table is exported to its own snapshot. Tables run as
//! separate tasks; a semaphore caps how many are talking to the source at
//! once. The first failure aborts the remaining tasks.

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;

use super::{snapshot_path, SnapshotError, SnapshotWriter};
use crate::joblog::JobLogger;
use crate::model::{TableMetadata, TableRef};
use crate::source::{
    render_table_statement, QueryExecutor, SourceError, SqlTranslator, EXPORT_TABLE_STATEMENT,
};

/// Errors raised during extraction.
#[derive(Debug, Error)]
pub enum ExtractError {
    #[error("failed to resolve extraction statement: {0}")]
    Statement(#[source] SourceError),

    #[error("failed to extract {table}: {source}")]
    Query {
        table: TableRef,
        #[source]
        source: SourceError,
    },

    #[error("query for {table} returned {actual} columns, expected {expected}")]
    ColumnMismatch {
        table: TableRef,
        expected: usize,
        actual: usize,
    },

    #[error("failed to write snapshot for {table}: {source}")]
    Write {
        table: TableRef,
        #[source]
        source: SnapshotError,
    },

    #[error("extraction task failed: {0}")]
    Task(String),
}

/// A table written to disk.
#[derive(Debug, Clone, PartialEq)]
pub struct ExtractedTable {
    pub table: TableRef,
    pub path: PathBuf,
    pub rows: u64,
}

/// Exports tables to snapshots with bounded parallelism.
pub struct Extractor {
    executor: Arc<dyn QueryExecutor>,
    translator: Arc<dyn SqlTranslator>,
    log: JobLogger,
    output_dir: PathBuf,
    max_parallel: usize,
}

impl Extractor {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        translator: Arc<dyn SqlTranslator>,
        log: JobLogger,
        output_dir: impl Into<PathBuf>,
        max_parallel: usize,
    ) -> Self {
        Self {
            executor,
            translator,
            log,
            output_dir: output_dir.into(),
            max_parallel: max_parallel.max(1),
        }
    }

    /// Extract every table, returning the snapshots in input order.
    pub async fn extract_all(
        &self,
        tables: &[TableMetadata],
    ) -> Result<Vec<ExtractedTable>, ExtractError> {
        let template = self
            .translator
            .translated_statement(EXPORT_TABLE_STATEMENT)
            .await
            .map_err(ExtractError::Statement)?;
        let dialect = self.translator.dialect();

        let total = tables.len();
        let semaphore = Arc::new(Semaphore::new(self.max_parallel));
        let completed = Arc::new(AtomicUsize::new(0));
        let mut set = JoinSet::new();

        for (index, table) in tables.iter().enumerate() {
            let semaphore = semaphore.clone();
            let completed = completed.clone();
            let executor = self.executor.clone();
            let log = self.log.clone();
            let sql = render_table_statement(&template, dialect, &table.schema, &table.name);
            let table_ref = table.table_ref();
            let path = snapshot_path(&self.output_dir, &table_ref);
            let columns: Vec<String> = table.columns.iter().map(|c| c.name.clone()).collect();

            set.spawn(async move {
                let _permit = semaphore
                    .acquire_owned()
                    .await
                    .map_err(|e| ExtractError::Task(e.to_string()))?;

                tracing::debug!(table = %table_ref, %sql, "extracting table");
                let extracted =
                    extract_table(executor.as_ref(), &sql, table_ref, columns, path).await?;

                let done = completed.fetch_add(1, Ordering::SeqCst) + 1;
                log.info(format!(
                    "Extracted {done}/{total} {} ({} rows)",
                    extracted.table, extracted.rows
                ));
                Ok::<_, ExtractError>((index, extracted))
            });
        }

        let mut extracted = Vec::with_capacity(total);
        while let Some(joined) = set.join_next().await {
            let outcome = joined
                .map_err(|e| ExtractError::Task(e.to_string()))
                .and_then(|r| r);
            match outcome {
                Ok(item) => extracted.push(item),
                Err(err) => {
                    set.abort_all();
                    return Err(err);
                }
            }
        }

        extracted.sort_by_key(|(index, _)| *index);
        Ok(extracted.into_iter().map(|(_, table)| table).collect())
    }
}

async fn extract_table(
    executor: &dyn QueryExecutor,
    sql: &str,
    table: TableRef,
    columns: Vec<String>,
    path: PathBuf,
) -> Result<ExtractedTable, ExtractError> {
    let result = executor
        .execute_query(sql)
        .await
        .map_err(|source| ExtractError::Query {
            table: table.clone(),
            source,
        })?;

    let header = if columns.is_empty() {
        result.columns.clone()
    } else {
        columns
    };
    if !result.columns.is_empty() && result.columns.len() != header.len() {
        return Err(ExtractError::ColumnMismatch {
            table,
            expected: header.len(),
            actual: result.columns.len(),
        });
    }

    let target = path.clone();
    let rows = tokio::task::spawn_blocking(move || {
        let mut writer = SnapshotWriter::create(&target, &header)?;
        for row in &result.rows {
            writer.write_row(row)?;
        }
        writer.finish()
    })
    .await
    .map_err(|e| ExtractError::Task(e.to_string()))?
    .map_err(|source| ExtractError::Write {
        table: table.clone(),
        source,
    })?;

    Ok(ExtractedTable { table, path, rows })
}
