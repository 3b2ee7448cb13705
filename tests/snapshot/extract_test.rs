use std::collections::HashMap;
use std::fs;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use fkscan::joblog::{JobLogger, MemoryJobLog};
use fkscan::model::{ColumnInfo, TableMetadata};
use fkscan::snapshot::{ExtractError, Extractor};
use fkscan::source::{
    Dialect, QueryExecutor, QueryResult, SourceError, SourceResult, StatementCatalog,
};

/// Executor serving canned results keyed by SQL text, recording how many
/// queries were in flight at once.
#[derive(Default)]
struct RecordingSource {
    results: HashMap<String, QueryResult>,
    delay: Duration,
    active: AtomicUsize,
    peak: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl RecordingSource {
    fn with_result(mut self, sql: &str, result: QueryResult) -> Self {
        self.results.insert(sql.to_string(), result);
        self
    }

    fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

#[async_trait]
impl QueryExecutor for RecordingSource {
    async fn execute_query(&self, sql: &str) -> SourceResult<QueryResult> {
        let now = self.active.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak.fetch_max(now, Ordering::SeqCst);
        self.queries.lock().unwrap().push(sql.to_string());

        tokio::time::sleep(self.delay).await;

        self.active.fetch_sub(1, Ordering::SeqCst);
        self.results
            .get(sql)
            .cloned()
            .ok_or_else(|| SourceError::QueryFailed(format!("unknown statement: {sql}")))
    }
}

fn table(schema: &str, name: &str, columns: &[&str]) -> TableMetadata {
    TableMetadata {
        schema: schema.to_string(),
        name: name.to_string(),
        row_count: 1000,
        columns: columns
            .iter()
            .map(|c| ColumnInfo::new(*c, "INTEGER"))
            .collect(),
        ..Default::default()
    }
}

fn rows(values: &[&[Option<&str>]]) -> Vec<Vec<Option<String>>> {
    values
        .iter()
        .map(|row| row.iter().map(|v| v.map(str::to_string)).collect())
        .collect()
}

fn single_column(value: &str) -> QueryResult {
    QueryResult::new(vec!["ID".into()], rows(&[&[Some(value)]]))
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_parallelism_reaches_but_never_exceeds_limit() {
    let dir = tempfile::tempdir().unwrap();
    let names = ["T1", "T2", "T3", "T4", "T5"];

    let mut source = RecordingSource::default().with_delay(Duration::from_millis(100));
    for name in names {
        source = source.with_result(&format!("SELECT * FROM S.{name}"), single_column("1"));
    }
    let source = Arc::new(source);
    let tables: Vec<_> = names.iter().map(|n| table("S", n, &["ID"])).collect();

    let log = Arc::new(MemoryJobLog::new());
    let extractor = Extractor::new(
        source.clone(),
        Arc::new(StatementCatalog::ansi(Dialect::Ansi)),
        JobLogger::new(log.clone()),
        dir.path(),
        2,
    );

    let extracted = extractor.extract_all(&tables).await.unwrap();

    assert_eq!(extracted.len(), 5);
    let peak = source.peak.load(Ordering::SeqCst);
    assert_eq!(peak, 2, "expected exactly two extractions in flight");

    // returned in input order regardless of completion order
    let order: Vec<_> = extracted.iter().map(|t| t.table.name.clone()).collect();
    assert_eq!(order, names);

    let progress: Vec<_> = log
        .lines()
        .into_iter()
        .filter(|l| l.contains("Extracted"))
        .collect();
    assert_eq!(progress.len(), 5);
    assert!(progress.iter().any(|l| l.contains("Extracted 5/5")));
}

#[tokio::test]
async fn test_snapshot_contents() {
    let dir = tempfile::tempdir().unwrap();
    let result = QueryResult::new(
        vec!["ID".into(), "NAME".into(), "CUSTOMER_ID".into()],
        rows(&[
            &[Some("1"), Some("Smith, J"), Some("10")],
            &[Some("2"), Some("O\"Brien"), None],
        ]),
    );
    let source = RecordingSource::default().with_result("SELECT * FROM SALES.ORDERS", result);

    let extractor = Extractor::new(
        Arc::new(source),
        Arc::new(StatementCatalog::ansi(Dialect::Ansi)),
        JobLogger::new(Arc::new(MemoryJobLog::new())),
        dir.path(),
        4,
    );
    let tables = vec![table("SALES", "ORDERS", &["ID", "NAME", "CUSTOMER_ID"])];
    let extracted = extractor.extract_all(&tables).await.unwrap();

    assert_eq!(extracted[0].rows, 2);
    assert_eq!(extracted[0].path, dir.path().join("SALES.ORDERS.csv"));
    let content = fs::read_to_string(&extracted[0].path).unwrap();
    assert_eq!(
        content,
        "ID,NAME,CUSTOMER_ID\n1,\"Smith, J\",10\n2,\"O\"\"Brien\",\n"
    );
}

#[tokio::test]
async fn test_identifiers_are_quoted_for_dialect() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(
        RecordingSource::default()
            .with_result("SELECT * FROM [dbo].[Order Lines]", single_column("1")),
    );

    let extractor = Extractor::new(
        source.clone(),
        Arc::new(StatementCatalog::ansi(Dialect::SqlServer)),
        JobLogger::new(Arc::new(MemoryJobLog::new())),
        dir.path(),
        1,
    );
    extractor
        .extract_all(&[table("dbo", "Order Lines", &["ID"])])
        .await
        .unwrap();

    assert_eq!(
        *source.queries.lock().unwrap(),
        vec!["SELECT * FROM [dbo].[Order Lines]".to_string()]
    );
}

#[tokio::test]
async fn test_custom_statement_template() {
    let dir = tempfile::tempdir().unwrap();
    let sql = "SELECT * FROM S.T FETCH FIRST 100000 ROWS ONLY";
    let source = Arc::new(RecordingSource::default().with_result(sql, single_column("7")));
    let catalog = StatementCatalog::ansi(Dialect::Db2).with_statement(
        "GetTableDataForExport",
        "SELECT * FROM {SCHEMA}.{TABLE} FETCH FIRST 100000 ROWS ONLY",
    );

    let extractor = Extractor::new(
        source,
        Arc::new(catalog),
        JobLogger::new(Arc::new(MemoryJobLog::new())),
        dir.path(),
        1,
    );
    let extracted = extractor.extract_all(&[table("S", "T", &["ID"])]).await.unwrap();
    assert_eq!(extracted[0].rows, 1);
}

#[tokio::test]
async fn test_query_failure_aborts_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let source = RecordingSource::default().with_result("SELECT * FROM S.GOOD", single_column("1"));

    let extractor = Extractor::new(
        Arc::new(source),
        Arc::new(StatementCatalog::ansi(Dialect::Ansi)),
        JobLogger::new(Arc::new(MemoryJobLog::new())),
        dir.path(),
        2,
    );
    let tables = vec![table("S", "GOOD", &["ID"]), table("S", "MISSING", &["ID"])];

    let err = extractor.extract_all(&tables).await.unwrap_err();
    match err {
        ExtractError::Query { table, .. } => assert_eq!(table.full_name(), "S.MISSING"),
        other => panic!("unexpected error: {other}"),
    }
}

#[tokio::test]
async fn test_result_width_must_match_metadata() {
    let dir = tempfile::tempdir().unwrap();
    let source = RecordingSource::default().with_result(
        "SELECT * FROM S.T",
        QueryResult::new(vec!["ID".into()], rows(&[&[Some("1")]])),
    );

    let extractor = Extractor::new(
        Arc::new(source),
        Arc::new(StatementCatalog::ansi(Dialect::Ansi)),
        JobLogger::new(Arc::new(MemoryJobLog::new())),
        dir.path(),
        1,
    );
    let err = extractor
        .extract_all(&[table("S", "T", &["ID", "NAME"])])
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExtractError::ColumnMismatch {
            expected: 2,
            actual: 1,
            ..
        }
    ));
}
