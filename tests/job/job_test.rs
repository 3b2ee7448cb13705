use std::collections::HashMap;
use std::fs;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use fkscan::ignore::{IgnoreDocument, IgnoreRules};
use fkscan::job::{JobState, ScanError, ScanJob, RESULTS_FILE};
use fkscan::joblog::{read_job_status, JobStatus, MemoryJobLog, JOB_LOG_FILE, SENTINEL_PREFIX};
use fkscan::model::{ColumnInfo, JobInput, Options, ResultsModel, TableMetadata};
use fkscan::source::{
    Dialect, QueryExecutor, QueryResult, SourceError, SourceResult, StatementCatalog,
};

/// In-memory source keyed by ANSI `SELECT * FROM schema.table`.
#[derive(Default)]
struct FakeSource {
    tables: HashMap<String, QueryResult>,
    queries: Mutex<Vec<String>>,
}

impl FakeSource {
    fn with_table(mut self, name: &str, columns: &[&str], rows: Vec<Vec<u32>>) -> Self {
        let rows = rows
            .into_iter()
            .map(|r| r.into_iter().map(|v| Some(v.to_string())).collect())
            .collect();
        self.tables.insert(
            format!("SELECT * FROM SALES.{name}"),
            QueryResult::new(columns.iter().map(|c| c.to_string()).collect(), rows),
        );
        self
    }

    fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl QueryExecutor for FakeSource {
    async fn execute_query(&self, sql: &str) -> SourceResult<QueryResult> {
        self.queries.lock().unwrap().push(sql.to_string());
        self.tables
            .get(sql)
            .cloned()
            .ok_or_else(|| SourceError::QueryFailed(format!("SQL0204N {sql} is an undefined name")))
    }
}

fn table(name: &str, row_count: u64, columns: &[&str], primary_key: &[&str]) -> TableMetadata {
    TableMetadata {
        schema: "SALES".to_string(),
        name: name.to_string(),
        row_count,
        columns: columns
            .iter()
            .map(|c| ColumnInfo::new(*c, "INTEGER"))
            .collect(),
        primary_key: primary_key.iter().map(|c| c.to_string()).collect(),
        ..Default::default()
    }
}

fn source() -> FakeSource {
    FakeSource::default()
        .with_table("CUSTOMERS", &["ID"], (1..=200).map(|i| vec![i]).collect())
        .with_table(
            "ORDERS",
            &["ID", "CUSTOMER_ID"],
            (1..=500).map(|i| vec![i, i % 200 + 1]).collect(),
        )
}

fn input() -> JobInput {
    JobInput {
        job_id: "job-42".to_string(),
        provider: "DB2".to_string(),
        provider_version: "11.5".to_string(),
        options: Options::default(),
        tables: vec![
            table("CUSTOMERS", 200, &["ID"], &["ID"]),
            table("ORDERS", 500, &["ID", "CUSTOMER_ID"], &["ID"]),
        ],
        ..Default::default()
    }
}

fn job(source: Arc<FakeSource>, dir: &std::path::Path) -> ScanJob {
    ScanJob::new(source, Arc::new(StatementCatalog::ansi(Dialect::Ansi)), dir)
}

#[tokio::test]
async fn test_successful_job_writes_results_and_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("job-42");
    let mut job = job(Arc::new(source()), &out);

    let results = job.execute(input()).await.unwrap();

    assert_eq!(job.state(), JobState::Succeeded);
    assert_eq!(results.job_id, "job-42");
    assert_eq!(results.summary.tables_scanned, 2);
    assert_eq!(results.summary.candidates_found, 1);
    assert_eq!(results.summary.strong_candidates, 1);

    let written: ResultsModel =
        serde_json::from_str(&fs::read_to_string(out.join(RESULTS_FILE)).unwrap()).unwrap();
    assert_eq!(written, results);

    assert!(out.join("SALES.CUSTOMERS.csv").exists());
    assert!(out.join("SALES.ORDERS.csv").exists());

    let log = fs::read_to_string(out.join(JOB_LOG_FILE)).unwrap();
    let last = log.lines().last().unwrap();
    assert!(last.starts_with(&format!("{SENTINEL_PREFIX} STATUS=SUCCESS CANDIDATES=1 DURATION=")));
    assert!(log.contains("---- Job summary ----"));

    match read_job_status(&out.join(JOB_LOG_FILE)).unwrap() {
        JobStatus::Succeeded { candidates, .. } => assert_eq!(candidates, 1),
        other => panic!("unexpected status {other:?}"),
    }
}

#[tokio::test]
async fn test_results_document_uses_camel_case() {
    let dir = tempfile::tempdir().unwrap();
    let mut job = job(Arc::new(source()), dir.path());
    job.execute(input()).await.unwrap();

    let doc: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join(RESULTS_FILE)).unwrap()).unwrap();

    assert_eq!(doc["jobId"], "job-42");
    assert!(doc["completedAt"].is_string());
    assert_eq!(doc["summary"]["tablesScanned"], 2);
    assert_eq!(doc["summary"]["candidatesFound"], 1);
    assert_eq!(doc["summary"]["strongCandidates"], 1);
    assert_eq!(doc["summary"]["tablesWithoutKeys"], 0);

    let candidate = &doc["candidates"][0];
    assert_eq!(candidate["childTable"]["name"], "ORDERS");
    assert_eq!(candidate["childColumns"][0], "CUSTOMER_ID");
    assert_eq!(candidate["parentTable"]["name"], "CUSTOMERS");
    assert_eq!(candidate["parentColumns"][0], "ID");
    assert_eq!(candidate["parentKeyType"], "PRIMARY_KEY");
    assert_eq!(candidate["matchRatio"], 1.0);
    assert_eq!(candidate["evidence"]["missingInParent"], 0);
    assert_eq!(candidate["confidence"], "STRONG");
    assert_eq!(candidate["recommendation"], "ADD_FK");
}

#[tokio::test]
async fn test_invalid_options_fail_before_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(source());
    let log = Arc::new(MemoryJobLog::new());
    let mut job = job(source.clone(), dir.path()).with_log(log.clone());

    let mut bad = input();
    bad.options.min_match_ratio = 0.99;
    bad.options.strong_match_ratio = 0.95;

    let err = job.execute(bad).await.unwrap_err();
    assert!(matches!(err, ScanError::Configuration(_)));
    assert_eq!(job.state(), JobState::Failed);
    assert!(source.queries().is_empty());

    let lines = log.lines();
    let last = lines.last().unwrap();
    assert!(last.starts_with(&format!("{SENTINEL_PREFIX} STATUS=ERROR MESSAGE=invalid\\sjob")));
    assert!(!dir.path().join(RESULTS_FILE).exists());
}

#[tokio::test]
async fn test_duplicate_tables_fail_before_extraction() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(source());
    let mut job = job(source.clone(), dir.path());

    let mut twice = input();
    twice.tables.push(table("ORDERS", 500, &["ID", "CUSTOMER_ID"], &["ID"]));

    let err = job.execute(twice).await.unwrap_err();
    assert!(matches!(err, ScanError::Configuration(_)));
    assert!(source.queries().is_empty());

    match read_job_status(&dir.path().join(JOB_LOG_FILE)).unwrap() {
        JobStatus::Failed { message } => {
            assert!(message.contains("SALES.ORDERS is listed more than once"), "message: {message}")
        }
        other => panic!("unexpected status {other:?}"),
    }
}

#[tokio::test]
async fn test_invalid_input_is_reported_before_output_problems() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let mut bad = input();
    bad.options.max_parallel_tables = 0;

    let mut job = job(Arc::new(source()), &blocker.join("job"));
    let err = job.execute(bad).await.unwrap_err();

    assert!(err.to_string().contains("maxParallelTables"), "error: {err}");
    assert_eq!(job.state(), JobState::Failed);
}

#[tokio::test]
async fn test_query_failure_writes_error_sentinel() {
    let dir = tempfile::tempdir().unwrap();
    let mut job = job(Arc::new(source()), dir.path());

    let mut with_missing = input();
    with_missing
        .tables
        .push(table("RETURNS", 300, &["ID", "ORDER_ID"], &["ID"]));

    let err = job.execute(with_missing).await.unwrap_err();
    assert!(matches!(err, ScanError::Extraction(_)));
    assert_eq!(job.state(), JobState::Failed);

    match read_job_status(&dir.path().join(JOB_LOG_FILE)).unwrap() {
        JobStatus::Failed { message } => {
            assert!(message.contains("SALES.RETURNS"), "message: {message}");
            assert!(message.contains("SQL0204N"));
        }
        other => panic!("unexpected status {other:?}"),
    }

    let log = fs::read_to_string(dir.path().join(JOB_LOG_FILE)).unwrap();
    assert!(log.contains("caused by: query failed"));
}

#[tokio::test]
async fn test_small_and_ignored_tables_are_not_extracted() {
    let dir = tempfile::tempdir().unwrap();
    let source = Arc::new(source());

    let doc: IgnoreDocument =
        serde_json::from_str(r#"{"ignoreTables": [{"schema": "*", "name": "AUDIT*"}]}"#).unwrap();
    let mut job = job(source.clone(), dir.path())
        .with_ignore(Arc::new(IgnoreRules::from_document(&doc).unwrap()));

    let mut tables = input();
    tables.tables.push(table("AUDIT_LOG", 10_000, &["ID"], &["ID"]));
    tables.tables.push(table("TINY", 3, &["ID"], &["ID"]));

    let results = job.execute(tables).await.unwrap();
    assert_eq!(results.summary.tables_scanned, 2);
    assert_eq!(
        source.queries().len(),
        2,
        "only qualifying tables are queried"
    );
    assert!(!dir.path().join("SALES.AUDIT_LOG.csv").exists());
    assert!(!dir.path().join("SALES.TINY.csv").exists());

    let log = fs::read_to_string(dir.path().join(JOB_LOG_FILE)).unwrap();
    assert!(log.contains("Skipping SALES.AUDIT_LOG: ignored"));
    assert!(log.contains("Skipping SALES.TINY: 3 rows, minimum 100"));
}

#[tokio::test]
async fn test_all_tables_filtered_is_an_empty_success() {
    let dir = tempfile::tempdir().unwrap();
    let mut job = job(Arc::new(source()), dir.path());

    let mut everything_small = input();
    everything_small.options.min_row_count = 1_000_000;

    let results = job.execute(everything_small).await.unwrap();
    assert_eq!(results.summary.tables_scanned, 0);
    assert!(results.candidates.is_empty());
    assert!(matches!(
        read_job_status(&dir.path().join(JOB_LOG_FILE)).unwrap(),
        JobStatus::Succeeded { candidates: 0, .. }
    ));
}

#[tokio::test]
async fn test_empty_job_id_is_generated() {
    let dir = tempfile::tempdir().unwrap();
    let mut job = job(Arc::new(source()), dir.path());

    let mut anonymous = input();
    anonymous.job_id = String::new();

    let results = job.execute(anonymous).await.unwrap();
    assert!(uuid::Uuid::parse_str(&results.job_id).is_ok());
}

#[tokio::test]
async fn test_unusable_output_directory() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let mut job = job(Arc::new(source()), &blocker.join("job"));
    let err = job.execute(input()).await.unwrap_err();

    assert!(matches!(err, ScanError::Configuration(_)));
    assert_eq!(job.state(), JobState::Failed);
}

#[tokio::test]
async fn test_job_is_single_use() {
    let dir = tempfile::tempdir().unwrap();
    let mut job = job(Arc::new(source()), dir.path());

    job.execute(input()).await.unwrap();
    let err = job.execute(input()).await.unwrap_err();
    assert!(matches!(err, ScanError::Configuration(_)));
    assert_eq!(job.state(), JobState::Succeeded);
}

#[tokio::test]
async fn test_injected_log_receives_every_line() {
    let dir = tempfile::tempdir().unwrap();
    let log = Arc::new(MemoryJobLog::new());
    let mut job = job(Arc::new(source()), dir.path()).with_log(log.clone());

    job.execute(input()).await.unwrap();

    let lines = log.lines();
    assert!(lines[0].contains("Job job-42 started: 2 tables, provider DB2 11.5"));
    assert!(lines.iter().any(|l| l.contains("Candidate SALES.ORDERS.CUSTOMER_ID -> SALES.CUSTOMERS.ID")));
    assert!(lines.iter().any(|l| l == "Candidates found:    1"));
    assert_eq!(
        lines
            .iter()
            .filter(|l| l.starts_with(SENTINEL_PREFIX))
            .count(),
        1
    );
    assert!(!dir.path().join(JOB_LOG_FILE).exists());
}
