//! Scan job orchestration.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, SecondsFormat, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use super::error::ScanError;
use super::state::JobState;
use crate::discovery::{Analyzer, NamingConventions};
use crate::ignore::{IgnorePolicy, NoIgnore};
use crate::joblog::{FileJobLog, JobLog, JobLogger, Sentinel};
use crate::model::{JobInput, Options, ResultsModel, TableMetadata, TableRef};
use crate::snapshot::{snapshot_file_name, Extractor};
use crate::source::{QueryExecutor, SqlTranslator};

/// File name of the results document inside the output directory.
pub const RESULTS_FILE: &str = "missing_fk_results.json";

/// One run of the discovery pipeline against one output directory.
///
/// A job is single use: it moves through [`JobState`] once and ends in
/// `Succeeded` or `Failed`.
pub struct ScanJob {
    executor: Arc<dyn QueryExecutor>,
    translator: Arc<dyn SqlTranslator>,
    ignore: Arc<dyn IgnorePolicy>,
    naming: NamingConventions,
    log: Option<Arc<dyn JobLog>>,
    output_dir: PathBuf,
    state: JobState,
}

impl ScanJob {
    pub fn new(
        executor: Arc<dyn QueryExecutor>,
        translator: Arc<dyn SqlTranslator>,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            executor,
            translator,
            ignore: Arc::new(NoIgnore),
            naming: NamingConventions::default(),
            log: None,
            output_dir: output_dir.into(),
            state: JobState::Initialized,
        }
    }

    pub fn with_ignore(mut self, ignore: Arc<dyn IgnorePolicy>) -> Self {
        self.ignore = ignore;
        self
    }

    pub fn with_naming(mut self, naming: NamingConventions) -> Self {
        self.naming = naming;
        self
    }

    /// Write the job log to `log` instead of `missing_fk_job.log`.
    pub fn with_log(mut self, log: Arc<dyn JobLog>) -> Self {
        self.log = Some(log);
        self
    }

    pub fn state(&self) -> JobState {
        self.state
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Run the job to completion.
    ///
    /// Input is validated before any I/O. Whatever the outcome, the job log
    /// ends with a sentinel line once the log itself could be opened.
    pub async fn execute(&mut self, input: JobInput) -> Result<ResultsModel, ScanError> {
        if self.state != JobState::Initialized {
            return Err(ScanError::Configuration(format!(
                "job already {}",
                self.state
            )));
        }

        let started_at = Utc::now();
        let clock = Instant::now();
        let job_id = if input.job_id.trim().is_empty() {
            Uuid::new_v4().to_string()
        } else {
            input.job_id.clone()
        };

        let validated = validate_input(&input);

        let logger = match self.open_log().await {
            Ok(logger) => logger,
            Err(err) => {
                let err = match validated {
                    Err(invalid) => invalid,
                    Ok(()) => err,
                };
                error!(job_id = %job_id, error = %err, "failed to prepare job");
                self.state = JobState::Failed;
                return Err(err);
            }
        };

        info!(job_id = %job_id, output = %self.output_dir.display(), "scan job started");
        logger.info(format!(
            "Job {job_id} started: {} tables, provider {} {}",
            input.tables.len(),
            input.provider,
            input.provider_version
        ));

        let outcome = match validated {
            Ok(()) => self.run(&job_id, &input, &logger).await,
            Err(err) => Err(err),
        };
        let duration_ms = clock.elapsed().as_millis() as u64;

        match outcome {
            Ok(results) => {
                self.advance(JobState::Succeeded);
                write_summary(&logger, &job_id, started_at, duration_ms, Some(&results));
                self.finish(
                    &logger,
                    Sentinel::Success {
                        candidates: results.summary.candidates_found,
                        duration_ms,
                    },
                );
                info!(
                    job_id = %job_id,
                    candidates = results.summary.candidates_found,
                    duration_ms,
                    "scan job succeeded"
                );
                Ok(results)
            }
            Err(err) => {
                self.advance(JobState::Failed);
                for (depth, message) in err.chain().iter().enumerate() {
                    if depth == 0 {
                        logger.error(message);
                    } else {
                        logger.error(format!("  caused by: {message}"));
                    }
                }
                write_summary(&logger, &job_id, started_at, duration_ms, None);
                self.finish(&logger, Sentinel::error(err.to_string()));
                error!(job_id = %job_id, error = %err, "scan job failed");
                Err(err)
            }
        }
    }

    async fn run(
        &mut self,
        job_id: &str,
        input: &JobInput,
        logger: &JobLogger,
    ) -> Result<ResultsModel, ScanError> {
        let options = input.options.clone();

        let tables = self.qualifying_tables(&input.tables, &options, logger);
        logger.info(format!(
            "{} of {} tables qualify for analysis",
            tables.len(),
            input.tables.len()
        ));

        self.advance(JobState::Extracting);
        let extractor = Extractor::new(
            self.executor.clone(),
            self.translator.clone(),
            logger.clone(),
            &self.output_dir,
            options.max_parallel_tables,
        );
        let extracted = extractor.extract_all(&tables).await?;
        let rows: u64 = extracted.iter().map(|t| t.rows).sum();
        logger.info(format!("Extraction complete: {} tables, {rows} rows", extracted.len()));

        self.advance(JobState::Analyzing);
        let analyzer = Analyzer::new(
            options,
            self.ignore.clone(),
            self.naming.clone(),
            logger.clone(),
            &self.output_dir,
        );
        let scanned = tables.len();
        let outcome = tokio::task::spawn_blocking(move || analyzer.run(&tables)).await??;
        logger.info(format!(
            "Analysis complete: {} pairs evaluated, {} candidates",
            outcome.pairs_evaluated,
            outcome.candidates.len()
        ));

        let results = ResultsModel::new(
            job_id,
            scanned,
            outcome.candidates,
            outcome.tables_without_keys,
        );
        let path = self.output_dir.join(RESULTS_FILE);
        let json = serde_json::to_vec_pretty(&results)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| ScanError::Report {
                path: path.clone(),
                source,
            })?;
        logger.info(format!("Results written to {}", path.display()));
        self.advance(JobState::ReportWritten);

        Ok(results)
    }

    async fn open_log(&self) -> Result<JobLogger, ScanError> {
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(|e| {
                ScanError::Configuration(format!(
                    "cannot create output directory {}: {e}",
                    self.output_dir.display()
                ))
            })?;

        let sink: Arc<dyn JobLog> = match &self.log {
            Some(log) => log.clone(),
            None => Arc::new(FileJobLog::in_dir(&self.output_dir).map_err(|e| {
                ScanError::Configuration(format!(
                    "cannot open job log in {}: {e}",
                    self.output_dir.display()
                ))
            })?),
        };
        Ok(JobLogger::new(sink))
    }

    fn qualifying_tables(
        &self,
        tables: &[TableMetadata],
        options: &Options,
        logger: &JobLogger,
    ) -> Vec<TableMetadata> {
        tables
            .iter()
            .filter(|t| {
                if self.ignore.should_ignore_table(&t.schema, &t.name) {
                    logger.info(format!("Skipping {}: ignored", t.full_name()));
                    false
                } else if t.row_count < options.min_row_count {
                    logger.info(format!(
                        "Skipping {}: {} rows, minimum {}",
                        t.full_name(),
                        t.row_count,
                        options.min_row_count
                    ));
                    false
                } else {
                    true
                }
            })
            .cloned()
            .collect()
    }

    fn advance(&mut self, next: JobState) {
        if !self.state.can_advance_to(next) {
            warn!(from = %self.state, to = %next, "unexpected job state transition");
        }
        self.state = next;
    }

    fn finish(&self, logger: &JobLogger, sentinel: Sentinel) {
        if let Err(err) = logger.sentinel(&sentinel) {
            error!(error = %err, "failed to write job sentinel");
        }
    }
}

/// Check input and options before any work is done.
pub fn validate_input(input: &JobInput) -> Result<(), ScanError> {
    if input.tables.is_empty() {
        return Err(ScanError::Configuration("job has no tables".into()));
    }

    let options = &input.options;
    let ratios = [
        ("minMatchRatio", options.min_match_ratio),
        ("strongMatchRatio", options.strong_match_ratio),
        ("minKeyUniqueness", options.min_key_uniqueness),
    ];
    for (name, value) in ratios {
        if !(0.0..=1.0).contains(&value) {
            return Err(ScanError::Configuration(format!(
                "{name} must be between 0 and 1, got {value}"
            )));
        }
    }

    if options.min_match_ratio > options.strong_match_ratio {
        return Err(ScanError::Configuration(format!(
            "minMatchRatio ({}) exceeds strongMatchRatio ({})",
            options.min_match_ratio, options.strong_match_ratio
        )));
    }

    if options.max_parallel_tables == 0 {
        return Err(ScanError::Configuration(
            "maxParallelTables must be at least 1".into(),
        ));
    }

    // Each table owns one snapshot file; two tables must never share one.
    let mut snapshots: HashMap<String, TableRef> = HashMap::with_capacity(input.tables.len());
    for table in &input.tables {
        let table_ref = table.table_ref();
        let file = snapshot_file_name(&table_ref);
        if let Some(existing) = snapshots.insert(file.clone(), table_ref.clone()) {
            let message = if existing == table_ref {
                format!("table {table_ref} is listed more than once")
            } else {
                format!("tables {existing} and {table_ref} would share snapshot file {file}")
            };
            return Err(ScanError::Configuration(message));
        }
    }

    Ok(())
}

fn write_summary(
    logger: &JobLogger,
    job_id: &str,
    started_at: DateTime<Utc>,
    duration_ms: u64,
    results: Option<&ResultsModel>,
) {
    let completed_at = Utc::now();
    logger.plain("---- Job summary ----");
    logger.plain(format!("Job id:              {job_id}"));
    logger.plain(format!(
        "Started:             {}",
        started_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));
    logger.plain(format!(
        "Completed:           {}",
        completed_at.to_rfc3339_opts(SecondsFormat::Millis, true)
    ));
    logger.plain(format!("Duration:            {duration_ms}ms"));

    if let Some(results) = results {
        let summary = &results.summary;
        logger.plain(format!("Tables scanned:      {}", summary.tables_scanned));
        logger.plain(format!("Candidates found:    {}", summary.candidates_found));
        logger.plain(format!("Strong candidates:   {}", summary.strong_candidates));
        logger.plain(format!("Tables without keys: {}", summary.tables_without_keys));
    }
}
