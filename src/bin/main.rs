//! fkscan CLI - Discover undeclared foreign keys
//!
//! Usage:
//!   fkscan run --input <job.json> [--output <dir>] [--config <fkscan.toml>]
//!              [--ignore <ignore.json>] [--database <path>]
//!   fkscan status <dir>
//!
//! Examples:
//!   fkscan run --input jobs/sales.json --database ./warehouse.db
//!   fkscan status ~/.local/share/fkscan/jobs/3f2a9c1e-...

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::EnvFilter;
use uuid::Uuid;

use fkscan::config::{Driver, Settings};
use fkscan::ignore::IgnoreRules;
use fkscan::job::{ScanJob, RESULTS_FILE};
use fkscan::joblog::{read_job_status, JobStatus, JOB_LOG_FILE};
use fkscan::model::{JobInput, ResultsModel};
use fkscan::source::{SqliteExecutor, StatementCatalog};

#[derive(Parser)]
#[command(name = "fkscan")]
#[command(about = "fkscan - Discover undeclared foreign keys from table snapshots")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a discovery job
    Run {
        /// Job input document (JSON)
        #[arg(short, long)]
        input: PathBuf,

        /// Output directory (defaults to <output.root>/<job id>)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Settings file (fkscan.toml)
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Ignore rules document (JSON)
        #[arg(long)]
        ignore: Option<PathBuf>,

        /// Source database file
        #[arg(short, long)]
        database: Option<PathBuf>,
    },

    /// Report the status of a job from its log
    Status {
        /// Job output directory or log file
        dir: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Run {
            input,
            output,
            config,
            ignore,
            database,
        } => match cmd_run(input, output, config, ignore, database).await {
            Ok((results, dir)) => {
                println!(
                    "Job {}: {} tables scanned, {} candidates ({} strong), {} tables without keys",
                    results.job_id,
                    results.summary.tables_scanned,
                    results.summary.candidates_found,
                    results.summary.strong_candidates,
                    results.summary.tables_without_keys
                );
                println!("Results: {}", dir.join(RESULTS_FILE).display());
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error: {e:#}");
                ExitCode::FAILURE
            }
        },
        Commands::Status { dir } => cmd_status(&dir),
    }
}

async fn cmd_run(
    input_path: PathBuf,
    output: Option<PathBuf>,
    config: Option<PathBuf>,
    ignore: Option<PathBuf>,
    database: Option<PathBuf>,
) -> Result<(ResultsModel, PathBuf)> {
    let settings = Settings::load(config.as_deref()).context("failed to load settings")?;

    let mut input = read_input(&input_path, &settings)?;
    if input.job_id.trim().is_empty() {
        input.job_id = Uuid::new_v4().to_string();
    }

    let output_dir = match output {
        Some(dir) => dir,
        None => settings.output.root_dir()?.join(&input.job_id),
    };

    let database = match database {
        Some(path) => path,
        None => match settings.source.resolved_database()? {
            Some(path) => path,
            None => bail!("no source database: pass --database or set [source] database"),
        },
    };

    let executor = match settings.source.driver_type()? {
        Driver::Sqlite => Arc::new(SqliteExecutor::new(&database)),
    };
    let dialect = settings.source.dialect()?;
    let translator = match settings.source.resolved_statements()? {
        Some(path) => StatementCatalog::from_file(&path, dialect)
            .with_context(|| format!("failed to load statements from {}", path.display()))?,
        None => StatementCatalog::ansi(dialect),
    };

    let rules_path = match ignore {
        Some(path) => Some(path),
        None => settings.ignore.resolved_rules()?,
    };
    let rules = match rules_path {
        Some(path) => IgnoreRules::from_file(&path)?,
        None => IgnoreRules::empty(),
    };

    info!(
        job_id = %input.job_id,
        database = %database.display(),
        output = %output_dir.display(),
        "starting scan"
    );

    let mut job = ScanJob::new(executor, Arc::new(translator), &output_dir)
        .with_ignore(Arc::new(rules))
        .with_naming(settings.naming.conventions());

    let results = job.execute(input).await?;
    Ok((results, output_dir))
}

/// Read the job input. Without an `options` object the configured options apply.
fn read_input(path: &Path, settings: &Settings) -> Result<JobInput> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("failed to read job input {}", path.display()))?;
    let value: serde_json::Value = serde_json::from_str(&content)
        .with_context(|| format!("failed to parse job input {}", path.display()))?;

    let has_options = value.get("options").is_some();
    let mut input: JobInput = serde_json::from_value(value)
        .with_context(|| format!("invalid job input {}", path.display()))?;
    if !has_options {
        input.options = settings.options.clone();
    }
    Ok(input)
}

fn cmd_status(path: &Path) -> ExitCode {
    let log_path = if path.is_dir() {
        path.join(JOB_LOG_FILE)
    } else {
        path.to_path_buf()
    };

    match read_job_status(&log_path) {
        Ok(JobStatus::Succeeded {
            candidates,
            duration_ms,
        }) => {
            println!("SUCCEEDED: {candidates} candidates in {duration_ms}ms");
            ExitCode::SUCCESS
        }
        Ok(JobStatus::Failed { message }) => {
            println!("FAILED: {message}");
            ExitCode::from(1)
        }
        Ok(JobStatus::Running) => {
            println!("RUNNING: no completion sentinel in {}", log_path.display());
            ExitCode::from(2)
        }
        Err(e) => {
            eprintln!("Error reading '{}': {}", log_path.display(), e);
            ExitCode::FAILURE
        }
    }
}
