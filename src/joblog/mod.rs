//! Job log and status sentinel.
//!
//! Every job writes an append-only, human-readable log. The last line of a
//! finished job is a [`Sentinel`] with a fixed prefix, so a supervising
//! process can poll for completion by tailing the file:
//!
//! ```text
//! 2026-10-19T09:12:01.532Z INFO  Extracted 5/5 SALES.ORDERS (1200 rows)
//! ...
//! ##MISSING_FK_JOB## STATUS=SUCCESS CANDIDATES=3 DURATION=1250ms
//! ```
//!
//! A log without a sentinel belongs to a job that is still running or that
//! was killed.

mod sentinel;

use std::fmt;
use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use chrono::{SecondsFormat, Utc};

pub use sentinel::{read_job_status, JobStatus, Sentinel, SENTINEL_PREFIX};

/// File name of the job log inside the output directory.
pub const JOB_LOG_FILE: &str = "missing_fk_job.log";

/// Destination for job log lines.
///
/// Each call appends one complete line. Implementations must make the append
/// atomic with respect to concurrent callers so lines never interleave.
pub trait JobLog: Send + Sync {
    fn append(&self, line: &str) -> io::Result<()>;
}

/// Append-only log file.
pub struct FileJobLog {
    path: PathBuf,
    file: Mutex<File>,
}

impl FileJobLog {
    /// Open (or create) the log file for appending.
    pub fn open(path: impl Into<PathBuf>) -> io::Result<Self> {
        let path = path.into();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Open `missing_fk_job.log` inside `dir`.
    pub fn in_dir(dir: &Path) -> io::Result<Self> {
        Self::open(dir.join(JOB_LOG_FILE))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl JobLog for FileJobLog {
    fn append(&self, line: &str) -> io::Result<()> {
        let mut buf = String::with_capacity(line.len() + 1);
        buf.push_str(line);
        buf.push('\n');

        let mut file = self.file.lock().unwrap_or_else(|e| e.into_inner());
        file.write_all(buf.as_bytes())
    }
}

/// In-memory log, for tests and embedding.
#[derive(Default)]
pub struct MemoryJobLog {
    lines: Mutex<Vec<String>>,
}

impl MemoryJobLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the lines written so far.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl JobLog for MemoryJobLog {
    fn append(&self, line: &str) -> io::Result<()> {
        self.lines
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(line.to_string());
        Ok(())
    }
}

#[derive(Debug, Clone, Copy)]
enum Level {
    Info,
    Warn,
    Error,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
        };
        f.pad(s)
    }
}

/// Formats timestamped events onto a [`JobLog`].
///
/// Write failures on ordinary events are reported through `tracing` and
/// otherwise ignored; only the sentinel write is surfaced to the caller.
#[derive(Clone)]
pub struct JobLogger {
    sink: Arc<dyn JobLog>,
}

impl JobLogger {
    pub fn new(sink: Arc<dyn JobLog>) -> Self {
        Self { sink }
    }

    pub fn info(&self, message: impl AsRef<str>) {
        self.event(Level::Info, message.as_ref());
    }

    pub fn warn(&self, message: impl AsRef<str>) {
        self.event(Level::Warn, message.as_ref());
    }

    pub fn error(&self, message: impl AsRef<str>) {
        self.event(Level::Error, message.as_ref());
    }

    /// Write an untimestamped line, e.g. part of the summary block.
    pub fn plain(&self, line: impl AsRef<str>) {
        if let Err(err) = self.sink.append(line.as_ref()) {
            tracing::warn!(error = %err, "failed to write job log line");
        }
    }

    /// Write the terminal sentinel line.
    pub fn sentinel(&self, sentinel: &Sentinel) -> io::Result<()> {
        self.sink.append(&sentinel.to_string())
    }

    fn event(&self, level: Level, message: &str) {
        let timestamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        self.plain(format!("{timestamp} {level:<5} {message}"));
    }
}
