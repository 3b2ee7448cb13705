//! Terminal status line of a job log.

use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

/// Fixed prefix marking the sentinel line.
pub const SENTINEL_PREFIX: &str = "##MISSING_FK_JOB##";

const MAX_MESSAGE_CHARS: usize = 240;

/// Outcome written as the final line of a job log.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Sentinel {
    Success { candidates: usize, duration_ms: u64 },
    Error { message: String },
}

impl Sentinel {
    /// Build an error sentinel. The message is cut to a bounded length.
    pub fn error(message: impl AsRef<str>) -> Self {
        Self::Error {
            message: message.as_ref().chars().take(MAX_MESSAGE_CHARS).collect(),
        }
    }

    /// Parse a sentinel line. Returns `None` for ordinary log lines.
    pub fn parse(line: &str) -> Option<Self> {
        let rest = line.trim_end_matches(['\r', '\n']).strip_prefix(SENTINEL_PREFIX)?;
        let mut fields = rest.split(' ').filter(|f| !f.is_empty());

        match fields.next()? {
            "STATUS=SUCCESS" => {
                let mut candidates = None;
                let mut duration_ms = None;
                for field in fields {
                    if let Some(v) = field.strip_prefix("CANDIDATES=") {
                        candidates = v.parse().ok();
                    } else if let Some(v) = field.strip_prefix("DURATION=") {
                        duration_ms = v.strip_suffix("ms").unwrap_or(v).parse().ok();
                    }
                }
                Some(Self::Success {
                    candidates: candidates?,
                    duration_ms: duration_ms?,
                })
            }
            "STATUS=ERROR" => {
                let message = fields
                    .find_map(|f| f.strip_prefix("MESSAGE="))
                    .map(unescape)
                    .unwrap_or_default();
                Some(Self::Error { message })
            }
            _ => None,
        }
    }
}

impl fmt::Display for Sentinel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Success {
                candidates,
                duration_ms,
            } => write!(
                f,
                "{SENTINEL_PREFIX} STATUS=SUCCESS CANDIDATES={candidates} DURATION={duration_ms}ms"
            ),
            Self::Error { message } => {
                write!(f, "{SENTINEL_PREFIX} STATUS=ERROR MESSAGE={}", escape(message))
            }
        }
    }
}

/// Job status as seen by a poller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum JobStatus {
    /// No sentinel yet: the job is still running, or died without one.
    Running,
    Succeeded { candidates: usize, duration_ms: u64 },
    Failed { message: String },
}

impl From<Sentinel> for JobStatus {
    fn from(sentinel: Sentinel) -> Self {
        match sentinel {
            Sentinel::Success {
                candidates,
                duration_ms,
            } => Self::Succeeded {
                candidates,
                duration_ms,
            },
            Sentinel::Error { message } => Self::Failed { message },
        }
    }
}

/// Determine a job's status from its log file.
///
/// Only the last non-blank line is inspected.
pub fn read_job_status(log_path: &Path) -> io::Result<JobStatus> {
    let content = fs::read_to_string(log_path)?;
    let status = content
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .and_then(Sentinel::parse)
        .map(JobStatus::from)
        .unwrap_or(JobStatus::Running);
    Ok(status)
}

fn escape(message: &str) -> String {
    let mut out = String::with_capacity(message.len());
    for c in message.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            ' ' => out.push_str("\\s"),
            '\t' => out.push_str("\\t"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            c => out.push(c),
        }
    }
    out
}

fn unescape(escaped: &str) -> String {
    let mut out = String::with_capacity(escaped.len());
    let mut chars = escaped.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('s') => out.push(' '),
            Some('t') => out.push('\t'),
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
