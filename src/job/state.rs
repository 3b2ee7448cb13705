//! Job lifecycle.

use std::fmt;

/// Lifecycle of a scan job.
///
/// ```text
/// Initialized ──▶ Extracting ──▶ Analyzing ──▶ ReportWritten ──▶ Succeeded
///      │               │              │               │
///      └───────────────┴──────────────┴───────────────┴────────▶ Failed
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JobState {
    Initialized,
    Extracting,
    Analyzing,
    ReportWritten,
    Succeeded,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }

    /// Whether `next` directly follows this state.
    pub fn can_advance_to(&self, next: JobState) -> bool {
        use JobState::*;
        match (self, next) {
            (Initialized, Extracting)
            | (Extracting, Analyzing)
            | (Analyzing, ReportWritten)
            | (ReportWritten, Succeeded) => true,
            (current, Failed) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Initialized => "initialized",
            Self::Extracting => "extracting",
            Self::Analyzing => "analyzing",
            Self::ReportWritten => "report written",
            Self::Succeeded => "succeeded",
            Self::Failed => "failed",
        };
        f.write_str(s)
    }
}
