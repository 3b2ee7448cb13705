//! Job orchestration.
//!
//! A [`ScanJob`] sequences the pipeline for one job input:
//!
//! ```text
//! JobInput ─▶ validate ─▶ qualify tables ─▶ Extractor ─▶ Analyzer ─▶ results JSON
//!                                            (parallel)   (blocking)       │
//!                                                                          ▼
//!                                                     job log summary + sentinel
//! ```
//!
//! Everything lands in the job's output directory:
//!
//! | File                        | Contents                          |
//! |-----------------------------|-----------------------------------|
//! | `{schema}.{table}.csv`      | one snapshot per qualifying table |
//! | `missing_fk_results.json`   | [`ResultsModel`](crate::model::ResultsModel) |
//! | `missing_fk_job.log`        | job log ending in a sentinel line |

mod error;
mod scan;
mod state;

pub use error::ScanError;
pub use scan::{validate_input, ScanJob, RESULTS_FILE};
pub use state::JobState;
