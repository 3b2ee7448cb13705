//! # fkscan
//!
//! Discovers undeclared foreign keys by matching the values of likely
//! referencing columns against the keys of other tables.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │                JobInput (table metadata)                │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [ignore rules, row floor]
//! ┌─────────────────────────────────────────────────────────┐
//! │        Snapshot extraction (bounded parallelism)        │
//! │        QueryExecutor + SqlTranslator -> CSV files       │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [discovery]
//! ┌─────────────────────────────────────────────────────────┐
//! │   Key classification, type filtering, value matching    │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [report]
//! ┌─────────────────────────────────────────────────────────┐
//! │  missing_fk_results.json + job log ending in sentinel   │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! The database itself is reached only through the [`source::QueryExecutor`]
//! and [`source::SqlTranslator`] traits; all matching happens against local
//! snapshots.

pub mod config;
pub mod discovery;
pub mod ignore;
pub mod job;
pub mod joblog;
pub mod model;
pub mod snapshot;
pub mod source;

pub use job::{JobState, ScanError, ScanJob};
pub use model::{JobInput, MissingFkCandidate, Options, ResultsModel};
