//! Job input and results documents.
//!
//! A scan is driven by a [`JobInput`] document (the tables selected for
//! analysis, captured once when the job is created) and produces a single
//! [`ResultsModel`] document. Both are JSON with camelCase field names so they
//! can be exchanged with the process that launched the job.

mod job;
mod results;

pub use job::{ColumnInfo, ForeignKeyRef, JobInput, Options, TableMetadata, TableRef};
pub use results::{
    Confidence, Evidence, KeyType, MissingFkCandidate, Recommendation, ResultsModel, Summary,
};
