//! Results document.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::job::TableRef;

/// How a parent key was identified.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum KeyType {
    /// Declared primary key column.
    PrimaryKey,
    /// Column of a declared unique constraint.
    UniqueConstraint,
    /// Column assumed unique from its name.
    CandidateKey,
}

impl KeyType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PrimaryKey => "PRIMARY_KEY",
            Self::UniqueConstraint => "UNIQUE_CONSTRAINT",
            Self::CandidateKey => "CANDIDATE_KEY",
        }
    }

    /// Whether the key is backed by a database constraint.
    pub fn is_declared(&self) -> bool {
        !matches!(self, Self::CandidateKey)
    }
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Confidence tier of a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Confidence {
    Strong,
    Possible,
}

impl Confidence {
    /// Classify a match ratio. Both thresholds are inclusive.
    ///
    /// Returns `None` when the ratio is below `min_ratio`.
    pub fn classify(ratio: f64, min_ratio: f64, strong_ratio: f64) -> Option<Self> {
        if ratio >= strong_ratio && ratio >= min_ratio {
            Some(Self::Strong)
        } else if ratio >= min_ratio {
            Some(Self::Possible)
        } else {
            None
        }
    }

    /// Recommended follow-up for this tier.
    pub fn recommendation(&self) -> Recommendation {
        match self {
            Self::Strong => Recommendation::AddFk,
            Self::Possible => Recommendation::Review,
        }
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Strong => f.write_str("STRONG"),
            Self::Possible => f.write_str("POSSIBLE"),
        }
    }
}

/// Recommended follow-up for a candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    AddFk,
    Review,
}

/// Data behind a candidate's match ratio.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evidence {
    /// Distinct child values examined.
    pub child_distinct: u64,
    /// Distinct values in the parent key column.
    pub parent_distinct: u64,
    /// Child values with no matching parent value.
    pub missing_in_parent: u64,
}

/// A relationship that looks like an undeclared foreign key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissingFkCandidate {
    pub child_table: TableRef,
    pub child_columns: Vec<String>,
    pub parent_table: TableRef,
    pub parent_columns: Vec<String>,
    pub parent_key_type: KeyType,
    /// Child values found in the parent / child values examined.
    pub match_ratio: f64,
    /// Empty child values / child rows.
    pub null_ratio: f64,
    pub evidence: Evidence,
    pub confidence: Confidence,
    pub recommendation: Recommendation,
}

/// Counts over the whole job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Summary {
    pub tables_scanned: usize,
    pub candidates_found: usize,
    pub strong_candidates: usize,
    pub tables_without_keys: usize,
}

/// The results document written at the end of a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultsModel {
    pub job_id: String,
    pub completed_at: DateTime<Utc>,
    pub summary: Summary,
    pub candidates: Vec<MissingFkCandidate>,
    pub tables_without_keys: Vec<TableRef>,
}

impl ResultsModel {
    /// Assemble the document, deriving the summary from its contents.
    pub fn new(
        job_id: impl Into<String>,
        tables_scanned: usize,
        candidates: Vec<MissingFkCandidate>,
        tables_without_keys: Vec<TableRef>,
    ) -> Self {
        let summary = Summary {
            tables_scanned,
            candidates_found: candidates.len(),
            strong_candidates: candidates
                .iter()
                .filter(|c| c.confidence == Confidence::Strong)
                .count(),
            tables_without_keys: tables_without_keys.len(),
        };

        Self {
            job_id: job_id.into(),
            completed_at: Utc::now(),
            summary,
            candidates,
            tables_without_keys,
        }
    }
}
