//! Candidate assembly.

use crate::model::{
    ColumnInfo, Confidence, Evidence, MissingFkCandidate, Options, TableMetadata,
};

use super::classifier::ParentKeyCandidate;
use super::matcher::MatchStats;

/// Turn match statistics into a candidate, or `None` when the ratio is below
/// the reporting threshold.
///
/// A child column without a single non-empty value is never a candidate,
/// whatever the thresholds.
pub fn build_candidate(
    child_table: &TableMetadata,
    child_column: &ColumnInfo,
    parent_table: &TableMetadata,
    parent_key: &ParentKeyCandidate,
    stats: &MatchStats,
    options: &Options,
) -> Option<MissingFkCandidate> {
    if stats.examined == 0 {
        return None;
    }
    let match_ratio = stats.match_ratio();
    let confidence = Confidence::classify(
        match_ratio,
        options.min_match_ratio,
        options.strong_match_ratio,
    )?;

    Some(MissingFkCandidate {
        child_table: child_table.table_ref(),
        child_columns: vec![child_column.name.clone()],
        parent_table: parent_table.table_ref(),
        parent_columns: vec![parent_key.column.name.clone()],
        parent_key_type: parent_key.key_type,
        match_ratio,
        null_ratio: stats.null_ratio(),
        evidence: Evidence {
            child_distinct: stats.child_distinct,
            parent_distinct: stats.parent_distinct,
            missing_in_parent: stats.missing_in_parent(),
        },
        confidence,
        recommendation: confidence.recommendation(),
    })
}
