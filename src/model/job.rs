//! Job input document.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Input for one discovery job.
///
/// Created once per invocation from the user's table selection and never
/// mutated afterwards: row counts and column sets are the ones captured when
/// the job was created.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobInput {
    /// Job identifier. An empty id is replaced with a generated one.
    #[serde(default)]
    pub job_id: String,

    /// When the input document was generated.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub generated_at: Option<DateTime<Utc>>,

    /// Connection profile the tables were captured from.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection_profile: Option<String>,

    /// Source provider name (e.g. "DB2", "POSTGRESQL").
    #[serde(default)]
    pub provider: String,

    /// Source provider version.
    #[serde(default)]
    pub provider_version: String,

    /// Thresholds and limits.
    #[serde(default)]
    pub options: Options,

    /// Tables selected for analysis.
    #[serde(default)]
    pub tables: Vec<TableMetadata>,
}

/// Tunable thresholds for a job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Options {
    /// Tables with fewer rows are not analyzed.
    #[serde(alias = "min_row_count")]
    pub min_row_count: u64,

    /// Minimum match ratio for a pair to be reported.
    #[serde(alias = "min_match_ratio")]
    pub min_match_ratio: f64,

    /// Match ratio at or above which a candidate is STRONG.
    #[serde(alias = "strong_match_ratio")]
    pub strong_match_ratio: f64,

    /// Maximum number of tables extracted concurrently.
    #[serde(alias = "max_parallel_tables")]
    pub max_parallel_tables: usize,

    /// Whether empty values take part in matching.
    #[serde(alias = "include_nulls_in_match")]
    pub include_nulls_in_match: bool,

    /// Measure the uniqueness of heuristic candidate keys from their snapshot
    /// instead of assuming it.
    #[serde(alias = "verify_candidate_keys")]
    pub verify_candidate_keys: bool,

    /// Measured uniqueness a heuristic key needs to stay a parent candidate.
    /// Only used with `verify_candidate_keys`.
    #[serde(alias = "min_key_uniqueness")]
    pub min_key_uniqueness: f64,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            min_row_count: 100,
            min_match_ratio: 0.95,
            strong_match_ratio: 0.99,
            max_parallel_tables: 4,
            include_nulls_in_match: false,
            verify_candidate_keys: false,
            min_key_uniqueness: 0.95,
        }
    }
}

/// Metadata captured for one table.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableMetadata {
    pub schema: String,
    pub name: String,
    #[serde(default)]
    pub row_count: u64,
    /// Columns in ordinal order.
    #[serde(default)]
    pub columns: Vec<ColumnInfo>,
    /// Primary key column names.
    #[serde(default)]
    pub primary_key: Vec<String>,
    /// Unique constraints, one column group per constraint.
    #[serde(default)]
    pub unique_keys: Vec<Vec<String>>,
    /// Declared foreign keys.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyRef>,
}

impl TableMetadata {
    /// Reference to this table.
    pub fn table_ref(&self) -> TableRef {
        TableRef::new(&self.schema, &self.name)
    }

    /// `schema.name`.
    pub fn full_name(&self) -> String {
        format!("{}.{}", self.schema, self.name)
    }

    /// Find a column by exact name.
    pub fn column(&self, name: &str) -> Option<&ColumnInfo> {
        self.columns.iter().find(|c| c.name == name)
    }

    /// Whether this table declares a foreign key from `column` to the given table.
    pub fn has_foreign_key(&self, column: &str, ref_schema: &str, ref_table: &str) -> bool {
        self.foreign_keys.iter().any(|fk| {
            fk.columns.iter().any(|c| c == column)
                && fk.ref_schema == ref_schema
                && fk.ref_table == ref_table
        })
    }

    /// Whether `other` is the same table.
    pub fn is_same_table(&self, other: &TableMetadata) -> bool {
        self.schema == other.schema && self.name == other.name
    }
}

/// A table column.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnInfo {
    pub name: String,
    /// Source type name (e.g. "INTEGER", "VARCHAR").
    pub data_type: String,
    #[serde(default)]
    pub length: Option<u32>,
    #[serde(default)]
    pub scale: Option<u32>,
    #[serde(default)]
    pub nullable: bool,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, data_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: data_type.into(),
            ..Default::default()
        }
    }

    /// Set the declared length.
    pub fn with_length(mut self, length: u32) -> Self {
        self.length = Some(length);
        self
    }

    /// Set the declared scale.
    pub fn with_scale(mut self, scale: u32) -> Self {
        self.scale = Some(scale);
        self
    }
}

/// A declared foreign key.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignKeyRef {
    #[serde(default)]
    pub name: String,
    pub columns: Vec<String>,
    pub ref_schema: String,
    pub ref_table: String,
    #[serde(default)]
    pub ref_columns: Vec<String>,
}

/// Schema-qualified table name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableRef {
    pub schema: String,
    pub name: String,
}

impl TableRef {
    pub fn new(schema: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            schema: schema.into(),
            name: name.into(),
        }
    }

    /// `schema.name`.
    pub fn full_name(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for TableRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.schema, self.name)
    }
}
