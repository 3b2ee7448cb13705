//! Ignore rules.
//!
//! Rules exclude tables and columns from every discovery stage. The engine
//! consults an [`IgnorePolicy`]; [`IgnoreRules`] is the implementation loaded
//! from an ignore document:
//!
//! ```json
//! {
//!   "ignoreTables": [{ "schema": "SYSIBM", "name": "*" }],
//!   "ignoreColumns": [{ "schema": "*", "table": "*", "name": "CREATED_BY" }],
//!   "ignoreColumnPatterns": ["^TMP_", "_HASH$"],
//!   "ignoreDataTypes": ["BLOB", "CLOB", "XML"]
//! }
//! ```
//!
//! `*` matches any run of characters; all matching is case-insensitive.

mod rules;

pub use rules::{IgnoreColumn, IgnoreDocument, IgnoreError, IgnoreRules, IgnoreTable};

/// Decides whether a table or column takes part in discovery.
pub trait IgnorePolicy: Send + Sync {
    fn should_ignore_table(&self, schema: &str, table: &str) -> bool;

    fn should_ignore_column(&self, schema: &str, table: &str, column: &str, data_type: &str)
        -> bool;
}

/// Policy that ignores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoIgnore;

impl IgnorePolicy for NoIgnore {
    fn should_ignore_table(&self, _schema: &str, _table: &str) -> bool {
        false
    }

    fn should_ignore_column(
        &self,
        _schema: &str,
        _table: &str,
        _column: &str,
        _data_type: &str,
    ) -> bool {
        false
    }
}
