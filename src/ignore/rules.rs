//! Ignore document loading and matching.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::IgnorePolicy;

/// Errors raised while loading ignore rules.
#[derive(Debug, Error)]
pub enum IgnoreError {
    #[error("failed to read ignore rules {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse ignore rules {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("invalid column pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Ignore document as stored on disk.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct IgnoreDocument {
    pub ignore_tables: Vec<IgnoreTable>,
    pub ignore_columns: Vec<IgnoreColumn>,
    /// Regexes applied to column names only.
    pub ignore_column_patterns: Vec<String>,
    pub ignore_data_types: Vec<String>,
}

/// Table rule; both parts accept `*` wildcards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreTable {
    pub schema: String,
    pub name: String,
}

/// Column rule; every part accepts `*` wildcards.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreColumn {
    pub schema: String,
    pub table: String,
    pub name: String,
}

/// A compiled `*` wildcard. Empty and `*` patterns match everything.
#[derive(Debug, Clone)]
enum Wildcard {
    Any,
    Pattern(Regex),
    /// Fallback when the pattern cannot be compiled; compared literally.
    Literal(String),
}

impl Wildcard {
    fn compile(pattern: &str) -> Self {
        if pattern.is_empty() || pattern == "*" {
            return Self::Any;
        }
        let source = format!("^{}$", regex::escape(pattern).replace(r"\*", ".*"));
        match RegexBuilder::new(&source).case_insensitive(true).build() {
            Ok(regex) => Self::Pattern(regex),
            Err(_) => Self::Literal(pattern.to_string()),
        }
    }

    fn matches(&self, value: &str) -> bool {
        match self {
            Self::Any => true,
            _ if value.is_empty() => false,
            Self::Pattern(re) => re.is_match(value),
            Self::Literal(s) => s.eq_ignore_ascii_case(value),
        }
    }
}

#[derive(Debug, Clone)]
struct TableRule {
    schema: Wildcard,
    name: Wildcard,
}

#[derive(Debug, Clone)]
struct ColumnRule {
    schema: Wildcard,
    table: Wildcard,
    name: Wildcard,
}

/// Compiled ignore rules.
#[derive(Debug, Clone, Default)]
pub struct IgnoreRules {
    tables: Vec<TableRule>,
    columns: Vec<ColumnRule>,
    patterns: Vec<Regex>,
    data_types: Vec<String>,
}

impl IgnoreRules {
    /// Rules that ignore nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Compile an ignore document.
    pub fn from_document(doc: &IgnoreDocument) -> Result<Self, IgnoreError> {
        let tables = doc
            .ignore_tables
            .iter()
            .map(|t| TableRule {
                schema: Wildcard::compile(&t.schema),
                name: Wildcard::compile(&t.name),
            })
            .collect();

        let columns = doc
            .ignore_columns
            .iter()
            .map(|c| ColumnRule {
                schema: Wildcard::compile(&c.schema),
                table: Wildcard::compile(&c.table),
                name: Wildcard::compile(&c.name),
            })
            .collect();

        let patterns = doc
            .ignore_column_patterns
            .iter()
            .map(|p| {
                RegexBuilder::new(p)
                    .case_insensitive(true)
                    .build()
                    .map_err(|source| IgnoreError::InvalidPattern {
                        pattern: p.clone(),
                        source,
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let data_types = doc
            .ignore_data_types
            .iter()
            .map(|t| t.to_uppercase())
            .collect();

        Ok(Self {
            tables,
            columns,
            patterns,
            data_types,
        })
    }

    /// Load rules from a JSON file. A missing file yields empty rules.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, IgnoreError> {
        let path = path.as_ref();
        if !path.exists() {
            warn!(path = %path.display(), "ignore rules file not found, using empty rules");
            return Ok(Self::empty());
        }

        let content = fs::read_to_string(path).map_err(|source| IgnoreError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let doc: IgnoreDocument =
            serde_json::from_str(&content).map_err(|source| IgnoreError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        let rules = Self::from_document(&doc)?;
        info!(
            tables = rules.tables.len(),
            columns = rules.columns.len(),
            patterns = rules.patterns.len(),
            data_types = rules.data_types.len(),
            "loaded ignore rules"
        );
        Ok(rules)
    }
}

impl IgnorePolicy for IgnoreRules {
    fn should_ignore_table(&self, schema: &str, table: &str) -> bool {
        let ignored = self
            .tables
            .iter()
            .any(|rule| rule.schema.matches(schema) && rule.name.matches(table));
        if ignored {
            debug!(schema, table, "table matches ignore rule");
        }
        ignored
    }

    fn should_ignore_column(&self, schema: &str, table: &str, column: &str, data_type: &str) -> bool {
        if self.data_types.iter().any(|t| t.eq_ignore_ascii_case(data_type)) {
            debug!(schema, table, column, data_type, "column ignored by data type");
            return true;
        }

        if self.patterns.iter().any(|re| re.is_match(column)) {
            debug!(schema, table, column, "column ignored by name pattern");
            return true;
        }

        self.columns.iter().any(|rule| {
            rule.schema.matches(schema) && rule.table.matches(table) && rule.name.matches(column)
        })
    }
}
