//! Extraction statement templates and identifier quoting.

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use async_trait::async_trait;
use serde::Deserialize;

use super::error::{SourceError, SourceResult};

/// Name of the statement that selects every row of one table.
pub const EXPORT_TABLE_STATEMENT: &str = "GetTableDataForExport";

/// Portable fallback for [`EXPORT_TABLE_STATEMENT`].
const ANSI_EXPORT_TABLE_SQL: &str = "SELECT * FROM {SCHEMA}.{TABLE}";

/// SQL dialects the engine knows how to quote identifiers for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Dialect {
    /// Plain identifiers, no quoting.
    #[default]
    Ansi,
    /// DB2 uses unquoted identifiers by default.
    Db2,
    Postgres,
    SqlServer,
    /// Oracle folds unquoted identifiers to upper case, so quoted names are upper-cased.
    Oracle,
    MySql,
    Sqlite,
}

impl FromStr for Dialect {
    type Err = SourceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "" | "ansi" => Ok(Self::Ansi),
            "db2" => Ok(Self::Db2),
            "postgres" | "postgresql" => Ok(Self::Postgres),
            "sqlserver" | "mssql" | "tsql" => Ok(Self::SqlServer),
            "oracle" => Ok(Self::Oracle),
            "mysql" | "mariadb" => Ok(Self::MySql),
            "sqlite" => Ok(Self::Sqlite),
            other => Err(SourceError::UnsupportedDialect(other.to_string())),
        }
    }
}

impl Dialect {
    /// Quote an identifier for this dialect.
    pub fn quote(&self, ident: &str) -> String {
        match self {
            Self::Ansi | Self::Db2 => ident.to_string(),
            Self::Postgres | Self::Sqlite => format!("\"{}\"", ident.replace('"', "\"\"")),
            Self::Oracle => format!("\"{}\"", ident.to_uppercase().replace('"', "\"\"")),
            Self::SqlServer => format!("[{}]", ident.replace(']', "]]")),
            Self::MySql => format!("`{}`", ident.replace('`', "``")),
        }
    }
}

/// Substitute `{SCHEMA}` and `{TABLE}` in a statement template.
pub fn render_table_statement(template: &str, dialect: Dialect, schema: &str, table: &str) -> String {
    template
        .replace("{SCHEMA}", &dialect.quote(schema))
        .replace("{TABLE}", &dialect.quote(table))
}

/// Provides provider-specific SQL statements by name.
///
/// Statements may contain `{SCHEMA}` and `{TABLE}` placeholders; callers
/// substitute them with [`render_table_statement`].
#[async_trait]
pub trait SqlTranslator: Send + Sync {
    /// Get the statement text for `name`.
    async fn translated_statement(&self, name: &str) -> SourceResult<String>;

    /// Dialect used to quote substituted identifiers.
    fn dialect(&self) -> Dialect;
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    statements: HashMap<String, CatalogStatement>,
}

#[derive(Debug, Deserialize)]
struct CatalogStatement {
    sql: String,
}

/// Statement translator backed by a JSON catalog.
///
/// Catalog format:
///
/// ```json
/// { "statements": { "GetTableDataForExport": { "sql": "SELECT * FROM {SCHEMA}.{TABLE}" } } }
/// ```
///
/// Statements missing from the catalog fall back to the built-in ANSI text.
#[derive(Debug, Clone)]
pub struct StatementCatalog {
    dialect: Dialect,
    statements: HashMap<String, String>,
}

impl StatementCatalog {
    /// Catalog holding only the built-in ANSI statements.
    pub fn ansi(dialect: Dialect) -> Self {
        Self {
            dialect,
            statements: HashMap::new(),
        }
    }

    /// Load a catalog file.
    pub fn from_file<P: AsRef<Path>>(path: P, dialect: Dialect) -> SourceResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| SourceError::CatalogRead {
            path: path.to_path_buf(),
            source,
        })?;
        let file: CatalogFile =
            serde_json::from_str(&content).map_err(|source| SourceError::CatalogParse {
                path: path.to_path_buf(),
                source,
            })?;

        let statements = file
            .statements
            .into_iter()
            .map(|(name, stmt)| (name, stmt.sql))
            .collect();

        Ok(Self {
            dialect,
            statements,
        })
    }

    /// Add or replace a statement.
    pub fn with_statement(mut self, name: impl Into<String>, sql: impl Into<String>) -> Self {
        self.statements.insert(name.into(), sql.into());
        self
    }

    fn lookup(&self, name: &str) -> SourceResult<String> {
        if let Some(sql) = self.statements.get(name) {
            return Ok(sql.clone());
        }
        match name {
            EXPORT_TABLE_STATEMENT => Ok(ANSI_EXPORT_TABLE_SQL.to_string()),
            other => Err(SourceError::StatementNotFound(other.to_string())),
        }
    }
}

#[async_trait]
impl SqlTranslator for StatementCatalog {
    async fn translated_statement(&self, name: &str) -> SourceResult<String> {
        self.lookup(name)
    }

    fn dialect(&self) -> Dialect {
        self.dialect
    }
}
