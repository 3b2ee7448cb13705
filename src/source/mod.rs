//! Source database collaborators.
//!
//! The engine never talks to a database directly. It asks a [`SqlTranslator`]
//! for the extraction statement, substitutes the table identifiers itself, and
//! hands the SQL to a [`QueryExecutor`].
//!
//! ```text
//! ┌────────────────────┐  GetTableDataForExport  ┌──────────────────┐
//! │   SqlTranslator    │ ──────────────────────▶ │  SELECT * FROM   │
//! │ (StatementCatalog) │                         │ {SCHEMA}.{TABLE} │
//! └────────────────────┘                         └────────┬─────────┘
//!                                                         │ Dialect::quote
//!                                                         ▼
//!                                                ┌──────────────────┐
//!                                                │  QueryExecutor   │
//!                                                │ (SqliteExecutor) │
//!                                                └──────────────────┘
//! ```

mod error;
mod executor;
mod sqlite;
mod statements;

pub use error::{SourceError, SourceResult};
pub use executor::{QueryExecutor, QueryResult};
pub use sqlite::SqliteExecutor;
pub use statements::{
    render_table_statement, Dialect, SqlTranslator, StatementCatalog, EXPORT_TABLE_STATEMENT,
};
