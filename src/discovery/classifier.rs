//! Parent key and child column classification.
//!
//! Declared constraints always win. Naming heuristics are only consulted for
//! tables that declare neither a primary key nor a unique constraint.

use crate::ignore::IgnorePolicy;
use crate::model::{ColumnInfo, KeyType, TableMetadata};

use super::naming::NamingConventions;

/// Uniqueness assumed for a heuristic key that has not been measured.
pub const ASSUMED_CANDIDATE_UNIQUENESS: f64 = 0.95;

/// A column that other tables may reference.
#[derive(Debug, Clone, PartialEq)]
pub struct ParentKeyCandidate {
    pub column: ColumnInfo,
    pub key_type: KeyType,
    pub uniqueness_ratio: f64,
}

/// Classifies the columns of one table.
pub struct KeyClassifier<'a> {
    ignore: &'a dyn IgnorePolicy,
    naming: &'a NamingConventions,
}

impl<'a> KeyClassifier<'a> {
    pub fn new(ignore: &'a dyn IgnorePolicy, naming: &'a NamingConventions) -> Self {
        Self { ignore, naming }
    }

    /// Parent key candidates in priority order: primary key columns, then
    /// unique constraint columns, then (only if both are empty) columns
    /// accepted by the parent key naming convention.
    pub fn parent_keys(&self, table: &TableMetadata) -> Vec<ParentKeyCandidate> {
        let mut keys: Vec<ParentKeyCandidate> = Vec::new();

        let declared = table
            .primary_key
            .iter()
            .map(|name| (name, KeyType::PrimaryKey))
            .chain(
                table
                    .unique_keys
                    .iter()
                    .flatten()
                    .map(|name| (name, KeyType::UniqueConstraint)),
            );

        for (name, key_type) in declared {
            let Some(column) = self.usable_column(table, name) else {
                continue;
            };
            if keys.iter().any(|k| k.column.name == column.name) {
                continue;
            }
            keys.push(ParentKeyCandidate {
                column: column.clone(),
                key_type,
                uniqueness_ratio: 1.0,
            });
        }

        if !keys.is_empty() {
            return keys;
        }

        table
            .columns
            .iter()
            .filter(|c| self.naming.parent_key.matches(&c.name))
            .filter(|c| !self.is_ignored(table, c))
            .map(|c| ParentKeyCandidate {
                column: c.clone(),
                key_type: KeyType::CandidateKey,
                uniqueness_ratio: ASSUMED_CANDIDATE_UNIQUENESS,
            })
            .collect()
    }

    /// Columns that may reference another table, in column order.
    pub fn child_columns<'t>(&self, table: &'t TableMetadata) -> Vec<&'t ColumnInfo> {
        table
            .columns
            .iter()
            .filter(|c| self.naming.child_column.matches(&c.name))
            .filter(|c| !self.is_ignored(table, c))
            .collect()
    }

    fn usable_column<'t>(&self, table: &'t TableMetadata, name: &str) -> Option<&'t ColumnInfo> {
        let column = table
            .column(name)
            .or_else(|| table.columns.iter().find(|c| c.name.eq_ignore_ascii_case(name)));
        match column {
            Some(c) if !self.is_ignored(table, c) => Some(c),
            Some(_) => None,
            None => {
                tracing::debug!(table = %table.full_name(), column = name, "constraint column not in column list");
                None
            }
        }
    }

    fn is_ignored(&self, table: &TableMetadata, column: &ColumnInfo) -> bool {
        self.ignore
            .should_ignore_column(&table.schema, &table.name, &column.name, &column.data_type)
    }
}
