//! Column naming conventions.

use std::fmt;
use std::sync::Arc;

/// Decides whether a column name follows an identifier convention.
pub trait IdentifierPattern: Send + Sync {
    fn matches(&self, column: &str) -> bool;
}

/// Matches column names ending in one of a set of suffixes, ignoring case.
#[derive(Debug, Clone)]
pub struct SuffixPattern {
    suffixes: Vec<String>,
}

impl SuffixPattern {
    pub fn new<I, S>(suffixes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            suffixes: suffixes
                .into_iter()
                .map(|s| s.as_ref().to_uppercase())
                .filter(|s| !s.is_empty())
                .collect(),
        }
    }

    pub fn suffixes(&self) -> &[String] {
        &self.suffixes
    }
}

impl IdentifierPattern for SuffixPattern {
    fn matches(&self, column: &str) -> bool {
        let upper = column.to_uppercase();
        self.suffixes.iter().any(|s| upper.ends_with(s.as_str()))
    }
}

/// Suffixes marking a column as a heuristic parent key.
pub const DEFAULT_PARENT_KEY_SUFFIXES: &[&str] = &["_ID"];

/// Suffixes marking a column as a child (referencing) column.
pub const DEFAULT_CHILD_COLUMN_SUFFIXES: &[&str] = &["_ID", "_FK"];

/// The pair of conventions used during discovery.
#[derive(Clone)]
pub struct NamingConventions {
    pub parent_key: Arc<dyn IdentifierPattern>,
    pub child_column: Arc<dyn IdentifierPattern>,
}

impl NamingConventions {
    pub fn from_suffixes<S: AsRef<str>>(parent_key: &[S], child_column: &[S]) -> Self {
        Self {
            parent_key: Arc::new(SuffixPattern::new(parent_key)),
            child_column: Arc::new(SuffixPattern::new(child_column)),
        }
    }
}

impl Default for NamingConventions {
    fn default() -> Self {
        Self::from_suffixes(DEFAULT_PARENT_KEY_SUFFIXES, DEFAULT_CHILD_COLUMN_SUFFIXES)
    }
}

impl fmt::Debug for NamingConventions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NamingConventions").finish_non_exhaustive()
    }
}
