//! TOML-based configuration for fkscan.
//!
//! Supports a config file (fkscan.toml) with environment variable expansion
//! in path values.
//!
//! Example configuration:
//! ```toml
//! [output]
//! root = "${HOME}/fkscan-jobs"
//!
//! [source]
//! driver = "sqlite"
//! database = "./data/warehouse.db"
//! statements = "./statements.json"
//! dialect = "sqlite"
//!
//! [ignore]
//! rules = "./ignore.json"
//!
//! [naming]
//! parent_key_suffixes = ["_ID"]
//! child_column_suffixes = ["_ID", "_FK", "_REF"]
//!
//! # Used when the job input has no "options" object.
//! [options]
//! min_row_count = 50
//! min_match_ratio = 0.9
//! strong_match_ratio = 0.99
//! max_parallel_tables = 8
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::discovery::{
    NamingConventions, DEFAULT_CHILD_COLUMN_SUFFIXES, DEFAULT_PARENT_KEY_SUFFIXES,
};
use crate::model::Options;
use crate::source::Dialect;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "FKSCAN_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Unsupported driver: {0}. Supported: sqlite")]
    UnsupportedDriver(String),

    #[error("Unsupported dialect: {0}")]
    UnsupportedDialect(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Where job output directories are created.
    pub output: OutputSettings,

    /// Source database used by the CLI.
    pub source: SourceSettings,

    /// Ignore rules.
    pub ignore: IgnoreSettings,

    /// Identifier naming conventions.
    pub naming: NamingSettings,

    /// Fallback job options.
    pub options: Options,
}

/// Output configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Root directory; each job gets `<root>/<job_id>`.
    pub root: Option<String>,
}

impl OutputSettings {
    /// The configured root, or `<data_local_dir>/fkscan/jobs`.
    pub fn root_dir(&self) -> Result<PathBuf, SettingsError> {
        if let Some(root) = &self.root {
            return Ok(PathBuf::from(expand_env_vars(root)?));
        }
        dirs::data_local_dir()
            .map(|dir| dir.join("fkscan").join("jobs"))
            .ok_or_else(|| {
                SettingsError::InvalidConfig(
                    "no local data directory; set [output] root".to_string(),
                )
            })
    }
}

/// Supported source drivers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Driver {
    Sqlite,
}

impl FromStr for Driver {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            other => Err(SettingsError::UnsupportedDriver(other.to_string())),
        }
    }
}

/// Source database configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SourceSettings {
    /// Database driver.
    pub driver: String,

    /// Database path (supports ${ENV_VAR} expansion).
    pub database: Option<String>,

    /// Statement catalog JSON file.
    pub statements: Option<String>,

    /// SQL dialect used for identifier quoting. Defaults to the driver's.
    pub dialect: Option<String>,
}

impl Default for SourceSettings {
    fn default() -> Self {
        Self {
            driver: "sqlite".to_string(),
            database: None,
            statements: None,
            dialect: None,
        }
    }
}

impl SourceSettings {
    pub fn driver_type(&self) -> Result<Driver, SettingsError> {
        self.driver.parse()
    }

    pub fn resolved_database(&self) -> Result<Option<PathBuf>, SettingsError> {
        resolve_path(self.database.as_deref())
    }

    pub fn resolved_statements(&self) -> Result<Option<PathBuf>, SettingsError> {
        resolve_path(self.statements.as_deref())
    }

    /// The configured dialect, falling back to the driver's own.
    pub fn dialect(&self) -> Result<Dialect, SettingsError> {
        match &self.dialect {
            Some(name) => name
                .parse()
                .map_err(|_| SettingsError::UnsupportedDialect(name.clone())),
            None => match self.driver_type()? {
                Driver::Sqlite => Ok(Dialect::Sqlite),
            },
        }
    }
}

/// Ignore rule configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct IgnoreSettings {
    /// Ignore document JSON file.
    pub rules: Option<String>,
}

impl IgnoreSettings {
    pub fn resolved_rules(&self) -> Result<Option<PathBuf>, SettingsError> {
        resolve_path(self.rules.as_deref())
    }
}

/// Identifier naming conventions.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NamingSettings {
    /// Suffixes of columns treated as keys of tables without declared keys.
    pub parent_key_suffixes: Vec<String>,

    /// Suffixes of columns that may reference another table.
    pub child_column_suffixes: Vec<String>,
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            parent_key_suffixes: DEFAULT_PARENT_KEY_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
            child_column_suffixes: DEFAULT_CHILD_COLUMN_SUFFIXES
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl NamingSettings {
    pub fn conventions(&self) -> NamingConventions {
        NamingConventions::from_suffixes(&self.parent_key_suffixes, &self.child_column_suffixes)
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings.
    ///
    /// Searches in order:
    /// 1. `explicit` (the `--config` flag)
    /// 2. Environment variable `FKSCAN_CONFIG`
    /// 3. `./fkscan.toml`
    /// 4. `<config_dir>/fkscan/config.toml`
    pub fn load(explicit: Option<&Path>) -> Result<Self, SettingsError> {
        if let Some(path) = explicit {
            return Self::from_file(path);
        }

        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("fkscan.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("fkscan").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }
}

fn resolve_path(value: Option<&str>) -> Result<Option<PathBuf>, SettingsError> {
    value
        .map(|v| expand_env_vars(v).map(PathBuf::from))
        .transpose()
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            chars.by_ref().take_while(|&ch| ch != '}').collect()
        } else {
            let mut name = String::new();
            while let Some(ch) = chars.next_if(|ch| ch.is_alphanumeric() || *ch == '_') {
                name.push(ch);
            }
            if name.is_empty() {
                // lone $
                result.push('$');
                continue;
            }
            name
        };

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
