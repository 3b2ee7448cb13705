//! Configuration module for fkscan.
//!
//! Handles the TOML settings file and environment variable expansion.

mod settings;

pub use settings::{
    expand_env_vars, Driver, IgnoreSettings, NamingSettings, OutputSettings, Settings,
    SettingsError, SourceSettings, CONFIG_ENV_VAR,
};
