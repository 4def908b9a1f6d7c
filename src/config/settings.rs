//! Ledger settings loaded from `ledger.toml`.
//!
//! Every key is optional. Environment variables (usually from `.env`) take
//! precedence over the file for the database URL and the UTC offset.

use crate::config::database::DEFAULT_DATABASE_URL;
use crate::errors::{Error, Result};
use chrono::FixedOffset;
use serde::Deserialize;
use std::path::Path;
use tracing::{debug, info};

/// Category code that marks a transaction as income unless configured otherwise.
pub const DEFAULT_INCOME_CATEGORY: i32 = 5;

/// Configuration structure representing the entire ledger.toml file
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct AppConfig {
    /// `SeaORM` connection URL
    pub database_url: String,
    /// Local offset all months and days are computed in, e.g. `"+09:00"`
    pub utc_offset: String,
    /// Transaction category code counted as income
    pub income_category: i32,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            database_url: DEFAULT_DATABASE_URL.to_string(),
            utc_offset: "+09:00".to_string(),
            income_category: DEFAULT_INCOME_CATEGORY,
        }
    }
}

impl AppConfig {
    /// Parses the configured offset.
    pub fn offset(&self) -> Result<FixedOffset> {
        self.utc_offset.parse().map_err(|e| Error::Config {
            message: format!("Invalid utc_offset '{}': {e}", self.utc_offset),
        })
    }

    /// Applies `DATABASE_URL` and `LEDGER_UTC_OFFSET` from the environment.
    #[must_use]
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.database_url = url;
        }
        if let Ok(offset) = std::env::var("LEDGER_UTC_OFFSET") {
            self.utc_offset = offset;
        }
        self
    }
}

/// Loads settings from a TOML file
///
/// # Errors
/// Returns an error if:
/// - The file cannot be read
/// - The TOML syntax is invalid
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<AppConfig> {
    let path = path.as_ref();
    debug!("Loading ledger settings from {path:?}");
    let contents = std::fs::read_to_string(path).map_err(|e| Error::Config {
        message: format!("Failed to read config file {path:?}: {e}"),
    })?;

    parse_config(&contents)
}

/// Parses settings from TOML text.
pub fn parse_config(contents: &str) -> Result<AppConfig> {
    let config: AppConfig = toml::from_str(contents).map_err(|e| Error::Config {
        message: format!("Failed to parse ledger.toml: {e}"),
    })?;
    config.offset()?;
    Ok(config)
}

/// Loads `./ledger.toml` when present, falling back to defaults, then applies
/// environment overrides.
pub fn load_app_configuration() -> Result<AppConfig> {
    let path = Path::new("ledger.toml");
    let config = if path.exists() {
        load_config(path)?
    } else {
        info!("No ledger.toml found, using default settings");
        AppConfig::default()
    };

    let config = config.with_env_overrides();
    config.offset()?;
    Ok(config)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;

    #[test]
    fn test_parse_full_config() {
        let toml_str = r#"
            database_url = "sqlite::memory:"
            utc_offset = "-05:00"
            income_category = 9
        "#;

        let config = parse_config(toml_str).unwrap();
        assert_eq!(config.database_url, "sqlite::memory:");
        assert_eq!(config.income_category, 9);
        assert_eq!(config.offset().unwrap().local_minus_utc(), -5 * 3600);
    }

    #[test]
    fn test_missing_keys_use_defaults() {
        let config = parse_config("income_category = 7").unwrap();
        assert_eq!(config.database_url, DEFAULT_DATABASE_URL);
        assert_eq!(config.utc_offset, "+09:00");
        assert_eq!(config.income_category, 7);
    }

    #[test]
    fn test_invalid_offset_is_config_error() {
        let err = parse_config(r#"utc_offset = "tokyo""#).unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }

    #[test]
    fn test_malformed_toml_is_config_error() {
        let err = parse_config("income_category = ").unwrap_err();
        assert!(matches!(err, Error::Config { .. }));
    }
}
