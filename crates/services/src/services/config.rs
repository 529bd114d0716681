//! Console configuration read from the environment.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use thiserror::Error;
use ts_rs::TS;
use utils::logging::DEFAULT_LOG_FILTER;

pub const DATA_MODE_VAR: &str = "PETSHOP_DATA_MODE";
pub const DATABASE_URL_VAR: &str = "PETSHOP_DATABASE_URL";
pub const LOG_FILTER_VAR: &str = "PETSHOP_LOG";

pub const DEFAULT_DATABASE_URL: &str = "sqlite://petshop.db?mode=rwc";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid {var} value {value:?}, expected one of: static_seed, gateway")]
    InvalidDataMode { var: &'static str, value: String },
    #[error("{var} must not be empty")]
    Empty { var: &'static str },
}

/// Selects the resource controller variant for every screen
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, Display, EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum DataMode {
    #[default]
    StaticSeed,
    Gateway,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct ConsoleConfig {
    pub data_mode: DataMode,
    pub database_url: String,
    pub log_filter: String,
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            data_mode: DataMode::default(),
            database_url: DEFAULT_DATABASE_URL.to_string(),
            log_filter: DEFAULT_LOG_FILTER.to_string(),
        }
    }
}

impl ConsoleConfig {
    /// Read from the process environment after loading an optional `.env` file
    pub fn from_env() -> Result<Self, ConfigError> {
        // a missing .env file is fine
        let _ = dotenvy::dotenv();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    /// Build from any variable lookup; unset variables fall back to defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(raw) = lookup(DATA_MODE_VAR) {
            config.data_mode =
                DataMode::from_str(raw.trim()).map_err(|_| ConfigError::InvalidDataMode {
                    var: DATA_MODE_VAR,
                    value: raw.clone(),
                })?;
        }
        if let Some(url) = lookup(DATABASE_URL_VAR) {
            config.database_url = non_empty(DATABASE_URL_VAR, url)?;
        }
        if let Some(filter) = lookup(LOG_FILTER_VAR) {
            config.log_filter = non_empty(LOG_FILTER_VAR, filter)?;
        }

        Ok(config)
    }
}

fn non_empty(var: &'static str, value: String) -> Result<String, ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Empty { var });
    }
    Ok(trimmed.to_string())
}
