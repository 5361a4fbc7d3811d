//! Server configuration, read from an optional TOML file.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::Rules;
use crate::reset::DEFAULT_RETENTION_DAYS;
use crate::store::DEFAULT_DB_PATH;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid config: {0}")]
    Invalid(String),
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Config {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_data_path")]
    pub data_path: PathBuf,
    #[serde(default = "default_static_dir")]
    pub static_dir: PathBuf,
    // Penalties stay quiet from midnight until this hour
    #[serde(default = "default_early_morning_end_hour")]
    pub early_morning_end_hour: u32,
    #[serde(default = "default_reset_minute")]
    pub reset_minute_after_midnight: u32,
    #[serde(default = "default_retention_days")]
    pub scheduled_retention_days: i64,
}

fn default_bind() -> String {
    "127.0.0.1:3000".to_string()
}

fn default_data_path() -> PathBuf {
    PathBuf::from(DEFAULT_DB_PATH)
}

fn default_static_dir() -> PathBuf {
    PathBuf::from("static")
}

fn default_early_morning_end_hour() -> u32 {
    2
}

fn default_reset_minute() -> u32 {
    1
}

fn default_retention_days() -> i64 {
    DEFAULT_RETENTION_DAYS
}

impl Default for Config {
    fn default() -> Self {
        Config {
            bind: default_bind(),
            data_path: default_data_path(),
            static_dir: default_static_dir(),
            early_morning_end_hour: default_early_morning_end_hour(),
            reset_minute_after_midnight: default_reset_minute(),
            scheduled_retention_days: default_retention_days(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.early_morning_end_hour > 23 {
            return Err(ConfigError::Invalid(format!(
                "early_morning_end_hour must be 0..=23, got {}",
                self.early_morning_end_hour
            )));
        }
        if self.reset_minute_after_midnight > 59 {
            return Err(ConfigError::Invalid(format!(
                "reset_minute_after_midnight must be 0..=59, got {}",
                self.reset_minute_after_midnight
            )));
        }
        if self.scheduled_retention_days < 1 {
            return Err(ConfigError::Invalid(
                "scheduled_retention_days must be at least 1".into(),
            ));
        }
        Ok(())
    }

    pub fn rules(&self) -> Rules {
        Rules {
            early_morning_end_hour: self.early_morning_end_hour,
            scheduled_retention_days: self.scheduled_retention_days,
        }
    }
}
