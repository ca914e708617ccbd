//! Daybook configuration.

use std::path::{Path, PathBuf};

use ::config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::error::{CalError, CalResult};

static DEFAULT_DATA_DIR: &str = "~/.local/share/daybook";

/// How far ahead recurring events are expanded, matching a one-year view.
pub const DEFAULT_HORIZON_DAYS: i64 = 365;

pub const DEFAULT_REMINDER_WINDOW_MINUTES: i64 = 60;

fn default_data_dir() -> PathBuf {
    PathBuf::from(DEFAULT_DATA_DIR)
}

fn default_horizon_days() -> i64 {
    DEFAULT_HORIZON_DAYS
}

fn default_reminder_window_minutes() -> i64 {
    DEFAULT_REMINDER_WINDOW_MINUTES
}

/// Configuration at ~/.config/daybook/config.toml
///
/// Every key can be overridden with a `DAYBOOK_` environment variable,
/// e.g. `DAYBOOK_DATA_DIR`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaybookConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,

    #[serde(default = "default_horizon_days")]
    pub horizon_days: i64,

    #[serde(default = "default_reminder_window_minutes")]
    pub reminder_window_minutes: i64,
}

impl Default for DaybookConfig {
    fn default() -> Self {
        DaybookConfig {
            data_dir: default_data_dir(),
            horizon_days: default_horizon_days(),
            reminder_window_minutes: default_reminder_window_minutes(),
        }
    }
}

impl DaybookConfig {
    pub fn config_path() -> CalResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CalError::Config("Could not determine config directory".into()))?
            .join("daybook");

        Ok(config_dir.join("config.toml"))
    }

    /// Load the config, writing a commented default file on first run.
    pub fn load() -> CalResult<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            Self::create_default_config(&config_path)?;
        }

        Self::load_from(&config_path)
    }

    /// Load from an explicit file (missing is fine), with env overrides.
    pub fn load_from(path: &Path) -> CalResult<Self> {
        let config: DaybookConfig = Config::builder()
            .add_source(File::from(path.to_path_buf()).required(false))
            .add_source(Environment::with_prefix("DAYBOOK"))
            .build()
            .map_err(|e| CalError::Config(e.to_string()))?
            .try_deserialize()
            .map_err(|e| CalError::Config(e.to_string()))?;

        if config.horizon_days < 0 {
            return Err(CalError::Config(format!(
                "horizon_days must not be negative (got {})",
                config.horizon_days
            )));
        }

        Ok(config)
    }

    /// Data directory with `~` expanded.
    pub fn data_path(&self) -> PathBuf {
        let full_path_str = shellexpand::tilde(&self.data_dir.to_string_lossy()).into_owned();

        PathBuf::from(full_path_str)
    }

    pub fn store_path(&self) -> PathBuf {
        self.data_path().join("events.json")
    }

    /// The effective configuration as TOML.
    pub fn to_toml(&self) -> CalResult<String> {
        toml::to_string_pretty(self).map_err(|e| CalError::Config(e.to_string()))
    }

    /// Create a default config file with all options commented out.
    pub fn create_default_config(path: &Path) -> CalResult<()> {
        let contents = format!(
            "\
# daybook configuration

# Where events are stored:
# data_dir = \"{}\"

# How many days ahead recurring events are shown:
# horizon_days = {}

# How many minutes ahead `daybook reminders` looks:
# reminder_window_minutes = {}
",
            DEFAULT_DATA_DIR, DEFAULT_HORIZON_DAYS, DEFAULT_REMINDER_WINDOW_MINUTES
        );

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| {
                CalError::Config(format!("Could not create config directory: {e}"))
            })?;
        }

        std::fs::write(path, contents)
            .map_err(|e| CalError::Config(format!("Could not write config file: {e}")))?;

        Ok(())
    }
}
