//! Scheduler configuration
//!
//! Looked up in this order: an explicit path, `HEAPCARDS_CONFIG`, then
//! `<config dir>/heapcards/config.toml`. Every field is optional.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::scheduling::policy::{HeapPolicy, DEFAULT_POLICY_ID};
use crate::scheduling::unknown::{DEFAULT_NEVER_REVIEWED_OVERFETCH, MAX_NEVER_REVIEWED_OVERFETCH};

pub const CONFIG_ENV_VAR: &str = "HEAPCARDS_CONFIG";

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, default)]
pub struct SchedulerConfig {
    /// SQLite database; defaults to the local data directory
    pub database_path: Option<PathBuf>,
    /// Policy given to decks created without one
    pub default_heap_policy: u32,
    pub never_reviewed_overfetch: usize,
    pub demo_tag: String,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            default_heap_policy: DEFAULT_POLICY_ID,
            never_reviewed_overfetch: DEFAULT_NEVER_REVIEWED_OVERFETCH,
            demo_tag: "demo".to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse config TOML: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid config value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
    #[error("Data directory not found")]
    DataDirNotFound,
}

impl SchedulerConfig {
    /// Resolve and validate the configuration
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let path = explicit
            .map(Path::to_path_buf)
            .or_else(|| std::env::var_os(CONFIG_ENV_VAR).map(PathBuf::from))
            .or_else(|| default_config_path().filter(|p| p.exists()));

        let config = match path {
            Some(path) => {
                log::info!("Loading configuration from {}", path.display());
                Self::from_path(&path)?
            }
            None => {
                log::debug!("No configuration file, using defaults");
                Self::default()
            }
        };
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if HeapPolicy::from_id(self.default_heap_policy).is_err() {
            return Err(ConfigError::InvalidValue {
                field: "default_heap_policy",
                reason: format!("no heap policy with id {}", self.default_heap_policy),
            });
        }
        if self.never_reviewed_overfetch == 0
            || self.never_reviewed_overfetch > MAX_NEVER_REVIEWED_OVERFETCH
        {
            return Err(ConfigError::InvalidValue {
                field: "never_reviewed_overfetch",
                reason: format!("must be between 1 and {}", MAX_NEVER_REVIEWED_OVERFETCH),
            });
        }
        if self.demo_tag.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "demo_tag",
                reason: "must not be empty".to_string(),
            });
        }
        if let Some(path) = &self.database_path {
            if path.as_os_str().is_empty() {
                return Err(ConfigError::InvalidValue {
                    field: "database_path",
                    reason: "must not be empty".to_string(),
                });
            }
        }
        Ok(())
    }

    /// Configured database path, or the default under the local data directory
    pub fn database_path(&self) -> Result<PathBuf, ConfigError> {
        match &self.database_path {
            Some(path) => Ok(path.clone()),
            None => dirs::data_local_dir()
                .map(|p| p.join("heapcards").join("heapcards.db"))
                .ok_or(ConfigError::DataDirNotFound),
        }
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("heapcards").join("config.toml"))
}
