use std::fs;
use std::path::{Path, PathBuf};

use arenakit_scheduler::TickConfig;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::paths::ProjectPaths;

pub const APP_NAME: &str = "arenakit";

#[derive(Debug, thiserror::Error)]
pub enum ConfigLoadError {
    #[error("config file not found: {0}")]
    NotFound(PathBuf),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("IO error on config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("could not determine the config directory")]
    NoConfigDir,
}

/// Prestart phase timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Length of the prestart countdown (default: 20)
    #[serde(default = "default_prestart_seconds")]
    pub prestart_seconds: u32,

    /// Seconds between countdown announcements (default: 5)
    #[serde(default = "default_prestart_interval")]
    pub prestart_interval: u32,
}

fn default_prestart_seconds() -> u32 {
    20
}

fn default_prestart_interval() -> u32 {
    5
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            prestart_seconds: default_prestart_seconds(),
            prestart_interval: default_prestart_interval(),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Also write logs to `<data dir>/logs/<component>.log`
    #[serde(default)]
    pub file: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ArenakitConfig {
    #[serde(default)]
    pub scheduler: TickConfig,

    #[serde(default, rename = "match")]
    pub match_phase: MatchConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ArenakitConfig {
    /// `config.toml` in the user's config directory
    pub fn config_path() -> Option<PathBuf> {
        ProjectPaths::new(APP_NAME).map(|paths| paths.config_dir().join("config.toml"))
    }

    pub fn load() -> Result<Self, ConfigLoadError> {
        let path = Self::config_path().ok_or(ConfigLoadError::NoConfigDir)?;
        Self::load_from(&path)
    }

    /// Like [`load`](Self::load), but missing files yield the defaults
    pub fn load_or_default() -> Result<Self, ConfigLoadError> {
        match Self::load() {
            Err(ConfigLoadError::NotFound(_)) | Err(ConfigLoadError::NoConfigDir) => {
                Ok(Self::default())
            }
            other => other,
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, ConfigLoadError> {
        if !path.exists() {
            return Err(ConfigLoadError::NotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let config = toml::from_str(&content)?;
        info!(target: "host", "Loaded config from {}", path.display());
        Ok(config)
    }

    pub fn save(&self) -> Result<(), ConfigLoadError> {
        let path = Self::config_path().ok_or(ConfigLoadError::NoConfigDir)?;
        self.save_to(&path)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), ConfigLoadError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        fs::write(path, content)?;
        info!(target: "host", "Saved config to {}", path.display());
        Ok(())
    }
}
