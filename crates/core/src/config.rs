use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::blurring::domain::blur_error::SettingsError;
use crate::blurring::domain::blur_settings::{Argb, BlurSettings};
use crate::scheduling::domain::tracking_policy::TrackingPolicy;
use crate::shared::constants::{
    CONFIG_DIR_NAME, CONFIG_FILE_NAME, DEFAULT_DOWN_SAMPLING, DEFAULT_RADIUS,
};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write config {path}: {source}")]
    Write {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config JSON: {0}")]
    Parse(#[from] serde_json::Error),

    #[error(transparent)]
    Settings(#[from] SettingsError),
}

/// Persistable blur configuration. Missing fields take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    pub radius: i32,
    pub down_sampling: i32,
    pub overlay_color: Argb,
    pub keep_down_sampling_size: bool,
    #[serde(rename = "async")]
    pub run_async: bool,
    pub tracking: TrackingPolicy,
    pub destroy_after_blur: bool,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            radius: DEFAULT_RADIUS as i32,
            down_sampling: DEFAULT_DOWN_SAMPLING as i32,
            overlay_color: Argb::TRANSPARENT,
            keep_down_sampling_size: false,
            run_async: false,
            tracking: TrackingPolicy::default(),
            destroy_after_blur: true,
        }
    }
}

impl BlurConfig {
    /// `<config dir>/live-blur/settings.json`, if the platform has a config
    /// directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME))
    }

    /// Reads and validates a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Self = serde_json::from_str(&json)?;
        config.settings()?;
        Ok(config)
    }

    /// Loads `path` if it exists, defaults otherwise.
    pub fn load_or_default(path: &Path) -> Result<Self, ConfigError> {
        if path.exists() {
            Self::load(path)
        } else {
            log::debug!("No config at {}, using defaults", path.display());
            Ok(Self::default())
        }
    }

    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let write_err = |source: std::io::Error| ConfigError::Write {
            path: path.to_path_buf(),
            source,
        };
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(write_err)?;
        }
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).map_err(write_err)
    }

    pub fn settings(&self) -> Result<BlurSettings, SettingsError> {
        Ok(BlurSettings::default()
            .with_radius(self.radius)?
            .with_down_sampling(self.down_sampling)?
            .with_overlay_color(self.overlay_color)
            .with_keep_down_sampling_size(self.keep_down_sampling_size))
    }
}
