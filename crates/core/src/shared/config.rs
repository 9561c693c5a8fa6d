use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classification::domain::thresholds::Thresholds;
use crate::shared::constants::{DEFAULT_RETENTION_HOURS, STORAGE_DIR_NAME};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error(
        "thresholds must satisfy 0 <= twins < siblings < similar, got {twins}, {siblings}, {similar}"
    )]
    InvalidThresholds {
        twins: f64,
        siblings: f64,
        similar: f64,
    },
    #[error("confidence must be between 0.0 and 1.0, got {0}")]
    InvalidConfidence(f64),
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Process-wide settings, passed explicitly into the classifier and the
/// batch store rather than read from globals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub thresholds: Thresholds,
    pub retention_hours: u64,
    pub storage_root: Option<PathBuf>,
    pub confidence: f64,
    pub thumbnails: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            thresholds: Thresholds::default(),
            retention_hours: DEFAULT_RETENTION_HOURS,
            storage_root: None,
            confidence: 0.5,
            thumbnails: false,
        }
    }
}

impl AppConfig {
    /// Platform config file: `<config_dir>/TwinsRecognition/config.json`.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("TwinsRecognition").join("config.json"))
    }

    /// Loads an explicit config file, or the platform default if present.
    ///
    /// An explicit path must exist; a missing default file yields defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match explicit {
            Some(path) => Self::read(path)?,
            None => match Self::default_path() {
                Some(path) if path.exists() => Self::read(&path)?,
                _ => Self::default(),
            },
        };
        config.validate()?;
        Ok(config)
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let json = fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        serde_json::from_str(&json).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: e,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        Thresholds::new(
            self.thresholds.twins,
            self.thresholds.siblings,
            self.thresholds.similar,
        )?;
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(ConfigError::InvalidConfidence(self.confidence));
        }
        Ok(())
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_hours.saturating_mul(3600))
    }

    /// Configured storage root, or `<tmp>/twins_uploads`.
    pub fn storage_root(&self) -> PathBuf {
        self.storage_root
            .clone()
            .unwrap_or_else(|| std::env::temp_dir().join(STORAGE_DIR_NAME))
    }
}
