//! Application configuration loading
//!
//! Defaults come from `mochi-config`. `MOCHI_CONFIG` may name a JSON file
//! with `simulation` and `camera` sections (either may be partial), and
//! `MOCHI_QUALITY` overrides the quality level from either source.

use std::path::{Path, PathBuf};

use mochi_config::{CameraFraming, Quality, SimulationConfig};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Invalid config {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// Everything the binary reads at startup.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MochiConfig {
    pub simulation: SimulationConfig,
    pub camera: CameraFraming,
}

impl MochiConfig {
    /// Load from `MOCHI_CONFIG` if set, then apply `MOCHI_QUALITY`.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match std::env::var_os("MOCHI_CONFIG") {
            Some(path) => Self::from_file(Path::new(&path))?,
            None => Self::default(),
        };
        if std::env::var_os("MOCHI_QUALITY").is_some() {
            config.simulation.quality = Quality::from_env();
        }
        config.simulation = config.simulation.clamped();
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
