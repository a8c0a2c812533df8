use std::path::{Path, PathBuf};
use std::time::Duration;

use pathrace_core::prelude::RaceConfig;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{info, warn};

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to parse configuration: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Server settings, read from a TOML file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub bind: String,
    pub request_timeout_secs: u64,
    pub max_concurrent_requests: usize,
    /// Largest road graph a request may submit
    pub max_nodes: usize,
    /// Frame length of headless races
    pub frame_ms: f64,
    pub max_frames: usize,
    /// Defaults for requests without their own race configuration
    pub race: RaceConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1:8080".to_string(),
            request_timeout_secs: 30,
            max_concurrent_requests: 16,
            max_nodes: 250_000,
            frame_ms: 16.0,
            max_frames: 1_000_000,
            race: RaceConfig::default(),
        }
    }
}

impl ServerConfig {
    /// Loads `path`, falling back to defaults when no file is given or the
    /// file does not exist
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            info!("No configuration file given, using defaults");
            return Ok(Self::default());
        };
        if !path.exists() {
            warn!("Configuration file {} not found, using defaults", path.display());
            return Ok(Self::default());
        }

        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml(&text)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout_secs == 0 {
            return Err(ConfigError::Invalid("request_timeout_secs must be positive".into()));
        }
        if self.max_concurrent_requests == 0 {
            return Err(ConfigError::Invalid("max_concurrent_requests must be positive".into()));
        }
        if !self.frame_ms.is_finite() || self.frame_ms <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "frame_ms must be positive, got {}",
                self.frame_ms
            )));
        }
        self.race
            .validate()
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}
