//! Service and daemon configuration.
//!
//! The seeding threshold and seed file size are fixed at construction.
//! Changing them on a live service would let a caller lower the bar for
//! strong output after the fact.

use crate::mixing::{HashAlgorithm, DEFAULT_THRESHOLD_BITS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for an [`EntropyService`](crate::EntropyService).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Hash used to mix seed material into the key.
    pub hash: HashAlgorithm,
    /// Entropy credit (bits) required before strong output is produced.
    pub seed_threshold_bits: f64,
    /// Bytes written by each seed file save.
    pub seed_file_bytes: usize,
    /// Maximum bytes read from a seed file (`None` reads the whole file).
    pub max_load_bytes: Option<u64>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            hash: HashAlgorithm::Blake3,
            seed_threshold_bits: DEFAULT_THRESHOLD_BITS,
            seed_file_bytes: 1024,
            max_load_bytes: None,
        }
    }
}

impl ServiceConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !self.seed_threshold_bits.is_finite() || self.seed_threshold_bits <= 0.0 {
            return Err(ConfigError::InvalidThreshold(self.seed_threshold_bits));
        }
        // A saved seed file must carry enough material to seed a fresh
        // instance on its own.
        if (self.seed_file_bytes as f64) * 8.0 < self.seed_threshold_bits {
            return Err(ConfigError::SeedFileTooSmall {
                bytes: self.seed_file_bytes,
                threshold_bits: self.seed_threshold_bits,
            });
        }
        if self.max_load_bytes == Some(0) {
            return Err(ConfigError::InvalidLoadLimit);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Threshold is zero, negative or not finite.
    #[error("invalid seed threshold {0} (must be a positive number of bits)")]
    InvalidThreshold(f64),
    /// A saved seed file would be too small to seed a fresh instance.
    #[error("seed file size {bytes} bytes cannot satisfy a {threshold_bits} bit threshold")]
    SeedFileTooSmall {
        /// Configured seed file size.
        bytes: usize,
        /// Configured seeding threshold.
        threshold_bits: f64,
    },
    /// Load limit of zero bytes.
    #[error("invalid seed file load limit (must be at least 1 byte)")]
    InvalidLoadLimit,
    /// Daemon interval of zero seconds.
    #[error("invalid interval (must be at least 1 second)")]
    InvalidInterval,
    /// Config file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// Config file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// `[service]` section.
    #[serde(default)]
    pub service: ServiceConfig,
    /// `[daemon]` section.
    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// Long-running daemon configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DaemonConfig {
    /// Seed file loaded at startup and rewritten periodically.
    pub seed_file: Option<PathBuf>,
    /// Seconds between OS entropy polls.
    pub reseed_interval_secs: u64,
    /// Seconds between seed file rewrites.
    pub save_interval_secs: u64,
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            seed_file: None,
            reseed_interval_secs: 60,
            save_interval_secs: 300,
            metrics_port: 9090,
        }
    }
}

impl DaemonConfig {
    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.reseed_interval_secs == 0 || self.save_interval_secs == 0 {
            return Err(ConfigError::InvalidInterval);
        }
        Ok(())
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.service.validate()?;
        config.daemon.validate()?;
        Ok(config)
    }
}
