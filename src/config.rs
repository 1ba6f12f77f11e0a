//! Configuration for the DriveSense service and tools.

use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Main configuration for the service and the corpus builder.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// HTTP server settings
    pub server: ServerSettings,

    /// Paths to the pre-trained model artifacts
    pub models: ModelPaths,

    /// Corpus builder settings
    pub sampler: SamplerSettings,

    /// Path for the account database and other runtime state
    pub data_path: PathBuf,
}

/// HTTP server bind settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerSettings {
    pub host: IpAddr,
    pub port: u16,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: IpAddr::from([127, 0, 0, 1]),
            port: 8077,
        }
    }
}

/// Locations of the serialized model bundles loaded at startup.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelPaths {
    /// Behavior classifier bundle (scaler + logistic weights)
    pub behavior: PathBuf,
    /// Accident severity model bundle
    pub severity: PathBuf,
}

impl Default for ModelPaths {
    fn default() -> Self {
        Self {
            behavior: PathBuf::from("model/behavior_classifier.json"),
            severity: PathBuf::from("model/accident_severity.json"),
        }
    }
}

/// Settings for the offline sensor-log corpus builder.
///
/// Defaults mirror the layout the collection rig produces: a base directory
/// with `risky/` and `safe/` subtrees of per-day session folders.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SamplerSettings {
    /// Directory containing `risky/` and `safe/` session trees
    pub base_dir: PathBuf,
    /// Output file for the merged training corpus
    pub output_file: PathBuf,
    /// Keep every N-th row of each sensor log
    pub stride: usize,
    /// Seed for the global row shuffle
    pub shuffle_seed: u64,
}

impl Default for SamplerSettings {
    fn default() -> Self {
        Self {
            base_dir: PathBuf::from("extracted"),
            output_file: PathBuf::from("final_training_data.csv"),
            stride: 10,
            shuffle_seed: 42,
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drivesense");

        Self {
            server: ServerSettings::default(),
            models: ModelPaths::default(),
            sampler: SamplerSettings::default(),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    ///
    /// A missing file yields the defaults; an unreadable or malformed file
    /// is an error.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&config_path, content)?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("drivesense")
            .join("config.json")
    }

    /// Ensure the runtime data directory exists.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)?;
        Ok(())
    }

    /// Path of the SQLite account database.
    pub fn database_path(&self) -> PathBuf {
        self.data_path.join("accounts.db")
    }
}

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config parse error: {0}")]
    Parse(#[from] serde_json::Error),
}
