//! Configuration management for modalist
//!
//! This module handles loading, parsing, and validation of configuration files.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub backend: BackendConfig,
    pub sync: SyncConfig,
    pub storage: StorageConfig,
    pub logging: LoggingConfig,
}

/// Remote backend configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// Base URL of the remote API
    pub base_url: String,
    /// Per-request timeout in seconds
    pub timeout_secs: u64,
}

/// Sync and retry configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    /// Initial backoff delay for failed background jobs, in seconds
    pub retry_base_secs: u64,
    /// Backoff cap, in seconds
    pub retry_max_secs: u64,
    /// Give up after this many failed attempts (0 = retry forever)
    pub retry_max_attempts: u32,
}

/// Local storage configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct StorageConfig {
    /// Override for the sqlite database URL; defaults to a file under the
    /// platform data directory
    pub database_url: Option<String>,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Enable logging
    pub enabled: bool,
    /// Log level: "error", "warn", "info", "debug" or "trace"
    pub level: String,
    /// Log to this file instead of stderr
    pub file: Option<PathBuf>,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
        }
    }
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            retry_base_secs: 30,
            retry_max_secs: 3600,
            retry_max_attempts: 8,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            level: "info".to_string(),
            file: None,
        }
    }
}

impl StorageConfig {
    /// Resolve the database URL, falling back to the platform data directory.
    pub fn database_url(&self) -> Result<String> {
        if let Some(url) = &self.database_url {
            return Ok(url.clone());
        }

        let data_dir = dirs::data_dir()
            .context("Could not determine data directory")?
            .join("modalist");
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {}", data_dir.display()))?;

        Ok(format!("sqlite://{}?mode=rwc", data_dir.join("modalist.db").display()))
    }
}

impl Config {
    /// Load configuration from file or return defaults
    pub fn load() -> Result<Self> {
        let config_path = Self::find_config_file()?;

        if let Some(path) = config_path {
            Self::load_from_file(&path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.as_ref().display()))?;

        let config: Config = toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.as_ref().display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Locate the config file in the platform config directory
    fn find_config_file() -> Result<Option<PathBuf>> {
        let Some(config_dir) = dirs::config_dir() else {
            return Ok(None);
        };

        let path = config_dir.join("modalist").join("config.toml");
        if path.exists() {
            Ok(Some(path))
        } else {
            Ok(None)
        }
    }

    /// Write a default configuration file at the given path, creating parent
    /// directories as needed
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {}", parent.display()))?;
        }

        let content = toml::to_string_pretty(&Config::default())?;
        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {}", path.display()))?;
        Ok(())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.is_empty() {
            anyhow::bail!("backend.base_url must not be empty");
        }
        if self.backend.timeout_secs == 0 {
            anyhow::bail!("backend.timeout_secs must be at least 1");
        }
        if self.sync.retry_base_secs == 0 {
            anyhow::bail!("sync.retry_base_secs must be at least 1");
        }
        if self.sync.retry_max_secs < self.sync.retry_base_secs {
            anyhow::bail!("sync.retry_max_secs must be >= sync.retry_base_secs");
        }
        self.logging
            .level
            .parse::<log::LevelFilter>()
            .map_err(|_| anyhow::anyhow!("logging.level '{}' is not a valid level", self.logging.level))?;
        Ok(())
    }
}
