//! # Unified Configuration System
//!
//! This module consolidates all configuration structures into a single,
//! coherent system covering process supervision, the asset cache and the
//! frame driver.
//!
//! ## Design Goals
//!
//! - **Centralized**: All configuration types in one place for easy discovery
//! - **Serializable**: Support for multiple config file formats (TOML, RON)
//! - **Type Safe**: Strong typing with validation and defaults
//!
//! Every struct is `#[serde(default)]`, so a config file only needs to name
//! the values it overrides.

use serde::{Deserialize, Serialize};

// Re-export from the old config module for compatibility
pub use crate::config::{Config, ConfigError};

use crate::process::Timeout;

/// # Process Configuration
///
/// Defaults applied to supervised processes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessConfig {
    /// Timeout applied when a caller does not pick one, in seconds.
    /// Negative means "never times out".
    pub default_timeout_secs: f64,
}

impl ProcessConfig {
    /// Create a process configuration with the 30 second default timeout
    pub fn new() -> Self {
        Self {
            default_timeout_secs: Timeout::DEFAULT_SECS,
        }
    }

    /// Set the default timeout
    pub fn with_default_timeout(mut self, secs: f64) -> Self {
        self.default_timeout_secs = secs;
        self
    }

    /// Default timeout as a typed value
    pub fn default_timeout(&self) -> Timeout {
        Timeout::from_secs(self.default_timeout_secs)
    }
}

impl Default for ProcessConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Asset Configuration
///
/// Configuration for asset fetching and the parsed-asset cache.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetConfig {
    /// Maximum number of parsed assets kept in the cache
    pub cache_capacity: usize,
    /// Transport endpoint used when a load does not name one
    pub default_endpoint: String,
    /// Root directory served by the file transport
    pub assets_dir: String,
    /// Timeout for asset load processes, in seconds (negative = never)
    pub load_timeout_secs: f64,
}

impl AssetConfig {
    /// Create a new asset configuration
    pub fn new() -> Self {
        Self {
            cache_capacity: 256,
            default_endpoint: String::new(),
            assets_dir: "assets".to_string(),
            load_timeout_secs: Timeout::DEFAULT_SECS,
        }
    }

    /// Set the cache capacity
    pub fn with_cache_capacity(mut self, capacity: usize) -> Self {
        self.cache_capacity = capacity;
        self
    }

    /// Set the default transport endpoint
    pub fn with_default_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.default_endpoint = endpoint.into();
        self
    }

    /// Set assets directory
    pub fn with_assets_dir(mut self, dir: impl Into<String>) -> Self {
        self.assets_dir = dir.into();
        self
    }

    /// Set the load timeout
    pub fn with_load_timeout(mut self, secs: f64) -> Self {
        self.load_timeout_secs = secs;
        self
    }

    /// Load timeout as a typed value
    pub fn load_timeout(&self) -> Timeout {
        Timeout::from_secs(self.load_timeout_secs)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.cache_capacity == 0 {
            return Err(ConfigError::Invalid(
                "Asset cache capacity must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

impl Default for AssetConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Engine Configuration
///
/// Core engine behavior configuration: logging and frame driving.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Log level for the engine
    pub log_level: String,
    /// Whether process notifications are written to the log
    pub log_process_events: bool,
    /// Stop the main loop after this many frames
    pub max_frames: Option<u64>,
}

impl EngineConfig {
    /// Create a new engine configuration
    pub fn new() -> Self {
        Self {
            log_level: "info".to_string(),
            log_process_events: true,
            max_frames: None, // Run until the application quits
        }
    }

    /// Set log level
    pub fn with_log_level(mut self, level: impl Into<String>) -> Self {
        self.log_level = level.into();
        self
    }

    /// Enable or disable logging of process notifications
    pub fn with_process_logging(mut self, enabled: bool) -> Self {
        self.log_process_events = enabled;
        self
    }

    /// Limit the number of frames the main loop runs
    pub fn with_max_frames(mut self, frames: u64) -> Self {
        self.max_frames = Some(frames);
        self
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.log_level
            .parse::<log::LevelFilter>()
            .map(|_| ())
            .map_err(|_| ConfigError::Invalid(format!("Unknown log level: {}", self.log_level)))
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// # Complete Application Configuration
///
/// Top-level configuration that encompasses all engine subsystems.
/// This is the main configuration structure applications should use.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApplicationConfig {
    /// Engine core configuration
    pub engine: EngineConfig,
    /// Process supervision configuration
    pub processes: ProcessConfig,
    /// Asset system configuration
    pub assets: AssetConfig,
}

impl ApplicationConfig {
    /// Create a new application configuration with defaults
    pub fn new() -> Self {
        Self::default()
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.engine.validate()?;
        self.assets.validate()?;
        Ok(())
    }
}

impl Config for ApplicationConfig {}
