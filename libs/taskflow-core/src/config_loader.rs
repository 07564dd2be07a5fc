//! Configuration Loader
//!
//! Layers configuration sources with precedence
//! defaults < config files < environment < explicit overrides.

use crate::config::{PartialConfig, TaskflowConfig};
use crate::error::Result;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const CONFIG_FILE_NAMES: &[&str] = &["taskflow.yaml", "taskflow.yml", "taskflow.json"];

/// Configuration loader that handles multiple sources with precedence
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Base configuration
    base_config: TaskflowConfig,
    /// Optional configuration files, tried in order; unreadable ones are skipped
    config_paths: Vec<PathBuf>,
    /// Configuration files that must load
    required_paths: Vec<PathBuf>,
    /// Whether to load from environment variables
    load_from_env: bool,
    /// Explicit overrides applied last
    overrides: PartialConfig,
    /// Whether to validate the final configuration
    validate: bool,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader
    #[must_use]
    pub fn new() -> Self {
        Self {
            base_config: TaskflowConfig::default(),
            config_paths: Self::get_default_config_paths(),
            required_paths: Vec::new(),
            load_from_env: true,
            overrides: PartialConfig::default(),
            validate: true,
        }
    }

    /// Set the base configuration
    #[must_use]
    pub fn with_base_config(mut self, config: TaskflowConfig) -> Self {
        self.base_config = config;
        self
    }

    /// Set the optional configuration file paths
    #[must_use]
    pub fn with_config_paths<P: AsRef<Path>>(mut self, paths: Vec<P>) -> Self {
        self.config_paths = paths
            .into_iter()
            .map(|p| p.as_ref().to_path_buf())
            .collect();
        self
    }

    /// Add a configuration file that must exist and parse
    #[must_use]
    pub fn require_config_file<P: AsRef<Path>>(mut self, path: P) -> Self {
        self.required_paths.push(path.as_ref().to_path_buf());
        self
    }

    /// Enable or disable loading from environment variables
    #[must_use]
    pub fn with_env_loading(mut self, enabled: bool) -> Self {
        self.load_from_env = enabled;
        self
    }

    /// Set explicit overrides, typically from command-line flags
    #[must_use]
    pub fn with_overrides(mut self, overrides: PartialConfig) -> Self {
        self.overrides = overrides;
        self
    }

    /// Enable or disable configuration validation
    #[must_use]
    pub fn with_validation(mut self, enabled: bool) -> Self {
        self.validate = enabled;
        self
    }

    /// Load configuration from all sources
    ///
    /// # Errors
    /// Returns an error if a required file cannot be loaded, an environment
    /// variable is malformed, or the final configuration is invalid
    pub fn load(&self) -> Result<TaskflowConfig> {
        let mut config = self.base_config.clone();
        debug!("Starting configuration loading");

        for path in &self.config_paths {
            if !path.exists() {
                debug!("Configuration file not found: {}", path.display());
                continue;
            }
            match PartialConfig::from_file(path) {
                Ok(file_config) => {
                    config.merge_with(&file_config);
                    info!("Loaded configuration from: {}", path.display());
                }
                Err(e) => {
                    warn!("Skipping configuration file {}: {}", path.display(), e);
                }
            }
        }

        for path in &self.required_paths {
            config.merge_with(&PartialConfig::from_file(path)?);
            info!("Loaded configuration from: {}", path.display());
        }

        if self.load_from_env {
            let env_config = PartialConfig::from_env()?;
            if !env_config.is_empty() {
                debug!("Applying configuration from environment variables");
                config.merge_with(&env_config);
            }
        }

        config.merge_with(&self.overrides);

        if self.validate {
            config.validate()?;
            debug!("Configuration validation passed");
        }

        Ok(config)
    }

    /// Get the default configuration file paths to try
    #[must_use]
    pub fn get_default_config_paths() -> Vec<PathBuf> {
        let user_dir = Self::get_user_config_dir();
        CONFIG_FILE_NAMES
            .iter()
            .map(PathBuf::from)
            .chain(CONFIG_FILE_NAMES.iter().map(|name| user_dir.join(name)))
            .collect()
    }

    /// Get the user configuration directory
    #[must_use]
    pub fn get_user_config_dir() -> PathBuf {
        if let Ok(home) = std::env::var("HOME") {
            PathBuf::from(home).join(".config").join("taskflow")
        } else if let Ok(userprofile) = std::env::var("USERPROFILE") {
            PathBuf::from(userprofile)
                .join("AppData")
                .join("Roaming")
                .join("taskflow")
        } else {
            PathBuf::from("~/.config/taskflow")
        }
    }
}

/// Load configuration from the default locations, the environment and
/// `overrides`
///
/// # Errors
/// Returns an error if the resulting configuration is invalid
pub fn load_config(overrides: PartialConfig) -> Result<TaskflowConfig> {
    ConfigLoader::new().with_overrides(overrides).load()
}
