//! Configuration management for the remote record service

use crate::error::{Result, TaskflowError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use taskflow_common::{
    DEFAULT_PROJECT_PAGE_SIZE, DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_TASK_PAGE_SIZE,
    ENV_API_URL, ENV_LOG_LEVEL, ENV_PROJECT_ID, ENV_PROJECT_PAGE_SIZE, ENV_PUBLIC_KEY,
    ENV_REQUEST_TIMEOUT_SECS, ENV_TASK_PAGE_SIZE, MAX_PAGE_SIZE,
};

const VALID_LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Configuration for talking to the remote record service
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskflowConfig {
    /// Base URL of the record API
    pub api_url: String,
    /// Project identifier sent with every request
    pub project_id: String,
    /// Public key sent with every request
    pub public_key: String,
    /// Page size for task fetches
    pub task_page_size: u32,
    /// Page size for project fetches
    pub project_page_size: u32,
    /// Per-request timeout in seconds
    pub request_timeout_secs: u64,
    /// Log level (trace, debug, info, warn, error)
    pub log_level: String,
}

impl Default for TaskflowConfig {
    fn default() -> Self {
        Self {
            api_url: "http://localhost:8080/api".to_string(),
            project_id: String::new(),
            public_key: String::new(),
            task_page_size: DEFAULT_TASK_PAGE_SIZE,
            project_page_size: DEFAULT_PROJECT_PAGE_SIZE,
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            log_level: "info".to_string(),
        }
    }
}

/// A configuration source where every setting is optional
///
/// Files, the environment and command-line flags each produce one of these;
/// they are layered onto a [`TaskflowConfig`] with [`TaskflowConfig::merge_with`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PartialConfig {
    pub api_url: Option<String>,
    pub project_id: Option<String>,
    pub public_key: Option<String>,
    pub task_page_size: Option<u32>,
    pub project_page_size: Option<u32>,
    pub request_timeout_secs: Option<u64>,
    pub log_level: Option<String>,
}

impl PartialConfig {
    /// Read settings from `TASKFLOW_*` environment variables
    ///
    /// # Errors
    /// Returns `TaskflowError::Configuration` if a numeric variable does not parse
    pub fn from_env() -> Result<Self> {
        Ok(Self {
            api_url: std::env::var(ENV_API_URL).ok(),
            project_id: std::env::var(ENV_PROJECT_ID).ok(),
            public_key: std::env::var(ENV_PUBLIC_KEY).ok(),
            task_page_size: parse_env(ENV_TASK_PAGE_SIZE)?,
            project_page_size: parse_env(ENV_PROJECT_PAGE_SIZE)?,
            request_timeout_secs: parse_env(ENV_REQUEST_TIMEOUT_SECS)?,
            log_level: std::env::var(ENV_LOG_LEVEL).ok(),
        })
    }

    /// Load settings from a YAML (`.yaml`/`.yml`) or JSON file
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            TaskflowError::Io(std::io::Error::other(format!(
                "Failed to read config file {}: {e}",
                path.display()
            )))
        })?;

        let is_yaml = matches!(
            path.extension().and_then(|s| s.to_str()),
            Some("yaml" | "yml")
        );

        if is_yaml {
            serde_yaml::from_str(&content).map_err(|e| {
                TaskflowError::configuration(format!("Failed to parse YAML config: {e}"))
            })
        } else {
            serde_json::from_str(&content).map_err(|e| {
                TaskflowError::configuration(format!("Failed to parse JSON config: {e}"))
            })
        }
    }

    /// Whether no setting is present
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn parse_env<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(value) => value
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| TaskflowError::configuration(format!("Invalid {name} value: {value}"))),
        Err(_) => Ok(None),
    }
}

impl TaskflowConfig {
    /// Create a configuration for the given endpoint and credentials
    #[must_use]
    pub fn new(
        api_url: impl Into<String>,
        project_id: impl Into<String>,
        public_key: impl Into<String>,
    ) -> Self {
        Self {
            api_url: api_url.into(),
            project_id: project_id.into(),
            public_key: public_key.into(),
            ..Self::default()
        }
    }

    /// Defaults overlaid with `TASKFLOW_*` environment variables
    ///
    /// # Errors
    /// Returns `TaskflowError::Configuration` if a numeric variable does not parse
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.merge_with(&PartialConfig::from_env()?);
        Ok(config)
    }

    /// Overlay every setting present in `other`
    pub fn merge_with(&mut self, other: &PartialConfig) {
        if let Some(api_url) = &other.api_url {
            self.api_url.clone_from(api_url);
        }
        if let Some(project_id) = &other.project_id {
            self.project_id.clone_from(project_id);
        }
        if let Some(public_key) = &other.public_key {
            self.public_key.clone_from(public_key);
        }
        if let Some(size) = other.task_page_size {
            self.task_page_size = size;
        }
        if let Some(size) = other.project_page_size {
            self.project_page_size = size;
        }
        if let Some(timeout) = other.request_timeout_secs {
            self.request_timeout_secs = timeout;
        }
        if let Some(level) = &other.log_level {
            self.log_level = level.to_lowercase();
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    /// Returns `TaskflowError::Configuration` describing the first invalid setting
    pub fn validate(&self) -> Result<()> {
        if self.api_url.trim().is_empty() {
            return Err(TaskflowError::configuration("API URL cannot be empty"));
        }
        if !(self.api_url.starts_with("http://") || self.api_url.starts_with("https://")) {
            return Err(TaskflowError::configuration(format!(
                "API URL must start with http:// or https://: {}",
                self.api_url
            )));
        }
        if self.project_id.trim().is_empty() {
            return Err(TaskflowError::configuration("Project id cannot be empty"));
        }
        if self.public_key.trim().is_empty() {
            return Err(TaskflowError::configuration("Public key cannot be empty"));
        }
        for (name, size) in [
            ("Task page size", self.task_page_size),
            ("Project page size", self.project_page_size),
        ] {
            if size == 0 || size > MAX_PAGE_SIZE {
                return Err(TaskflowError::configuration(format!(
                    "{name} must be between 1 and {MAX_PAGE_SIZE}, got {size}"
                )));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err(TaskflowError::configuration(
                "Request timeout must be greater than 0",
            ));
        }
        if !VALID_LOG_LEVELS.contains(&self.log_level.as_str()) {
            return Err(TaskflowError::configuration(format!(
                "Invalid log level: {}. Must be one of: {}",
                self.log_level,
                VALID_LOG_LEVELS.join(", ")
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn valid_config() -> TaskflowConfig {
        TaskflowConfig::new("https://records.example.com/api", "proj-1", "pk-1")
    }

    #[test]
    fn test_default_config() {
        let config = TaskflowConfig::default();
        assert_eq!(config.task_page_size, 100);
        assert_eq!(config.project_page_size, 50);
        assert_eq!(config.log_level, "info");
        assert!(config.project_id.is_empty());
    }

    #[test]
    fn test_default_config_needs_credentials() {
        let error = TaskflowConfig::default().validate().unwrap_err();
        assert!(error.to_string().contains("Project id"));
    }

    #[test]
    fn test_valid_config() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn test_validate_rejects_bad_settings() {
        let cases = [
            TaskflowConfig {
                api_url: "  ".to_string(),
                ..valid_config()
            },
            TaskflowConfig {
                api_url: "ftp://example.com".to_string(),
                ..valid_config()
            },
            TaskflowConfig {
                public_key: String::new(),
                ..valid_config()
            },
            TaskflowConfig {
                task_page_size: 0,
                ..valid_config()
            },
            TaskflowConfig {
                project_page_size: MAX_PAGE_SIZE + 1,
                ..valid_config()
            },
            TaskflowConfig {
                request_timeout_secs: 0,
                ..valid_config()
            },
            TaskflowConfig {
                log_level: "verbose".to_string(),
                ..valid_config()
            },
        ];

        for config in cases {
            assert!(config.validate().is_err(), "{config:?} should be invalid");
        }
    }

    #[test]
    fn test_merge_with_only_overrides_present_settings() {
        let mut config = valid_config();
        config.merge_with(&PartialConfig {
            task_page_size: Some(25),
            log_level: Some("DEBUG".to_string()),
            ..PartialConfig::default()
        });

        assert_eq!(config.task_page_size, 25);
        assert_eq!(config.log_level, "debug");
        assert_eq!(config.project_id, "proj-1");
        assert_eq!(config.project_page_size, 50);
    }

    #[test]
    fn test_partial_from_yaml_file() {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile().unwrap();
        writeln!(file, "project_id: from-yaml\ntask_page_size: 20").unwrap();

        let partial = PartialConfig::from_file(file.path()).unwrap();
        assert_eq!(partial.project_id.as_deref(), Some("from-yaml"));
        assert_eq!(partial.task_page_size, Some(20));
        assert!(partial.api_url.is_none());
    }

    #[test]
    fn test_partial_from_json_file() {
        let mut file = tempfile::Builder::new().suffix(".json").tempfile().unwrap();
        write!(file, r#"{{"public_key": "pk-json"}}"#).unwrap();

        let partial = PartialConfig::from_file(file.path()).unwrap();
        assert_eq!(partial.public_key.as_deref(), Some("pk-json"));
    }

    #[test]
    fn test_partial_from_invalid_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let error = PartialConfig::from_file(file.path()).unwrap_err();
        assert!(matches!(error, TaskflowError::Configuration { .. }));
    }

    #[test]
    fn test_partial_from_missing_file() {
        let error = PartialConfig::from_file("/nonexistent/taskflow.yaml").unwrap_err();
        assert!(matches!(error, TaskflowError::Io(_)));
    }

    #[test]
    fn test_partial_is_empty() {
        assert!(PartialConfig::default().is_empty());
        assert!(!PartialConfig {
            api_url: Some("x".to_string()),
            ..PartialConfig::default()
        }
        .is_empty());
    }

    #[test]
    #[serial]
    fn test_config_from_env() {
        std::env::set_var(ENV_PROJECT_ID, "env-project");
        std::env::set_var(ENV_PUBLIC_KEY, "env-key");
        std::env::set_var(ENV_TASK_PAGE_SIZE, "42");

        let config = TaskflowConfig::from_env().unwrap();

        std::env::remove_var(ENV_PROJECT_ID);
        std::env::remove_var(ENV_PUBLIC_KEY);
        std::env::remove_var(ENV_TASK_PAGE_SIZE);

        assert_eq!(config.project_id, "env-project");
        assert_eq!(config.public_key, "env-key");
        assert_eq!(config.task_page_size, 42);
        assert_eq!(config.project_page_size, 50);
    }

    #[test]
    #[serial]
    fn test_config_from_env_invalid_number() {
        std::env::set_var(ENV_PROJECT_PAGE_SIZE, "lots");
        let result = TaskflowConfig::from_env();
        std::env::remove_var(ENV_PROJECT_PAGE_SIZE);

        let error = result.unwrap_err();
        assert!(error.to_string().contains(ENV_PROJECT_PAGE_SIZE));
    }
}
