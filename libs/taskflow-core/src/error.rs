//! Error types for the TaskFlow core library

use thiserror::Error;

/// Result type alias for TaskFlow operations
pub type Result<T> = std::result::Result<T, TaskflowError>;

/// A single record the remote service refused inside a batch call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFailure {
    /// Record id, when the failing item carried one (update/delete)
    pub record_id: Option<i64>,
    /// Record-level message reported by the service
    pub message: Option<String>,
    /// Field-level details as `(field label, message)`
    pub field_errors: Vec<(String, String)>,
}

impl RecordFailure {
    /// Human readable summary of this failure
    #[must_use]
    pub fn summary(&self) -> String {
        if !self.field_errors.is_empty() {
            return self
                .field_errors
                .iter()
                .map(|(field, message)| format!("{field}: {message}"))
                .collect::<Vec<_>>()
                .join("; ");
        }
        self.message
            .clone()
            .unwrap_or_else(|| "no detail reported".to_string())
    }
}

/// Main error type for TaskFlow operations
#[derive(Error, Debug)]
pub enum TaskflowError {
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Remote service error: {message}")]
    Remote { message: String },

    #[error("{operation} failed for {} record(s)", .failures.len())]
    BatchFailure {
        operation: String,
        failures: Vec<RecordFailure>,
    },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid record id: {id}")]
    InvalidId { id: String },

    #[error("Task not found: {id}")]
    TaskNotFound { id: String },

    #[error("Project not found: {id}")]
    ProjectNotFound { id: String },

    #[error("Validation error: {message}")]
    Validation { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Unknown error: {message}")]
    Unknown { message: String },
}

impl TaskflowError {
    /// Create a transport error
    pub fn transport(message: impl Into<String>) -> Self {
        Self::Transport(message.into())
    }

    /// Create a remote service error
    pub fn remote(message: impl Into<String>) -> Self {
        Self::Remote {
            message: message.into(),
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
        }
    }

    /// Create an unknown error
    pub fn unknown(message: impl Into<String>) -> Self {
        Self::Unknown {
            message: message.into(),
        }
    }

    /// Whether the error was raised before any request left the process
    #[must_use]
    pub fn is_client_side(&self) -> bool {
        matches!(
            self,
            Self::Validation { .. } | Self::InvalidId { .. } | Self::Configuration { .. }
        )
    }
}

#[cfg(feature = "http-client")]
impl From<reqwest::Error> for TaskflowError {
    fn from(error: reqwest::Error) -> Self {
        Self::Transport(error.to_string())
    }
}

impl From<serde_yaml::Error> for TaskflowError {
    fn from(error: serde_yaml::Error) -> Self {
        Self::configuration(format!("Invalid YAML: {error}"))
    }
}
