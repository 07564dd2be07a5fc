//! Tracing subscriber setup for the CLI
//!
//! Logs go to stderr so command output on stdout stays machine readable.

use thiserror::Error;
use tracing::debug;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Error types for logging setup
#[derive(Error, Debug)]
pub enum LoggingError {
    #[error("Invalid log filter: {0}")]
    InvalidFilter(String),

    #[error("Failed to install subscriber: {0}")]
    Install(String),
}

/// Result type for logging setup
pub type Result<T> = std::result::Result<T, LoggingError>;

/// Filter from `RUST_LOG`, falling back to `level`
///
/// # Errors
/// Returns `LoggingError::InvalidFilter` if `RUST_LOG` is unset and `level`
/// is not a valid filter directive
pub fn build_filter(level: &str) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => {
            EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter(e.to_string()))
        }
    }
}

/// Install the global subscriber
///
/// # Errors
/// Returns an error if the filter is invalid or a subscriber is already set
pub fn init_logging(level: &str, json_format: bool) -> Result<()> {
    let filter = build_filter(level)?;
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if json_format {
        registry
            .with(
                fmt::layer()
                    .json()
                    .with_writer(std::io::stderr)
                    .with_current_span(true)
                    .with_target(true),
            )
            .try_init()
    } else {
        registry
            .with(
                fmt::layer()
                    .with_writer(std::io::stderr)
                    .with_target(true),
            )
            .try_init()
    };
    installed.map_err(|e| LoggingError::Install(e.to_string()))?;

    debug!("Logging initialized at {}", level);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn test_build_filter_uses_level() {
        std::env::remove_var("RUST_LOG");
        let filter = build_filter("debug").unwrap();
        assert_eq!(filter.to_string(), "debug");
    }

    #[test]
    #[serial]
    fn test_build_filter_prefers_rust_log() {
        std::env::set_var("RUST_LOG", "warn");
        let filter = build_filter("debug").unwrap();
        std::env::remove_var("RUST_LOG");
        assert_eq!(filter.to_string(), "warn");
    }

    #[test]
    fn test_error_messages() {
        let error = LoggingError::InvalidFilter("bad directive".to_string());
        assert_eq!(error.to_string(), "Invalid log filter: bad directive");
    }
}
