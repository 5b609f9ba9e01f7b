//! Error types for the placeholder autocomplete

use thiserror::Error;

/// Errors that can occur while resolving or configuring suggestions
#[derive(Debug, Error)]
pub enum SuggestError {
    /// The asynchronous candidate fetcher failed
    #[error("Candidate fetch failed: {0}")]
    FetchError(String),

    /// Configuration was rejected during validation
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// The driver's event channel was closed
    #[error("Session driver is no longer running")]
    DriverClosed,

    /// IO error
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    YamlError(#[from] serde_yaml::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    JsonError(#[from] serde_json::Error),
}

impl SuggestError {
    /// Create a new FetchError with context
    pub fn fetch_error(msg: impl Into<String>) -> Self {
        Self::FetchError(msg.into())
    }

    /// Create a new ConfigError with context
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::ConfigError(msg.into())
    }
}

/// Result type for suggestion operations
pub type SuggestResult<T> = Result<T, SuggestError>;
