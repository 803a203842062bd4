//! Configuration error types.

use thiserror::Error;

/// Configuration loading error.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    ReadFile(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("endpoint is required (set `endpoint` or the RENOVATE_ENDPOINT env var)")]
    MissingEndpoint,
    #[error("invalid endpoint {endpoint:?}: {reason}")]
    InvalidEndpoint { endpoint: String, reason: String },
    #[error("invalid value for {var}: {value:?}")]
    InvalidOverride { var: String, value: String },
    #[error("validation failed: {0}")]
    Validation(String),
}
