//! Credential resolution errors.

use thiserror::Error;

/// Raised when a credentialed request cannot be authenticated.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("no host rule matches {host}")]
    NoMatchingRule { host: String },
    #[error("host rule {match_host} has no token")]
    MissingToken { match_host: String },
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}
