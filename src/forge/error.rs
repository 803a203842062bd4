//! Forge errors.

use thiserror::Error;

use crate::hosts::AuthError;

/// Errors returned by forge operations.
#[derive(Debug, Error)]
pub enum ForgeError {
    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("request error: {0}")]
    Request(#[from] reqwest::Error),

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("forge api error {status}: {message}")]
    Api { status: u16, message: String },

    #[error("repository {0} has no default branch")]
    MissingDefaultBranch(String),
}

impl ForgeError {
    /// Returns true for API responses with the given HTTP status.
    pub fn is_status(&self, status: u16) -> bool {
        matches!(self, ForgeError::Api { status: s, .. } if *s == status)
    }
}

/// Result type for forge operations.
pub type Result<T> = std::result::Result<T, ForgeError>;
