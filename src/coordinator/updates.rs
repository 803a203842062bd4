//! Seam for update detection.
//!
//! Working out which dependencies are outdated is not the coordinator's
//! job; it asks an [`UpdateSource`] per onboarded repository.

use async_trait::async_trait;

use crate::domain::{Repository, Update};

/// Error reported by an update source.
#[derive(Debug, Clone, thiserror::Error)]
#[error("update source error: {message}")]
pub struct UpdateError {
    pub message: String,
}

impl UpdateError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Produces the pending dependency updates for a repository.
#[async_trait]
pub trait UpdateSource: Send + Sync {
    async fn pending_updates(&self, repo: &Repository) -> Result<Vec<Update>, UpdateError>;
}

/// Reports nothing to update; only onboarding PRs get opened.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoUpdates;

#[async_trait]
impl UpdateSource for NoUpdates {
    async fn pending_updates(&self, _repo: &Repository) -> Result<Vec<Update>, UpdateError> {
        Ok(Vec::new())
    }
}
