//! Coordinator error types.

use crate::forge::ForgeError;

use super::UpdateError;

/// Coordinator error type.
#[derive(Debug, thiserror::Error)]
pub enum CoordinatorError {
    #[error("coordinator is already running")]
    AlreadyRunning,
    #[error("forge error: {0}")]
    Forge(#[from] ForgeError),
    #[error(transparent)]
    Update(#[from] UpdateError),
}
