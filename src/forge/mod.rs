//! Forge abstraction and implementations.

mod error;
mod forgejo;
mod http;

pub use error::{ForgeError, Result};
pub use forgejo::ForgejoForge;
pub use http::AuthenticatedClient;

use async_trait::async_trait;

use crate::domain::{PullRequest, PullRequestRef, Repository};

/// Forge defines what the coordinator needs from a source-control platform.
#[async_trait]
pub trait Forge: Send + Sync {
    /// Name returns the platform identifier (e.g. "forgejo").
    fn name(&self) -> &str;

    /// DiscoverRepositories lists every repository the token can update.
    /// Archived, mirrored and read-only repositories are excluded.
    async fn discover_repositories(&self) -> Result<Vec<Repository>>;

    /// GetRepository fetches metadata (default branch, archived flag) for a
    /// repository known only by name.
    async fn get_repository(&self, repo: &Repository) -> Result<Repository>;

    /// HasOnboardingConfig returns true if any of `files` exists on the
    /// default branch.
    async fn has_onboarding_config(&self, repo: &Repository, files: &[String]) -> Result<bool>;

    /// FindOpenPullRequest returns the open PR whose head is `branch`.
    async fn find_open_pull_request(
        &self,
        repo: &Repository,
        branch: &str,
    ) -> Result<Option<PullRequestRef>>;

    /// CreatePullRequest pushes the PR's files to a new branch and opens a
    /// PR against the default branch.
    async fn create_pull_request(&self, repo: &Repository, pr: &PullRequest) -> Result<PullRequestRef>;
}
