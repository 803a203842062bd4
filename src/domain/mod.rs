//! Domain models for repositories and the pull requests opened on them.

mod pull_request;
mod repository;
mod update;

pub use pull_request::{FileChange, PullRequest, PullRequestKind, PullRequestRef};
pub use repository::{ParseRepositoryError, Repository};
pub use update::Update;
