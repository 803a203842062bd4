//! Pull request domain model.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Why a pull request is being opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PullRequestKind {
    /// Proposes bot configuration for an unmanaged repository.
    Onboarding,
    /// Bumps a dependency.
    Update,
}

impl fmt::Display for PullRequestKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PullRequestKind::Onboarding => write!(f, "onboarding"),
            PullRequestKind::Update => write!(f, "update"),
        }
    }
}

/// A file written on the PR branch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileChange {
    pub path: String,
    pub content: String,
}

impl FileChange {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }
}

/// A pull request to be created.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PullRequest {
    pub kind: PullRequestKind,
    pub title: String,
    pub body: String,
    /// Head branch, created from the repository's default branch.
    pub branch: String,
    pub files: Vec<FileChange>,
}

/// A pull request as created on the forge.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct PullRequestRef {
    pub number: u64,
    #[serde(default, rename = "html_url")]
    pub url: String,
}
