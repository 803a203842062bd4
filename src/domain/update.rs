//! Dependency update domain model.

use super::{FileChange, PullRequest, PullRequestKind};

/// A pending dependency bump reported by an update source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Update {
    pub dependency: String,
    pub current_version: String,
    pub new_version: String,
    /// Files rewritten by the bump.
    pub files: Vec<FileChange>,
}

impl Update {
    /// Branch name for this update, e.g. "renovate/serde-1.0.200".
    pub fn branch_name(&self, prefix: &str) -> String {
        format!(
            "{}{}-{}",
            prefix,
            sanitize_branch_segment(&self.dependency),
            sanitize_branch_segment(&self.new_version)
        )
    }

    /// Builds the pull request proposing this update.
    pub fn to_pull_request(&self, branch_prefix: &str) -> PullRequest {
        PullRequest {
            kind: PullRequestKind::Update,
            title: format!("Update {} to {}", self.dependency, self.new_version),
            body: format!(
                "Updates `{}` from `{}` to `{}`.",
                self.dependency, self.current_version, self.new_version
            ),
            branch: self.branch_name(branch_prefix),
            files: self.files.clone(),
        }
    }
}

/// Lowercases and replaces anything git refs dislike with '-'.
fn sanitize_branch_segment(s: &str) -> String {
    s.trim()
        .to_lowercase()
        .chars()
        .map(|c| match c {
            'a'..='z' | '0'..='9' | '.' | '_' | '-' => c,
            _ => '-',
        })
        .collect::<String>()
        .trim_matches('-')
        .to_string()
}
