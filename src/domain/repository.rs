//! Repository domain model.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A repository name that is not in "owner/name" form.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid repository name {0:?}, expected owner/name")]
pub struct ParseRepositoryError(pub String);

/// A repository on the forge, addressed as "owner/name".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub owner: String,
    pub name: String,
    /// Branch PRs are opened against. `None` until fetched from the forge.
    pub default_branch: Option<String>,
    /// Archived repositories are never updated.
    #[serde(default)]
    pub archived: bool,
}

impl Repository {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
            default_branch: None,
            archived: false,
        }
    }

    pub fn with_default_branch(mut self, branch: impl Into<String>) -> Self {
        self.default_branch = Some(branch.into());
        self
    }

    /// Returns "owner/name".
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.name)
    }

    /// Returns true when `pattern` selects this repository.
    ///
    /// Patterns are a full name ("org/app"), an owner wildcard ("org/*") or
    /// a bare "*". Matching ignores case.
    pub fn matches_filter(&self, pattern: &str) -> bool {
        let pattern = pattern.trim().to_lowercase();
        let full_name = self.full_name().to_lowercase();
        match pattern.strip_suffix('*') {
            Some(prefix) => full_name.starts_with(prefix),
            None => full_name == pattern,
        }
    }
}

impl fmt::Display for Repository {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

impl FromStr for Repository {
    type Err = ParseRepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.split_once('/') {
            Some((owner, name)) if !owner.is_empty() && !name.is_empty() && !name.contains('/') => {
                Ok(Repository::new(owner, name))
            }
            _ => Err(ParseRepositoryError(s.to_string())),
        }
    }
}
