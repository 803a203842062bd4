//! Forgejo / Gitea REST v1 implementation of [`Forge`].

use async_trait::async_trait;
use base64::Engine;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::http::AuthenticatedClient;
use super::{Forge, ForgeError, Result};
use crate::config::Config;
use crate::domain::{PullRequest, PullRequestKind, PullRequestRef, Repository};
use crate::hosts::HostRules;

/// Repositories requested per search page.
const PAGE_SIZE: usize = 50;

/// Hard stop for pagination.
const MAX_PAGES: usize = 200;

/// Forgejo (and Gitea) API client.
pub struct ForgejoForge {
    client: AuthenticatedClient,
    api_url: String,
    name: String,
}

impl ForgejoForge {
    /// `endpoint` is the instance base URL without `/api/v1`.
    pub fn new(endpoint: &str, client: AuthenticatedClient) -> Self {
        Self {
            client,
            api_url: format!("{}/api/v1", endpoint.trim_end_matches('/')),
            name: "forgejo".to_string(),
        }
    }

    /// Creates the forge client from the configuration's endpoint and host rules.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = AuthenticatedClient::new(HostRules::from_config(config), config.request_timeout)?;
        let mut forge = Self::new(&config.endpoint, client);
        forge.name = config.platform.to_string();
        Ok(forge)
    }

    pub fn api_url(&self) -> &str {
        &self.api_url
    }

    fn repo_url(&self, repo: &Repository, path: &str) -> String {
        format!(
            "{}/repos/{}/{}{}",
            self.api_url,
            urlencoding::encode(&repo.owner),
            urlencoding::encode(&repo.name),
            path
        )
    }

    fn contents_url(&self, repo: &Repository, file: &str) -> String {
        let encoded: Vec<String> = file
            .trim_matches('/')
            .split('/')
            .map(|segment| urlencoding::encode(segment).into_owned())
            .collect();
        self.repo_url(repo, &format!("/contents/{}", encoded.join("/")))
    }

    /// Returns the blob sha of `file` on `branch`, or `None` when absent.
    async fn file_sha(&self, repo: &Repository, file: &str, branch: &str) -> Result<Option<String>> {
        #[derive(Deserialize)]
        struct ContentsResponse {
            sha: String,
        }

        let url = format!(
            "{}?ref={}",
            self.contents_url(repo, file),
            urlencoding::encode(branch)
        );
        match self.client.get_json::<ContentsResponse>(&url).await {
            Ok(contents) => Ok(Some(contents.sha)),
            Err(e) if e.is_status(404) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Writes the PR's files to a new branch forked from `base`.
    async fn push_branch(&self, repo: &Repository, pr: &PullRequest, base: &str) -> Result<()> {
        let mut files = Vec::with_capacity(pr.files.len());
        for file in &pr.files {
            let sha = match pr.kind {
                PullRequestKind::Update => self.file_sha(repo, &file.path, base).await?,
                PullRequestKind::Onboarding => None,
            };
            files.push(ChangeFileOperation {
                operation: if sha.is_some() { "update" } else { "create" },
                path: file.path.clone(),
                content: base64::engine::general_purpose::STANDARD.encode(file.content.as_bytes()),
                sha,
            });
        }

        let body = ChangeFilesOptions {
            branch: base.to_string(),
            new_branch: pr.branch.clone(),
            message: pr.title.clone(),
            files,
        };

        let _: serde_json::Value = self
            .client
            .post_json(&self.repo_url(repo, "/contents"), &body)
            .await?;
        debug!(repo = %repo, branch = %pr.branch, "branch pushed");
        Ok(())
    }
}

#[async_trait]
impl Forge for ForgejoForge {
    fn name(&self) -> &str {
        &self.name
    }

    async fn discover_repositories(&self) -> Result<Vec<Repository>> {
        let mut repos = Vec::new();

        for page in 1..=MAX_PAGES {
            let url = format!(
                "{}/repos/search?limit={}&page={}",
                self.api_url, PAGE_SIZE, page
            );
            let response: SearchResponse = self.client.get_json(&url).await?;
            let count = response.data.len();

            repos.extend(
                response
                    .data
                    .into_iter()
                    .filter(ApiRepository::is_updatable)
                    .map(Repository::from),
            );

            if count < PAGE_SIZE {
                break;
            }
        }

        info!(count = repos.len(), "repositories discovered");
        Ok(repos)
    }

    async fn get_repository(&self, repo: &Repository) -> Result<Repository> {
        let api_repo: ApiRepository = self.client.get_json(&self.repo_url(repo, "")).await?;
        Ok(api_repo.into())
    }

    async fn has_onboarding_config(&self, repo: &Repository, files: &[String]) -> Result<bool> {
        for file in files {
            if self.client.exists(&self.contents_url(repo, file)).await? {
                debug!(repo = %repo, file = %file, "bot config found");
                return Ok(true);
            }
        }
        Ok(false)
    }

    async fn find_open_pull_request(
        &self,
        repo: &Repository,
        branch: &str,
    ) -> Result<Option<PullRequestRef>> {
        for page in 1..=MAX_PAGES {
            let url = format!(
                "{}?state=open&limit={}&page={}",
                self.repo_url(repo, "/pulls"),
                PAGE_SIZE,
                page
            );
            let pulls: Vec<ApiPullRequest> = self.client.get_json(&url).await?;
            let count = pulls.len();

            if let Some(found) = pulls.into_iter().find(|p| p.head.branch == branch) {
                return Ok(Some(PullRequestRef {
                    number: found.number,
                    url: found.html_url,
                }));
            }
            if count < PAGE_SIZE {
                break;
            }
        }
        Ok(None)
    }

    async fn create_pull_request(&self, repo: &Repository, pr: &PullRequest) -> Result<PullRequestRef> {
        let base = repo
            .default_branch
            .clone()
            .ok_or_else(|| ForgeError::MissingDefaultBranch(repo.full_name()))?;

        if !pr.files.is_empty() {
            self.push_branch(repo, pr, &base).await?;
        }

        let body = CreatePullRequestOptions {
            title: &pr.title,
            body: &pr.body,
            head: &pr.branch,
            base: &base,
        };
        let created: PullRequestRef = self
            .client
            .post_json(&self.repo_url(repo, "/pulls"), &body)
            .await?;

        info!(repo = %repo, number = created.number, kind = %pr.kind, "pull request created");
        Ok(created)
    }
}

// ==================== Wire types ====================

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    data: Vec<ApiRepository>,
}

#[derive(Debug, Deserialize)]
struct ApiOwner {
    login: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiPermissions {
    #[serde(default)]
    push: bool,
}

#[derive(Debug, Deserialize)]
struct ApiRepository {
    name: String,
    owner: ApiOwner,
    #[serde(default)]
    default_branch: Option<String>,
    #[serde(default)]
    archived: bool,
    #[serde(default)]
    mirror: bool,
    #[serde(default)]
    empty: bool,
    #[serde(default)]
    permissions: Option<ApiPermissions>,
}

impl ApiRepository {
    /// Archived, mirrored and empty repositories and those the token can't
    /// push to are skipped.
    fn is_updatable(&self) -> bool {
        !self.archived
            && !self.mirror
            && !self.empty
            && self.permissions.as_ref().is_some_and(|p| p.push)
    }
}

impl From<ApiRepository> for Repository {
    fn from(api: ApiRepository) -> Self {
        Repository {
            owner: api.owner.login,
            name: api.name,
            default_branch: api.default_branch.filter(|b| !b.is_empty()),
            archived: api.archived,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ApiBranchRef {
    #[serde(rename = "ref")]
    branch: String,
}

#[derive(Debug, Deserialize)]
struct ApiPullRequest {
    number: u64,
    #[serde(default)]
    html_url: String,
    head: ApiBranchRef,
}

#[derive(Debug, Serialize)]
struct ChangeFileOperation {
    operation: &'static str,
    path: String,
    content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    sha: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChangeFilesOptions {
    branch: String,
    new_branch: String,
    message: String,
    files: Vec<ChangeFileOperation>,
}

#[derive(Debug, Serialize)]
struct CreatePullRequestOptions<'a> {
    title: &'a str,
    body: &'a str,
    head: &'a str,
    base: &'a str,
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
