//! Tests for the Forgejo client that need no network.

use super::*;
use crate::config::{HostRule, MapEnv};
use crate::domain::FileChange;
use crate::hosts::AuthError;
use std::time::Duration;

fn client(rules: Vec<HostRule>) -> AuthenticatedClient {
    AuthenticatedClient::new(HostRules::new(rules), Duration::from_secs(5)).unwrap()
}

fn forge(rules: Vec<HostRule>) -> ForgejoForge {
    ForgejoForge::new("https://code.example.com/", client(rules))
}

// ==================== URL building tests ====================

#[test]
fn test_api_url_appends_version() {
    assert_eq!(forge(vec![]).api_url(), "https://code.example.com/api/v1");
}

#[test]
fn test_repo_and_contents_urls_are_encoded() {
    let f = forge(vec![]);
    let repo = Repository::new("my org", "app");
    assert_eq!(
        f.repo_url(&repo, "/pulls"),
        "https://code.example.com/api/v1/repos/my%20org/app/pulls"
    );
    assert_eq!(
        f.contents_url(&repo, "/.gitea/renovate config.json"),
        "https://code.example.com/api/v1/repos/my%20org/app/contents/.gitea/renovate%20config.json"
    );
}

#[test]
fn test_from_config_uses_platform_name() {
    let env = MapEnv::new().with("RENOVATE_ENDPOINT", "https://gitea.local");
    let cfg = Config::from_yaml_str("platform: gitea\nautodiscover: true\n", &env).unwrap();
    let f = ForgejoForge::from_config(&cfg).unwrap();
    assert_eq!(f.name(), "gitea");
    assert_eq!(f.api_url(), "https://gitea.local/api/v1");
}

// ==================== Wire type tests ====================

#[test]
fn test_search_response_filtering() {
    let body = r#"{
        "ok": true,
        "data": [
            {"name": "app", "owner": {"login": "web"}, "default_branch": "main",
             "permissions": {"admin": false, "push": true, "pull": true}},
            {"name": "old", "owner": {"login": "web"}, "archived": true,
             "permissions": {"push": true}},
            {"name": "upstream", "owner": {"login": "web"}, "mirror": true,
             "permissions": {"push": true}},
            {"name": "readonly", "owner": {"login": "web"},
             "permissions": {"push": false}},
            {"name": "bare", "owner": {"login": "web"}}
        ]
    }"#;
    let response: SearchResponse = serde_json::from_str(body).unwrap();
    let repos: Vec<Repository> = response
        .data
        .into_iter()
        .filter(ApiRepository::is_updatable)
        .map(Repository::from)
        .collect();

    assert_eq!(repos.len(), 1);
    assert_eq!(repos[0].full_name(), "web/app");
    assert_eq!(repos[0].default_branch.as_deref(), Some("main"));
}

#[test]
fn test_empty_default_branch_becomes_none() {
    let api: ApiRepository =
        serde_json::from_str(r#"{"name": "x", "owner": {"login": "o"}, "default_branch": ""}"#)
            .unwrap();
    assert_eq!(Repository::from(api).default_branch, None);
}

#[test]
fn test_pull_request_ref_uses_html_url() {
    let pr: PullRequestRef = serde_json::from_str(
        r#"{"number": 7, "url": "https://api/x", "html_url": "https://code.example.com/o/r/pulls/7"}"#,
    )
    .unwrap();
    assert_eq!(pr.number, 7);
    assert_eq!(pr.url, "https://code.example.com/o/r/pulls/7");
}

#[test]
fn test_change_files_body_shape() {
    let body = ChangeFilesOptions {
        branch: "main".into(),
        new_branch: "renovate/configure".into(),
        message: "Configure".into(),
        files: vec![ChangeFileOperation {
            operation: "create",
            path: "renovate.json".into(),
            content: "e30=".into(),
            sha: None,
        }],
    };
    let json = serde_json::to_value(&body).unwrap();
    assert_eq!(json["new_branch"], "renovate/configure");
    assert_eq!(json["files"][0]["operation"], "create");
    assert!(json["files"][0].get("sha").is_none());
}

// ==================== Credential tests ====================

#[test]
fn test_request_with_empty_token_fails_with_auth_error() {
    let c = client(vec![HostRule::new("github.com", Some(""))]);
    let err = c
        .request(reqwest::Method::GET, "https://api.github.com/repos/o/r")
        .unwrap_err();
    assert!(matches!(err, ForgeError::Auth(AuthError::MissingToken { .. })));
}

#[tokio::test]
async fn test_get_json_with_empty_token_fails_before_network() {
    let c = client(vec![HostRule::new("github.com", Some(""))]);
    let result = c
        .get_json::<serde_json::Value>("https://github.com/o/r")
        .await;
    assert!(matches!(
        result,
        Err(ForgeError::Auth(AuthError::MissingToken { .. }))
    ));
}

#[tokio::test]
async fn test_discover_without_forge_credentials_fails() {
    let f = forge(vec![HostRule::new("github.com", Some("gh"))]);
    let result = f.discover_repositories().await;
    assert!(matches!(
        result,
        Err(ForgeError::Auth(AuthError::NoMatchingRule { .. }))
    ));
}

#[tokio::test]
async fn test_create_pull_request_requires_default_branch() {
    let f = forge(vec![HostRule::new("code.example.com", Some("t"))]);
    let pr = PullRequest {
        kind: PullRequestKind::Onboarding,
        title: "Configure".into(),
        body: String::new(),
        branch: "renovate/configure".into(),
        files: vec![FileChange::new("renovate.json", "{}")],
    };
    let result = f.create_pull_request(&Repository::new("o", "r"), &pr).await;
    assert!(matches!(result, Err(ForgeError::MissingDefaultBranch(name)) if name == "o/r"));
}
