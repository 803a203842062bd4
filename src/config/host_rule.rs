//! Host credential rules.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Associates a host with the token used for requests to it.
#[derive(Debug, Clone, Deserialize)]
pub struct HostRule {
    /// Hostname ("github.com") or URL prefix ("https://code.example.com/api/").
    #[serde(alias = "matchHost")]
    pub match_host: String,
    /// Literal token. Overridden by `token_env` when that variable is set.
    #[serde(default)]
    pub token: Option<SecretString>,
    /// Name of the environment variable holding the token.
    #[serde(default, alias = "tokenEnv")]
    pub token_env: Option<String>,
}

impl HostRule {
    pub fn new(match_host: impl Into<String>, token: Option<&str>) -> Self {
        Self {
            match_host: match_host.into(),
            token: token.map(SecretString::from),
            token_env: None,
        }
    }

    /// Returns the token when one is present and non-blank.
    pub fn token(&self) -> Option<&SecretString> {
        non_blank(self.token.as_ref())
    }
}

/// Filters out tokens that are empty or whitespace only.
pub(crate) fn non_blank(token: Option<&SecretString>) -> Option<&SecretString> {
    token.filter(|t| !t.expose_secret().trim().is_empty())
}
