//! Host rule matching and credential resolution.
//!
//! A hostname rule ("github.com") matches that host and its subdomains. A
//! URL rule ("https://code.example.com/api/") matches URLs sharing the
//! prefix. When several rules match, the last declared one wins.

mod error;

pub use error::AuthError;

use reqwest::Url;
use secrecy::SecretString;

use crate::config::{Config, HostRule};

/// Ordered host rules, later entries taking precedence.
#[derive(Debug, Clone, Default)]
pub struct HostRules {
    rules: Vec<HostRule>,
}

impl HostRules {
    pub fn new(rules: Vec<HostRule>) -> Self {
        Self { rules }
    }

    /// Builds the rule set for a configuration, including the forge's own
    /// token when one is configured.
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.effective_host_rules())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Returns the rule applying to `target` (a hostname or a URL).
    pub fn find(&self, target: &str) -> Option<&HostRule> {
        let target = Target::parse(target)?;
        self.find_target(&target)
    }

    /// Resolves the token for a request to `url`.
    ///
    /// Fails when no rule applies or the applying rule carries no token.
    pub fn token_for(&self, url: &str) -> Result<SecretString, AuthError> {
        let target = Target::parse(url).ok_or_else(|| AuthError::InvalidUrl(url.to_string()))?;
        let rule = self
            .find_target(&target)
            .ok_or_else(|| AuthError::NoMatchingRule {
                host: target.host.clone(),
            })?;
        let token = rule.token().ok_or_else(|| AuthError::MissingToken {
            match_host: rule.match_host.clone(),
        })?;
        Ok(token.clone())
    }

    /// Returns true when requests to `url` can be authenticated.
    pub fn has_token(&self, url: &str) -> bool {
        self.token_for(url).is_ok()
    }

    fn find_target(&self, target: &Target) -> Option<&HostRule> {
        self.rules
            .iter()
            .rev()
            .find(|rule| target.matches(&rule.match_host))
    }
}

/// A request target reduced to what rules match against.
struct Target {
    host: String,
    url: Option<String>,
}

impl Target {
    fn parse(s: &str) -> Option<Self> {
        let s = s.trim();
        if s.contains("://") {
            let url = Url::parse(s).ok()?;
            let host = url.host_str()?.to_lowercase();
            return Some(Self {
                host,
                url: Some(url.to_string()),
            });
        }

        let host = s.split('/').next()?.split(':').next()?.to_lowercase();
        if host.is_empty() {
            return None;
        }
        Some(Self { host, url: None })
    }

    fn matches(&self, match_host: &str) -> bool {
        let match_host = match_host.trim();
        if match_host.contains("://") {
            let Some(url) = self.url.as_deref() else {
                return false;
            };
            return match Url::parse(match_host) {
                Ok(prefix) => url.starts_with(prefix.as_str()),
                Err(_) => url.starts_with(match_host),
            };
        }

        let rule_host = match_host.trim_start_matches('.').to_lowercase();
        if rule_host.is_empty() {
            return false;
        }
        self.host == rule_host || self.host.ends_with(&format!(".{}", rule_host))
    }
}
