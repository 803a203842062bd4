//! Configuration loading and validation for the update coordinator.
//!
//! Uses serde_yaml to load YAML configuration files, then applies
//! environment variable overrides for the endpoint, limits and credentials.

mod app;
mod duration;
mod env;
mod error;
mod host_rule;
mod platform;

pub use app::AppConfig;
pub use env::{Env, MapEnv, ProcessEnv};
pub use error::ConfigError;
pub use host_rule::HostRule;
pub use platform::Platform;

use secrecy::SecretString;
use serde::Deserialize;
use std::collections::HashSet;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, warn};

use crate::domain::Repository;

/// Forge API base URL.
pub const ENV_ENDPOINT: &str = "RENOVATE_ENDPOINT";
/// Token for the forge itself.
pub const ENV_TOKEN: &str = "RENOVATE_TOKEN";
pub const ENV_PLATFORM: &str = "RENOVATE_PLATFORM";
pub const ENV_AUTODISCOVER: &str = "RENOVATE_AUTODISCOVER";
pub const ENV_ONBOARDING: &str = "RENOVATE_ONBOARDING";
pub const ENV_PR_HOURLY_LIMIT: &str = "RENOVATE_PR_HOURLY_LIMIT";
pub const ENV_PR_CONCURRENT_LIMIT: &str = "RENOVATE_PR_CONCURRENT_LIMIT";
pub const ENV_DRY_RUN: &str = "RENOVATE_DRY_RUN";

const DEFAULT_PR_HOURLY_LIMIT: u32 = 2;
const DEFAULT_PR_CONCURRENT_LIMIT: u32 = 10;
const DEFAULT_ONBOARDING_CONFIG_FILE: &str = "renovate.json";
const DEFAULT_BRANCH_PREFIX: &str = "renovate/";
const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Root configuration record.
///
/// Built once at startup and never mutated afterwards; the coordinator
/// receives it by reference.
#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    /// Process-level settings (optional).
    #[serde(default)]
    pub app: AppConfig,
    /// Target forge flavour.
    #[serde(default)]
    pub platform: Platform,
    /// Forge base URL, without the `/api/v1` suffix once loaded.
    #[serde(default)]
    pub endpoint: String,
    /// Token for the forge API (overridden by RENOVATE_TOKEN).
    #[serde(default)]
    pub token: Option<SecretString>,
    /// Scan every repository the token can push to.
    #[serde(default)]
    pub autodiscover: bool,
    /// Restricts autodiscovered repositories, e.g. "my-org/*".
    #[serde(default, alias = "autodiscoverFilter")]
    pub autodiscover_filter: Option<String>,
    /// Repositories to process when autodiscover is off ("owner/name").
    #[serde(default)]
    pub repositories: Vec<String>,
    /// Open onboarding PRs for repositories without bot configuration.
    #[serde(default = "default_true")]
    pub onboarding: bool,
    /// File proposed by onboarding PRs and used to detect onboarded repos.
    #[serde(
        default = "default_onboarding_config_file",
        alias = "onboardingConfigFileName"
    )]
    pub onboarding_config_file: String,
    /// Maximum PRs created per rolling hour; 0 disables the cap.
    #[serde(default = "default_pr_hourly_limit", alias = "prHourlyLimit")]
    pub pr_hourly_limit: u32,
    /// Maximum PR operations in flight at once; 0 disables the cap.
    #[serde(default = "default_pr_concurrent_limit", alias = "prConcurrentLimit")]
    pub pr_concurrent_limit: u32,
    /// Credentials per host.
    #[serde(default, alias = "hostRules")]
    pub host_rules: Vec<HostRule>,
    /// Prefix for branches the coordinator creates.
    #[serde(default = "default_branch_prefix", alias = "branchPrefix")]
    pub branch_prefix: String,
    /// Log PRs instead of creating them.
    #[serde(default, alias = "dryRun")]
    pub dry_run: bool,
    /// Per-request HTTP timeout.
    #[serde(default = "default_request_timeout", with = "duration")]
    pub request_timeout: Duration,
    /// Pause between cycles; zero means run a single cycle.
    #[serde(default, with = "duration")]
    pub run_interval: Duration,
}

/// Reads the YAML file at `path`, applies `env` and validates the result.
///
/// Fails with [`ConfigError::MissingEndpoint`] when neither the file nor
/// RENOVATE_ENDPOINT provide an endpoint. Missing host tokens are not an
/// error here; they surface when a credentialed request is made.
pub fn load_configuration(path: impl AsRef<Path>, env: &dyn Env) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    Config::from_yaml_str(&content, env)
}

impl Config {
    /// Load configuration from a YAML file using the process environment.
    ///
    /// Loads a `.env` file first when one exists.
    pub fn load(path: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        load_configuration(path, &ProcessEnv)
    }

    /// Parses YAML text, applies `env` and validates.
    pub fn from_yaml_str(yaml: &str, env: &dyn Env) -> Result<Self, ConfigError> {
        let mut config: Config = serde_yaml::from_str(yaml)?;
        config.apply_env(env)?;
        config.endpoint = normalize_endpoint(&config.endpoint);
        config.validate()?;
        Ok(config)
    }

    /// Applies environment overrides and resolves host rule tokens.
    fn apply_env(&mut self, env: &dyn Env) -> Result<(), ConfigError> {
        if let Some(endpoint) = env.non_empty(ENV_ENDPOINT) {
            self.endpoint = endpoint;
        }
        if let Some(token) = env.non_empty(ENV_TOKEN) {
            self.token = Some(SecretString::from(token));
        }
        if let Some(platform) = env.non_empty(ENV_PLATFORM) {
            self.platform = override_value(ENV_PLATFORM, &platform, Platform::from_str)?;
        }
        if let Some(value) = env.non_empty(ENV_AUTODISCOVER) {
            self.autodiscover = override_value(ENV_AUTODISCOVER, &value, parse_bool)?;
        }
        if let Some(value) = env.non_empty(ENV_ONBOARDING) {
            self.onboarding = override_value(ENV_ONBOARDING, &value, parse_bool)?;
        }
        if let Some(value) = env.non_empty(ENV_DRY_RUN) {
            self.dry_run = override_value(ENV_DRY_RUN, &value, parse_bool)?;
        }
        if let Some(value) = env.non_empty(ENV_PR_HOURLY_LIMIT) {
            self.pr_hourly_limit = override_value(ENV_PR_HOURLY_LIMIT, &value, u32::from_str)?;
        }
        if let Some(value) = env.non_empty(ENV_PR_CONCURRENT_LIMIT) {
            self.pr_concurrent_limit =
                override_value(ENV_PR_CONCURRENT_LIMIT, &value, u32::from_str)?;
        }

        for rule in self.host_rules.iter_mut() {
            let Some(var) = rule.token_env.as_deref() else {
                continue;
            };
            match env.non_empty(var) {
                Some(token) => rule.token = Some(SecretString::from(token)),
                None => debug!(host = %rule.match_host, var = %var, "host rule token variable is unset"),
            }
        }

        Ok(())
    }

    /// Validate the configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.endpoint.is_empty() {
            return Err(ConfigError::MissingEndpoint);
        }

        let url = reqwest::Url::parse(&self.endpoint).map_err(|e| ConfigError::InvalidEndpoint {
            endpoint: self.endpoint.clone(),
            reason: e.to_string(),
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: format!("unsupported scheme {}", url.scheme()),
            });
        }
        if url.host_str().is_none() {
            return Err(ConfigError::InvalidEndpoint {
                endpoint: self.endpoint.clone(),
                reason: "missing host".into(),
            });
        }

        let mut seen = HashSet::new();
        for (i, rule) in self.host_rules.iter().enumerate() {
            let host = rule.match_host.trim();
            if host.is_empty() {
                return Err(ConfigError::Validation(format!(
                    "host_rules[{}]: match_host is required",
                    i
                )));
            }
            if !seen.insert(host.to_lowercase()) {
                warn!(host = %host, "duplicate host rule, the last one wins");
            }
        }

        if !self.autodiscover && self.repositories.is_empty() {
            return Err(ConfigError::Validation(
                "repositories must be listed when autodiscover is off".into(),
            ));
        }

        for repo in &self.repositories {
            if repo.parse::<Repository>().is_err() {
                return Err(ConfigError::Validation(format!(
                    "repository {:?} must be in owner/name form",
                    repo
                )));
            }
        }

        if self.onboarding_config_file.trim().is_empty() {
            return Err(ConfigError::Validation(
                "onboarding_config_file must not be empty".into(),
            ));
        }

        Ok(())
    }

    /// Host rules in precedence order, with a rule for the forge endpoint
    /// first when a platform token is configured.
    ///
    /// Later rules override earlier ones, so explicit `host_rules` win.
    pub fn effective_host_rules(&self) -> Vec<HostRule> {
        let mut rules = Vec::with_capacity(self.host_rules.len() + 1);
        if let Some(token) = host_rule::non_blank(self.token.as_ref()) {
            rules.push(HostRule {
                match_host: self.endpoint.clone(),
                token: Some(token.clone()),
                token_env: None,
            });
        }
        rules.extend(self.host_rules.iter().cloned());
        rules
    }
}

fn override_value<T, E>(
    var: &str,
    value: &str,
    parse: impl FnOnce(&str) -> Result<T, E>,
) -> Result<T, ConfigError> {
    parse(value).map_err(|_| ConfigError::InvalidOverride {
        var: var.to_string(),
        value: value.to_string(),
    })
}

fn parse_bool(value: &str) -> Result<bool, ()> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(()),
    }
}

/// Strips trailing slashes and an `/api/v1` suffix.
fn normalize_endpoint(raw: &str) -> String {
    let trimmed = raw.trim().trim_end_matches('/');
    trimmed
        .strip_suffix("/api/v1")
        .unwrap_or(trimmed)
        .trim_end_matches('/')
        .to_string()
}

fn default_true() -> bool {
    true
}

fn default_onboarding_config_file() -> String {
    DEFAULT_ONBOARDING_CONFIG_FILE.to_string()
}

fn default_pr_hourly_limit() -> u32 {
    DEFAULT_PR_HOURLY_LIMIT
}

fn default_pr_concurrent_limit() -> u32 {
    DEFAULT_PR_CONCURRENT_LIMIT
}

fn default_branch_prefix() -> String {
    DEFAULT_BRANCH_PREFIX.to_string()
}

fn default_request_timeout() -> Duration {
    DEFAULT_REQUEST_TIMEOUT
}

#[cfg(test)]
mod tests;
