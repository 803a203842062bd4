//! Process-level settings.

use serde::Deserialize;

const DEFAULT_APP_NAME: &str = "forge-update-coordinator";

/// Process-level settings that don't affect update behaviour.
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Name used in logs and in commit messages.
    #[serde(default = "default_name")]
    pub name: String,
    /// Logging verbosity: "trace", "debug", "info", "warn", "error".
    pub log_level: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            name: default_name(),
            log_level: None,
        }
    }
}

fn default_name() -> String {
    DEFAULT_APP_NAME.to_string()
}
