//! Coordinator construction options.

use crate::config::Config;

/// Coordinator configuration options.
pub struct CoordinatorConfig {
    /// Loaded application configuration.
    pub app_config: Config,
    /// Application version, reported at startup.
    pub version: String,
}

impl CoordinatorConfig {
    pub fn new(app_config: Config) -> Self {
        Self {
            app_config,
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}
