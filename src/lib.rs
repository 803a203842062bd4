//! Dependency-update run coordinator for Forgejo and Gitea.
//!
//! Loads the bot configuration, resolves per-host credentials, and opens
//! onboarding and update pull requests under hourly and concurrent caps.

pub mod config;
pub mod coordinator;
pub mod domain;
pub mod forge;
pub mod hosts;
pub mod ratelimit;

pub use config::{Config, ConfigError, load_configuration};
pub use coordinator::{Coordinator, CoordinatorConfig, CoordinatorError};
pub use hosts::{AuthError, HostRules};
pub use ratelimit::{PrLimits, RateLimiter, apply_rate_limits};
