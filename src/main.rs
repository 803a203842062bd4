use forge_update_coordinator::config::Config;
use forge_update_coordinator::coordinator::{Coordinator, CoordinatorConfig};
use std::env;
use tracing::{Level, error, info};
use tracing_subscriber::{EnvFilter, fmt};

const DEFAULT_CONFIG_PATH: &str = "configs/config.yaml";

fn parse_config_path() -> String {
    for arg in env::args().skip(1) {
        if let Some(path) = arg.strip_prefix("--config=") {
            return path.to_string();
        }
    }
    DEFAULT_CONFIG_PATH.to_string()
}

fn init_tracing(log_level: Option<&str>) {
    let level = match log_level {
        Some("debug") => Level::DEBUG,
        Some("info") => Level::INFO,
        Some("warn") | Some("warning") => Level::WARN,
        Some("error") => Level::ERROR,
        Some("trace") => Level::TRACE,
        _ => Level::INFO,
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.to_string()));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

#[tokio::main]
async fn main() {
    let config_path = parse_config_path();

    // Config::load reads .env before applying overrides
    let config = match Config::load(&config_path) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config: {}", e);
            std::process::exit(1);
        }
    };

    init_tracing(config.app.log_level.as_deref());

    let coordinator = match Coordinator::from_config(CoordinatorConfig::new(config)) {
        Ok(c) => c,
        Err(e) => {
            error!(error = %e, "Failed to create coordinator");
            std::process::exit(1);
        }
    };

    info!(config = %config_path, "Coordinator initialized");

    if let Err(e) = coordinator.start().await {
        error!(error = %e, "Coordinator error");
    }

    let _ = coordinator.stop().await;
}
