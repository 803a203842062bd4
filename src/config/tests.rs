//! Tests for config module.

use super::*;
use secrecy::ExposeSecret;
use std::io::Write;
use std::time::Duration;
use tempfile::NamedTempFile;

// ==================== Duration parsing tests ====================

#[test]
fn test_parse_duration_seconds() {
    let d = duration::parse_duration("30s").unwrap();
    assert_eq!(d, Duration::from_secs(30));
}

#[test]
fn test_parse_duration_hours() {
    let d = duration::parse_duration("2h").unwrap();
    assert_eq!(d, Duration::from_secs(7200));
}

#[test]
fn test_parse_duration_days() {
    let d = duration::parse_duration("1d").unwrap();
    assert_eq!(d, Duration::from_secs(86400));
}

#[test]
fn test_parse_duration_empty() {
    let d = duration::parse_duration("").unwrap();
    assert_eq!(d, Duration::ZERO);
}

#[test]
fn test_parse_duration_invalid_unit() {
    let result = duration::parse_duration("10x");
    assert!(result.unwrap_err().contains("unknown duration unit"));
}

#[test]
fn test_parse_duration_overflow() {
    let result = duration::parse_duration("99999999999999999999999h");
    assert!(result.unwrap_err().contains("out of range"));
}

// ==================== YAML field loading tests ====================

fn from_yaml(yaml: &str) -> Result<Config, ConfigError> {
    Config::from_yaml_str(yaml, &MapEnv::new())
}

/// Mirrors the stock deployment: endpoint and GitHub token come from the
/// environment.
const DEPLOYMENT_YAML: &str = r#"
platform: forgejo
autodiscover: true
onboarding: true
prHourlyLimit: 2
prConcurrentLimit: 10
hostRules:
  - matchHost: github.com
    tokenEnv: RENOVATE_GITHUB_TOKEN
  - matchHost: api.github.com
    tokenEnv: RENOVATE_GITHUB_TOKEN
"#;

fn deployment_env() -> MapEnv {
    MapEnv::new()
        .with(ENV_ENDPOINT, "https://code.example.com/api/v1/")
        .with("RENOVATE_GITHUB_TOKEN", "ghp_example")
}

#[test]
fn test_load_deployment_config() {
    let cfg = Config::from_yaml_str(DEPLOYMENT_YAML, &deployment_env()).unwrap();

    assert_eq!(cfg.platform, Platform::Forgejo);
    assert_eq!(cfg.endpoint, "https://code.example.com");
    assert!(cfg.autodiscover);
    assert!(cfg.onboarding);
    assert_eq!(cfg.pr_hourly_limit, 2);
    assert_eq!(cfg.pr_concurrent_limit, 10);
    assert_eq!(cfg.host_rules.len(), 2);
    assert_eq!(cfg.host_rules[0].match_host, "github.com");
    assert_eq!(cfg.host_rules[0].token().unwrap().expose_secret(), "ghp_example");
    assert_eq!(cfg.host_rules[1].token().unwrap().expose_secret(), "ghp_example");
}

#[test]
fn test_defaults_applied() {
    let cfg = from_yaml(
        r#"
endpoint: https://code.example.com
autodiscover: true
"#,
    )
    .unwrap();

    assert_eq!(cfg.platform, Platform::Forgejo);
    assert!(cfg.onboarding);
    assert!(!cfg.dry_run);
    assert_eq!(cfg.pr_hourly_limit, 2);
    assert_eq!(cfg.pr_concurrent_limit, 10);
    assert_eq!(cfg.onboarding_config_file, "renovate.json");
    assert_eq!(cfg.branch_prefix, "renovate/");
    assert_eq!(cfg.request_timeout, Duration::from_secs(30));
    assert_eq!(cfg.run_interval, Duration::ZERO);
    assert_eq!(cfg.app.name, "forge-update-coordinator");
}

#[test]
fn test_load_snake_case_fields() {
    let cfg = from_yaml(
        r#"
app:
  name: updater
  log_level: debug
platform: gitea
endpoint: http://gitea.local:3000/
autodiscover: false
repositories:
  - infra/deploy
  - web/site
onboarding: false
pr_hourly_limit: 0
pr_concurrent_limit: 3
branch_prefix: deps/
dry_run: true
request_timeout: 5s
run_interval: 1h
"#,
    )
    .unwrap();

    assert_eq!(cfg.app.name, "updater");
    assert_eq!(cfg.app.log_level.as_deref(), Some("debug"));
    assert_eq!(cfg.platform, Platform::Gitea);
    assert_eq!(cfg.endpoint, "http://gitea.local:3000");
    assert_eq!(cfg.repositories, vec!["infra/deploy", "web/site"]);
    assert!(!cfg.onboarding);
    assert_eq!(cfg.pr_hourly_limit, 0);
    assert_eq!(cfg.pr_concurrent_limit, 3);
    assert_eq!(cfg.branch_prefix, "deps/");
    assert!(cfg.dry_run);
    assert_eq!(cfg.request_timeout, Duration::from_secs(5));
    assert_eq!(cfg.run_interval, Duration::from_secs(3600));
}

#[test]
fn test_numeric_duration_is_seconds() {
    let cfg = from_yaml(
        r#"
endpoint: https://code.example.com
autodiscover: true
request_timeout: 12
"#,
    )
    .unwrap();
    assert_eq!(cfg.request_timeout, Duration::from_secs(12));
}

#[test]
fn test_out_of_range_duration_is_parse_error() {
    let result = from_yaml(
        r#"
endpoint: https://code.example.com
autodiscover: true
request_timeout: 99999999999999999999999h
"#,
    );
    match result {
        Err(ConfigError::Parse(e)) => assert!(e.to_string().contains("duration out of range")),
        other => panic!("expected parse error, got {:?}", other),
    }
}

#[test]
fn test_unknown_platform_rejected() {
    let result = from_yaml(
        r#"
platform: bitbucket
endpoint: https://code.example.com
autodiscover: true
"#,
    );
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}

// ==================== Endpoint tests ====================

#[test]
fn test_missing_endpoint_is_config_error() {
    let result = from_yaml("autodiscover: true\n");
    assert!(matches!(result, Err(ConfigError::MissingEndpoint)));
}

#[test]
fn test_blank_endpoint_env_does_not_count() {
    let env = MapEnv::new().with(ENV_ENDPOINT, "   ");
    let result = Config::from_yaml_str("autodiscover: true\n", &env);
    assert!(matches!(result, Err(ConfigError::MissingEndpoint)));
}

#[test]
fn test_endpoint_env_overrides_literal() {
    let env = MapEnv::new().with(ENV_ENDPOINT, "https://from-env.example.com");
    let cfg = Config::from_yaml_str(
        r#"
endpoint: https://literal.example.com
autodiscover: true
"#,
        &env,
    )
    .unwrap();
    assert_eq!(cfg.endpoint, "https://from-env.example.com");
}

#[test]
fn test_endpoint_literal_used_without_env() {
    let cfg = from_yaml(
        r#"
endpoint: https://literal.example.com/api/v1
autodiscover: true
"#,
    )
    .unwrap();
    assert_eq!(cfg.endpoint, "https://literal.example.com");
}

#[test]
fn test_invalid_endpoint_rejected() {
    let result = from_yaml(
        r#"
endpoint: not a url
autodiscover: true
"#,
    );
    assert!(matches!(result, Err(ConfigError::InvalidEndpoint { .. })));
}

#[test]
fn test_non_http_endpoint_rejected() {
    let result = from_yaml(
        r#"
endpoint: ftp://code.example.com
autodiscover: true
"#,
    );
    match result {
        Err(ConfigError::InvalidEndpoint { reason, .. }) => {
            assert!(reason.contains("unsupported scheme"))
        }
        other => panic!("expected InvalidEndpoint, got {:?}", other),
    }
}

// ==================== Environment override tests ====================

#[test]
fn test_env_overrides_flags_and_limits() {
    let env = MapEnv::new()
        .with(ENV_ENDPOINT, "https://code.example.com")
        .with(ENV_PLATFORM, "Gitea")
        .with(ENV_AUTODISCOVER, "false")
        .with(ENV_ONBOARDING, "0")
        .with(ENV_DRY_RUN, "yes")
        .with(ENV_PR_HOURLY_LIMIT, "7")
        .with(ENV_PR_CONCURRENT_LIMIT, "1");

    let cfg = Config::from_yaml_str(
        r#"
autodiscover: true
repositories: [a/b]
"#,
        &env,
    )
    .unwrap();

    assert_eq!(cfg.platform, Platform::Gitea);
    assert!(!cfg.autodiscover);
    assert!(!cfg.onboarding);
    assert!(cfg.dry_run);
    assert_eq!(cfg.pr_hourly_limit, 7);
    assert_eq!(cfg.pr_concurrent_limit, 1);
}

#[test]
fn test_invalid_override_rejected() {
    let env = MapEnv::new()
        .with(ENV_ENDPOINT, "https://code.example.com")
        .with(ENV_PR_HOURLY_LIMIT, "-1");
    let result = Config::from_yaml_str("autodiscover: true\n", &env);
    match result {
        Err(ConfigError::InvalidOverride { var, value }) => {
            assert_eq!(var, ENV_PR_HOURLY_LIMIT);
            assert_eq!(value, "-1");
        }
        other => panic!("expected InvalidOverride, got {:?}", other),
    }
}

#[test]
fn test_platform_token_from_env() {
    let env = deployment_env().with(ENV_TOKEN, "forge-secret");
    let cfg = Config::from_yaml_str(DEPLOYMENT_YAML, &env).unwrap();

    let rules = cfg.effective_host_rules();
    assert_eq!(rules.len(), 3);
    assert_eq!(rules[0].match_host, "https://code.example.com");
    assert_eq!(rules[0].token().unwrap().expose_secret(), "forge-secret");
}

#[test]
fn test_no_platform_rule_without_token() {
    let cfg = Config::from_yaml_str(DEPLOYMENT_YAML, &deployment_env()).unwrap();
    assert_eq!(cfg.effective_host_rules().len(), 2);
}

// ==================== Host rule tests ====================

#[test]
fn test_missing_host_token_is_not_an_error() {
    let env = MapEnv::new().with(ENV_ENDPOINT, "https://code.example.com");
    let cfg = Config::from_yaml_str(DEPLOYMENT_YAML, &env).unwrap();

    assert!(cfg.host_rules[0].token().is_none());
    assert!(cfg.host_rules[1].token().is_none());
}

#[test]
fn test_empty_literal_token_loads() {
    let cfg = from_yaml(
        r#"
endpoint: https://code.example.com
autodiscover: true
host_rules:
  - match_host: github.com
    token: ""
"#,
    )
    .unwrap();
    assert!(cfg.host_rules[0].token.is_some());
    assert!(cfg.host_rules[0].token().is_none());
}

#[test]
fn test_token_env_overrides_literal() {
    let env = MapEnv::new().with("GH", "from-env");
    let cfg = Config::from_yaml_str(
        r#"
endpoint: https://code.example.com
autodiscover: true
host_rules:
  - match_host: github.com
    token: literal
    token_env: GH
"#,
        &env,
    )
    .unwrap();
    assert_eq!(cfg.host_rules[0].token().unwrap().expose_secret(), "from-env");
}

#[test]
fn test_literal_token_kept_when_env_unset() {
    let cfg = from_yaml(
        r#"
endpoint: https://code.example.com
autodiscover: true
host_rules:
  - match_host: github.com
    token: literal
    token_env: UNSET_VAR
"#,
    )
    .unwrap();
    assert_eq!(cfg.host_rules[0].token().unwrap().expose_secret(), "literal");
}

#[test]
fn test_duplicate_host_rules_are_kept() {
    let cfg = from_yaml(
        r#"
endpoint: https://code.example.com
autodiscover: true
host_rules:
  - match_host: github.com
    token: first
  - match_host: GitHub.com
    token: second
"#,
    )
    .unwrap();
    assert_eq!(cfg.host_rules.len(), 2);
}

#[test]
fn test_blank_match_host_rejected() {
    let result = from_yaml(
        r#"
endpoint: https://code.example.com
autodiscover: true
host_rules:
  - match_host: "  "
    token: abc
"#,
    );
    assert!(matches!(result, Err(ConfigError::Validation(_))));
}

#[test]
fn test_config_debug_hides_platform_token() {
    let env = deployment_env().with(ENV_TOKEN, "forge-secret");
    let cfg = Config::from_yaml_str(DEPLOYMENT_YAML, &env).unwrap();
    assert!(!format!("{:?}", cfg).contains("forge-secret"));
}

#[test]
fn test_blank_platform_token_adds_no_rule() {
    let cfg = from_yaml(
        "endpoint: https://code.example.com\nautodiscover: true\ntoken: \"  \"\n",
    )
    .unwrap();
    assert!(cfg.effective_host_rules().is_empty());
}

#[test]
fn test_token_debug_is_redacted() {
    let rule = HostRule::new("github.com", Some("ghp_secret"));
    let printed = format!("{:?}", rule);
    assert!(!printed.contains("ghp_secret"));
    assert!(printed.contains("REDACTED"));
}

// ==================== Validation tests ====================

#[test]
fn test_repositories_required_without_autodiscover() {
    let result = from_yaml(
        r#"
endpoint: https://code.example.com
autodiscover: false
"#,
    );
    match result {
        Err(ConfigError::Validation(msg)) => assert!(msg.contains("repositories")),
        other => panic!("expected Validation, got {:?}", other),
    }
}

#[test]
fn test_malformed_repository_rejected() {
    for bad in ["noslash", "/repo", "owner/", "a/b/c"] {
        let yaml = format!(
            "endpoint: https://code.example.com\nrepositories: [\"{}\"]\n",
            bad
        );
        let result = from_yaml(&yaml);
        assert!(
            matches!(result, Err(ConfigError::Validation(_))),
            "{} should be rejected",
            bad
        );
    }
}

// ==================== File loading tests ====================

#[test]
fn test_load_configuration_from_file() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(DEPLOYMENT_YAML.as_bytes()).unwrap();

    let cfg = load_configuration(file.path(), &deployment_env()).unwrap();
    assert_eq!(cfg.endpoint, "https://code.example.com");
    assert!(!cfg.endpoint.is_empty());
}

#[test]
fn test_load_configuration_missing_file() {
    let result = load_configuration("/nonexistent/config.yaml", &deployment_env());
    assert!(matches!(result, Err(ConfigError::ReadFile(_))));
}

#[test]
fn test_load_configuration_invalid_yaml() {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(b"host_rules: [unclosed").unwrap();

    let result = load_configuration(file.path(), &deployment_env());
    assert!(matches!(result, Err(ConfigError::Parse(_))));
}
