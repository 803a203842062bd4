//! Run coordinator.
//!
//! Resolves the repository set, decides per repository between an
//! onboarding PR and update PRs, and issues them through the rate limiter.

mod config;
mod error;
mod stats;
mod updates;

pub use config::CoordinatorConfig;
pub use error::CoordinatorError;
pub use stats::{RunReport, Stats};
pub use updates::{NoUpdates, UpdateError, UpdateSource};

use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::sync::{Mutex, watch};
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::domain::{FileChange, PullRequest, PullRequestKind, Repository};
use crate::forge::{Forge, ForgejoForge};
use crate::hosts::HostRules;
use crate::ratelimit::{RateLimiter, apply_rate_limits};
use stats::Outcome;

/// Config files that mark a repository as onboarded, besides the
/// configured one.
const KNOWN_CONFIG_FILES: &[&str] = &[
    "renovate.json",
    "renovate.json5",
    ".github/renovate.json",
    ".github/renovate.json5",
    ".gitea/renovate.json",
    ".gitea/renovate.json5",
    ".forgejo/renovate.json",
    ".forgejo/renovate.json5",
    ".renovaterc",
    ".renovaterc.json",
];

const ONBOARDING_SCHEMA: &str = "https://docs.renovatebot.com/renovate-schema.json";

/// Drives repository discovery and PR creation under the configured limits.
pub struct Coordinator {
    cfg: Config,
    forge: Arc<dyn Forge>,
    updates: Arc<dyn UpdateSource>,
    limiter: Arc<RateLimiter>,
    config_files: Vec<String>,

    version: String,
    started_at: Mutex<Option<Instant>>,
    running: Mutex<bool>,
    /// True while a stop is requested; reset by `start`.
    shutdown: watch::Sender<bool>,
    stats: Mutex<Stats>,
}

impl Coordinator {
    /// Creates a coordinator whose limiter is built from the configuration.
    pub fn new(
        cfg: CoordinatorConfig,
        forge: Arc<dyn Forge>,
        updates: Arc<dyn UpdateSource>,
    ) -> Self {
        let limiter = Arc::new(apply_rate_limits(&cfg.app_config));
        Self::with_limiter(cfg, forge, updates, limiter)
    }

    /// Creates a coordinator sharing an existing limiter.
    pub fn with_limiter(
        cfg: CoordinatorConfig,
        forge: Arc<dyn Forge>,
        updates: Arc<dyn UpdateSource>,
        limiter: Arc<RateLimiter>,
    ) -> Self {
        let config_files = config_file_candidates(&cfg.app_config.onboarding_config_file);

        Self {
            cfg: cfg.app_config,
            forge,
            updates,
            limiter,
            config_files,
            version: cfg.version,
            started_at: Mutex::new(None),
            running: Mutex::new(false),
            shutdown: watch::Sender::new(false),
            stats: Mutex::new(Stats::default()),
        }
    }

    /// Creates a coordinator talking to the configured Forgejo instance,
    /// with no update source.
    pub fn from_config(cfg: CoordinatorConfig) -> Result<Self, CoordinatorError> {
        let forge = ForgejoForge::from_config(&cfg.app_config)?;
        Ok(Self::new(cfg, Arc::new(forge), Arc::new(NoUpdates)))
    }

    /// Starts the coordinator.
    ///
    /// Runs a single cycle when `run_interval` is zero, otherwise cycles
    /// until [`stop`](Self::stop) or Ctrl+C.
    pub async fn start(&self) -> Result<(), CoordinatorError> {
        {
            let mut running = self.running.lock().await;
            if *running {
                return Err(CoordinatorError::AlreadyRunning);
            }
            *running = true;
        }
        self.shutdown.send_replace(false);

        {
            let mut started_at = self.started_at.lock().await;
            *started_at = Some(Instant::now());
        }

        info!(
            version = %self.version,
            platform = %self.cfg.platform,
            endpoint = %self.cfg.endpoint,
            autodiscover = self.cfg.autodiscover,
            onboarding = self.cfg.onboarding,
            pr_hourly_limit = self.cfg.pr_hourly_limit,
            pr_concurrent_limit = self.cfg.pr_concurrent_limit,
            dry_run = self.cfg.dry_run,
            "Starting update coordinator"
        );

        if !HostRules::from_config(&self.cfg).has_token(&self.cfg.endpoint) {
            warn!(endpoint = %self.cfg.endpoint, "no token configured for the forge endpoint");
        }

        if self.cfg.run_interval.is_zero() {
            let result = self.run_once().await.map(|_| ());
            *self.running.lock().await = false;
            return result;
        }

        self.run_loop().await
    }

    /// Stops the coordinator. PRs still waiting for a concurrency slot are
    /// deferred; the limiter itself stays usable for a later `start`.
    pub async fn stop(&self) -> Result<(), CoordinatorError> {
        {
            let mut running = self.running.lock().await;
            if !*running {
                return Ok(());
            }
            *running = false;
        }

        info!("Stopping coordinator...");
        self.shutdown.send_replace(true);

        let uptime = self.uptime().await;
        info!(uptime = ?uptime, "Coordinator stopped");

        Ok(())
    }

    /// Returns a copy of the cumulative statistics.
    pub async fn stats(&self) -> Stats {
        self.stats.lock().await.clone()
    }

    /// Returns true if the coordinator is currently running.
    pub async fn is_running(&self) -> bool {
        *self.running.lock().await
    }

    /// Returns how long the coordinator has been running.
    pub async fn uptime(&self) -> Duration {
        self.started_at
            .lock()
            .await
            .map(|s| s.elapsed())
            .unwrap_or(Duration::ZERO)
    }

    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    /// Cycles every `run_interval` until stopped.
    async fn run_loop(&self) -> Result<(), CoordinatorError> {
        let mut interval = tokio::time::interval(self.cfg.run_interval);
        let mut shutdown = self.shutdown.subscribe();

        info!(run_interval = ?self.cfg.run_interval, "Starting run loop");

        loop {
            tokio::select! {
                _ = interval.tick() => {
                    if !self.is_running().await {
                        break;
                    }
                    if let Err(e) = self.run_once().await {
                        error!(error = %e, "cycle failed");
                    }
                }
                _ = async { shutdown.wait_for(|stopping| *stopping).await.map(drop) } => {
                    break;
                }
                _ = tokio::signal::ctrl_c() => {
                    info!("Received shutdown signal");
                    break;
                }
            }
        }

        Ok(())
    }

    /// Runs one discovery and PR cycle.
    ///
    /// PRs refused by the rate limiter are counted as deferred and left
    /// for a later cycle.
    pub async fn run_once(&self) -> Result<RunReport, CoordinatorError> {
        let mut report = RunReport::begin();

        let repos = self.resolve_repositories(&mut report).await?;
        report.repositories = repos.len();

        let mut planned = Vec::new();
        for repo in &repos {
            if repo.archived {
                debug!(repo = %repo, "skipping archived repository");
                continue;
            }
            match self.plan_repository(repo, &mut report).await {
                Ok(prs) => planned.extend(prs.into_iter().map(|pr| (repo, pr))),
                Err(e) => {
                    warn!(repo = %repo, error = %e, "failed to process repository");
                    report.failed += 1;
                }
            }
        }

        let outcomes = join_all(
            planned
                .iter()
                .map(|(repo, pr)| self.issue_pull_request(repo, pr)),
        )
        .await;
        for outcome in outcomes {
            report.record(outcome);
        }

        report.finish();
        self.stats.lock().await.absorb(&report);

        info!(
            repositories = report.repositories,
            onboarding_prs = report.onboarding_prs,
            update_prs = report.update_prs,
            dry_run = report.dry_run,
            existing = report.existing,
            deferred = report.deferred,
            failed = report.failed,
            "Cycle finished"
        );

        Ok(report)
    }

    /// Lists the repositories to process this cycle.
    async fn resolve_repositories(
        &self,
        report: &mut RunReport,
    ) -> Result<Vec<Repository>, CoordinatorError> {
        if self.cfg.autodiscover {
            let repos = self.forge.discover_repositories().await?;
            return Ok(match self.cfg.autodiscover_filter.as_deref() {
                Some(filter) => repos
                    .into_iter()
                    .filter(|r| r.matches_filter(filter))
                    .collect(),
                None => repos,
            });
        }

        let mut repos = Vec::with_capacity(self.cfg.repositories.len());
        for name in &self.cfg.repositories {
            let repo: Repository = match name.parse() {
                Ok(repo) => repo,
                Err(e) => {
                    warn!(error = %e, "skipping repository");
                    report.failed += 1;
                    continue;
                }
            };
            match self.forge.get_repository(&repo).await {
                Ok(repo) => repos.push(repo),
                Err(e) => {
                    warn!(repo = %name, error = %e, "failed to fetch repository");
                    report.failed += 1;
                }
            }
        }
        Ok(repos)
    }

    /// Decides which PRs a repository needs, skipping those already open.
    async fn plan_repository(
        &self,
        repo: &Repository,
        report: &mut RunReport,
    ) -> Result<Vec<PullRequest>, CoordinatorError> {
        let onboarded = self
            .forge
            .has_onboarding_config(repo, &self.config_files)
            .await?;

        let candidates = if onboarded {
            self.updates
                .pending_updates(repo)
                .await?
                .iter()
                .map(|u| u.to_pull_request(&self.cfg.branch_prefix))
                .collect()
        } else if self.cfg.onboarding {
            vec![self.onboarding_pull_request()]
        } else {
            debug!(repo = %repo, "repository not onboarded and onboarding is disabled");
            Vec::new()
        };

        let mut prs = Vec::with_capacity(candidates.len());
        for pr in candidates {
            match self.forge.find_open_pull_request(repo, &pr.branch).await? {
                Some(existing) => {
                    debug!(repo = %repo, number = existing.number, branch = %pr.branch, "pull request already open");
                    report.existing += 1;
                }
                None => prs.push(pr),
            }
        }
        Ok(prs)
    }

    /// Creates one PR once the limiter admits it.
    async fn issue_pull_request(&self, repo: &Repository, pr: &PullRequest) -> Outcome {
        let mut shutdown = self.shutdown.subscribe();
        let admission = tokio::select! {
            result = self.limiter.acquire() => result,
            _ = shutdown.wait_for(|stopping| *stopping) => {
                info!(repo = %repo, branch = %pr.branch, "pull request deferred, coordinator stopping");
                return Outcome::Deferred;
            }
        };
        let _permit = match admission {
            Ok(permit) => permit,
            Err(e) => {
                info!(repo = %repo, branch = %pr.branch, reason = %e, "pull request deferred");
                return Outcome::Deferred;
            }
        };

        if self.cfg.dry_run {
            info!(repo = %repo, kind = %pr.kind, title = %pr.title, "dry run: would create pull request");
            return Outcome::DryRun;
        }

        match self.forge.create_pull_request(repo, pr).await {
            Ok(_) => Outcome::Created(pr.kind),
            Err(e) => {
                warn!(repo = %repo, branch = %pr.branch, error = %e, "failed to create pull request");
                Outcome::Failed
            }
        }
    }

    fn onboarding_pull_request(&self) -> PullRequest {
        let file = &self.cfg.onboarding_config_file;
        let content = serde_json::json!({ "$schema": ONBOARDING_SCHEMA });
        let content = serde_json::to_string_pretty(&content).unwrap_or_default() + "\n";

        PullRequest {
            kind: PullRequestKind::Onboarding,
            title: format!("Configure {}", self.cfg.app.name),
            body: format!(
                "This repository is not yet managed by {}.\n\n\
                 Merging this PR adds `{}` and enables dependency update PRs.",
                self.cfg.app.name, file
            ),
            branch: format!("{}configure", self.cfg.branch_prefix),
            files: vec![FileChange::new(file.clone(), content)],
        }
    }
}

/// The configured config file first, then the well-known names.
fn config_file_candidates(configured: &str) -> Vec<String> {
    let mut files = vec![configured.to_string()];
    for known in KNOWN_CONFIG_FILES {
        if *known != configured {
            files.push(known.to_string());
        }
    }
    files
}
