//! Run statistics.

use chrono::{DateTime, Utc};

use crate::domain::PullRequestKind;

/// What happened to a single planned pull request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Created(PullRequestKind),
    DryRun,
    Deferred,
    Failed,
}

/// Summary of one cycle.
#[derive(Debug, Clone)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub repositories: usize,
    pub onboarding_prs: u64,
    pub update_prs: u64,
    /// PRs that would have been created in dry-run mode.
    pub dry_run: u64,
    /// PRs skipped because one is already open on the branch.
    pub existing: u64,
    /// PRs the rate limiter refused this cycle.
    pub deferred: u64,
    pub failed: u64,
}

impl RunReport {
    pub(crate) fn begin() -> Self {
        Self {
            started_at: Utc::now(),
            finished_at: None,
            repositories: 0,
            onboarding_prs: 0,
            update_prs: 0,
            dry_run: 0,
            existing: 0,
            deferred: 0,
            failed: 0,
        }
    }

    pub(crate) fn record(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Created(PullRequestKind::Onboarding) => self.onboarding_prs += 1,
            Outcome::Created(PullRequestKind::Update) => self.update_prs += 1,
            Outcome::DryRun => self.dry_run += 1,
            Outcome::Deferred => self.deferred += 1,
            Outcome::Failed => self.failed += 1,
        }
    }

    pub(crate) fn finish(&mut self) {
        self.finished_at = Some(Utc::now());
    }

    /// PRs actually opened this cycle.
    pub fn created(&self) -> u64 {
        self.onboarding_prs + self.update_prs
    }
}

/// Cumulative statistics across cycles.
#[derive(Debug, Clone, Default)]
pub struct Stats {
    pub cycles: u64,
    pub repositories_processed: u64,
    pub onboarding_prs_created: u64,
    pub update_prs_created: u64,
    pub dry_run_skipped: u64,
    pub deferred: u64,
    pub failed: u64,
}

impl Stats {
    pub(crate) fn absorb(&mut self, report: &RunReport) {
        self.cycles += 1;
        self.repositories_processed += report.repositories as u64;
        self.onboarding_prs_created += report.onboarding_prs;
        self.update_prs_created += report.update_prs;
        self.dry_run_skipped += report.dry_run;
        self.deferred += report.deferred;
        self.failed += report.failed;
    }
}
