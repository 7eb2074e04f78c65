use serde::Serialize;
use std::sync::Arc;

use crate::error::Result;
use crate::github::HostingService;
use crate::pacing::{Pacer, Pause};
use crate::processor::{RepositoryProcessor, RepositoryReport, RunOptions};
use crate::progress::{ProgressEvent, Reporter};
use crate::stats::RunStats;

/// Result of a complete run.
#[derive(Debug, Clone, Serialize)]
pub struct RunReport {
    /// Login the token belongs to
    pub login: String,
    pub old_username: String,
    pub new_username: String,
    pub dry_run: bool,
    pub stats: RunStats,
    pub repositories: Vec<RepositoryReport>,
}

/// Drives the processor over every repository, strictly one after another.
pub struct Orchestrator {
    service: Arc<dyn HostingService>,
    processor: RepositoryProcessor,
    pacer: Pacer,
    reporter: Arc<dyn Reporter>,
}

impl Orchestrator {
    pub fn new(
        service: Arc<dyn HostingService>,
        options: RunOptions,
        pacer: Pacer,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let processor =
            RepositoryProcessor::new(service.clone(), options, pacer.clone(), reporter.clone());

        Self {
            service,
            processor,
            pacer,
            reporter,
        }
    }

    /// Authenticate, list, then process each repository in listing order.
    ///
    /// Only authentication and listing failures are returned as errors;
    /// per-repository failures end up in the stats.
    pub async fn run(&self) -> Result<RunReport> {
        let user = self.service.verify_auth().await?;
        self.reporter.report(&ProgressEvent::Authenticated {
            login: user.login.clone(),
        });

        let repos = self.service.list_all_repositories().await?;
        let total = repos.len();
        self.reporter
            .report(&ProgressEvent::RepositoriesListed { count: total });

        let mut stats = RunStats::new(total);
        let mut reports = Vec::with_capacity(total);

        for (i, repo) in repos.iter().enumerate() {
            self.reporter.report(&ProgressEvent::RepositoryStarted {
                index: i + 1,
                total,
                full_name: repo.full_name.clone(),
            });

            let report = self.processor.process(repo).await;
            tracing::info!("{}: {}", report.full_name, report.outcome);
            stats.record(&report);

            self.reporter.report(&ProgressEvent::RepositoryFinished {
                full_name: report.full_name.clone(),
                outcome: report.outcome.clone(),
            });
            reports.push(report);

            if i + 1 < total {
                self.pacer.pause(Pause::Repository).await;
            }
        }

        let options = self.processor.options();
        Ok(RunReport {
            login: user.login,
            old_username: options.usernames.old.to_string(),
            new_username: options.usernames.new.to_string(),
            dry_run: options.dry_run,
            stats,
            repositories: reports,
        })
    }
}
