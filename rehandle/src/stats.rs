use serde::Serialize;

use crate::processor::{Bucket, RepositoryReport};

/// Run-wide counters. Every repository lands in exactly one of
/// updated / skipped / failed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunStats {
    /// Repositories returned by the listing
    pub total_repos: usize,
    pub updated: usize,
    pub skipped: usize,
    pub failed: usize,
    /// Files rewritten, or that would be rewritten in a dry run
    pub files_changed: usize,
    pub total_replacements: usize,
}

impl RunStats {
    pub fn new(total_repos: usize) -> Self {
        Self {
            total_repos,
            ..Self::default()
        }
    }

    pub fn record(&mut self, report: &RepositoryReport) {
        match report.outcome.bucket() {
            Bucket::Updated => self.updated += 1,
            Bucket::Skipped => self.skipped += 1,
            Bucket::Failed => self.failed += 1,
        }

        self.files_changed += report.files_changed();
        self.total_replacements += report.replacements;
    }

    /// Repositories with a recorded outcome so far
    pub fn processed(&self) -> usize {
        self.updated + self.skipped + self.failed
    }
}
