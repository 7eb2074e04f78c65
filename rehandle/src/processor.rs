use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::classifier;
use crate::error::Result;
use crate::github::{CommitRecord, HostingService, PendingEdit, RepositoryRef, TreeEntry};
use crate::identifier::UsernamePair;
use crate::pacing::{Pacer, Pause};
use crate::progress::{FileSkipReason, ProgressEvent, Reporter};
use crate::substitute::Substitution;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    Archived,
    Fork,
    NoEligibleFiles,
}

/// How processing one repository ended.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum RepositoryOutcome {
    Skipped { reason: SkipReason },
    /// Scanned, nothing to replace
    NoChange,
    /// Dry run with edits staged
    WouldCommit { files: usize },
    Committed { files: usize },
    /// `committed` edits landed before the failure and stay in place
    Failed { error: String, committed: usize },
}

/// The RunStats counter a finished repository lands in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bucket {
    Updated,
    Skipped,
    Failed,
}

impl RepositoryOutcome {
    pub fn bucket(&self) -> Bucket {
        match self {
            RepositoryOutcome::WouldCommit { .. } | RepositoryOutcome::Committed { .. } => {
                Bucket::Updated
            }
            RepositoryOutcome::Skipped { .. } | RepositoryOutcome::NoChange => Bucket::Skipped,
            RepositoryOutcome::Failed { .. } => Bucket::Failed,
        }
    }
}

impl fmt::Display for RepositoryOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepositoryOutcome::Skipped { reason } => match reason {
                SkipReason::Archived => write!(f, "Skipped (archived repository)"),
                SkipReason::Fork => write!(f, "Skipped (fork)"),
                SkipReason::NoEligibleFiles => write!(f, "No processable files found"),
            },
            RepositoryOutcome::NoChange => write!(f, "No changes needed"),
            RepositoryOutcome::WouldCommit { files } => {
                write!(f, "Would commit {} file(s) (dry-run)", files)
            }
            RepositoryOutcome::Committed { files } => write!(f, "Committed {} file(s)", files),
            RepositoryOutcome::Failed { error, committed } => {
                write!(f, "Failed: {}", error)?;
                if *committed > 0 {
                    write!(f, " ({} file(s) already committed)", committed)?;
                }
                Ok(())
            }
        }
    }
}

/// A file the run rewrote (or would rewrite).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChangedFile {
    pub path: String,
    pub count: usize,
}

/// Everything that happened to one repository.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RepositoryReport {
    pub full_name: String,
    pub outcome: RepositoryOutcome,
    pub changed_files: Vec<ChangedFile>,
    pub replacements: usize,
    pub file_failures: usize,
    pub commits: Vec<CommitRecord>,
}

impl RepositoryReport {
    fn new(repo: &RepositoryRef) -> Self {
        Self {
            full_name: repo.full_name.clone(),
            outcome: RepositoryOutcome::NoChange,
            changed_files: Vec::new(),
            replacements: 0,
            file_failures: 0,
            commits: Vec::new(),
        }
    }

    pub fn files_changed(&self) -> usize {
        self.changed_files.len()
    }
}

/// Switches that shape a run.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub usernames: UsernamePair,
    /// Read and compute everything, write nothing
    pub dry_run: bool,
    /// Forks are processed like any other repository unless this is false
    pub include_forks: bool,
}

impl RunOptions {
    pub fn new(usernames: UsernamePair) -> Self {
        Self {
            usernames,
            dry_run: false,
            include_forks: true,
        }
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    pub fn include_forks(mut self, include_forks: bool) -> Self {
        self.include_forks = include_forks;
        self
    }
}

/// Scan → filter → rewrite → commit for a single repository.
///
/// Failures never escape `process`: a file that cannot be read is reported
/// and the loop moves on, anything else ends the repository as `Failed`.
pub struct RepositoryProcessor {
    service: Arc<dyn HostingService>,
    substitution: Substitution,
    commit_message: String,
    options: RunOptions,
    pacer: Pacer,
    reporter: Arc<dyn Reporter>,
}

impl RepositoryProcessor {
    pub fn new(
        service: Arc<dyn HostingService>,
        options: RunOptions,
        pacer: Pacer,
        reporter: Arc<dyn Reporter>,
    ) -> Self {
        let substitution = Substitution::new(
            options.usernames.old.as_str(),
            options.usernames.new.as_str(),
        );
        let commit_message = options.usernames.commit_message();

        Self {
            service,
            substitution,
            commit_message,
            options,
            pacer,
            reporter,
        }
    }

    pub fn options(&self) -> &RunOptions {
        &self.options
    }

    pub async fn process(&self, repo: &RepositoryRef) -> RepositoryReport {
        let mut report = RepositoryReport::new(repo);

        let outcome = match self.run(repo, &mut report).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::error!("{}: {}", repo.full_name, e);
                RepositoryOutcome::Failed {
                    error: e.to_string(),
                    committed: report.commits.len(),
                }
            }
        };

        report.outcome = outcome;
        report
    }

    async fn run(
        &self,
        repo: &RepositoryRef,
        report: &mut RepositoryReport,
    ) -> Result<RepositoryOutcome> {
        if repo.archived {
            return Ok(RepositoryOutcome::Skipped {
                reason: SkipReason::Archived,
            });
        }
        if repo.fork && !self.options.include_forks {
            return Ok(RepositoryOutcome::Skipped {
                reason: SkipReason::Fork,
            });
        }

        let eligible: Vec<TreeEntry> = self
            .service
            .list_tree(repo.owner(), &repo.name)
            .await?
            .into_iter()
            .filter(|entry| classifier::is_eligible(&entry.path))
            .collect();

        tracing::debug!("{}: {} processable files", repo.full_name, eligible.len());
        if eligible.is_empty() {
            return Ok(RepositoryOutcome::Skipped {
                reason: SkipReason::NoEligibleFiles,
            });
        }

        let edits = self.stage_edits(repo, &eligible, report).await;

        if edits.is_empty() {
            return Ok(RepositoryOutcome::NoChange);
        }
        if self.options.dry_run {
            return Ok(RepositoryOutcome::WouldCommit { files: edits.len() });
        }

        self.commit(repo, &edits, report).await?;
        Ok(RepositoryOutcome::Committed { files: edits.len() })
    }

    /// Read and rewrite every eligible file, one at a time.
    async fn stage_edits(
        &self,
        repo: &RepositoryRef,
        entries: &[TreeEntry],
        report: &mut RepositoryReport,
    ) -> Vec<PendingEdit> {
        let mut edits = Vec::new();

        for entry in entries {
            match self
                .service
                .read_file(repo.owner(), &repo.name, &entry.path)
                .await
            {
                Ok(Some(file)) => {
                    let replaced = self.substitution.apply(&file.text);

                    if replaced.count > 0 {
                        report.changed_files.push(ChangedFile {
                            path: entry.path.clone(),
                            count: replaced.count,
                        });
                        report.replacements += replaced.count;
                        self.reporter.report(&ProgressEvent::FileChanged {
                            path: entry.path.clone(),
                            count: replaced.count,
                        });

                        edits.push(PendingEdit {
                            path: entry.path.clone(),
                            sha: file.sha,
                            content: replaced.content,
                            count: replaced.count,
                        });
                    } else {
                        self.skip(&entry.path, FileSkipReason::NoMatch);
                    }
                }
                Ok(None) => self.skip(&entry.path, FileSkipReason::Unreadable),
                Err(e) => {
                    tracing::error!("Failed to process {}: {}", entry.path, e);
                    report.file_failures += 1;
                    self.reporter.report(&ProgressEvent::FileFailed {
                        path: entry.path.clone(),
                        error: e.to_string(),
                    });
                }
            }

            self.pacer.pause(Pause::FileRead).await;
        }

        edits
    }

    fn skip(&self, path: &str, reason: FileSkipReason) {
        self.reporter.report(&ProgressEvent::FileSkipped {
            path: path.to_string(),
            reason,
        });
    }

    /// One commit per file; the first failure stops the rest.
    async fn commit(
        &self,
        repo: &RepositoryRef,
        edits: &[PendingEdit],
        report: &mut RepositoryReport,
    ) -> Result<()> {
        for edit in edits {
            let record = self
                .service
                .write_file(repo.owner(), &repo.name, edit, &self.commit_message)
                .await?;

            tracing::debug!("{}: committed {} as {}", repo.full_name, edit.path, record.commit_sha);
            report.commits.push(record);
            self.pacer.pause(Pause::Commit).await;
        }

        Ok(())
    }
}
