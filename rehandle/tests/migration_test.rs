use pretty_assertions::assert_eq;
use rehandle::config::PacingConfig;
use rehandle::github::{HostingService, RepositoryRef};
use rehandle::processor::SkipReason;
use rehandle::progress::{CollectingReporter, FileSkipReason, ProgressEvent};
use rehandle::{
    Orchestrator, Pacer, RecordingSleeper, RehandleError, RepositoryOutcome, RunOptions, RunStats,
    UsernamePair,
};
use std::sync::Arc;
use std::time::Duration;

use fake_host::{Call, FakeHost};

// In-memory hosting service recording every call
mod fake_host {
    use async_trait::async_trait;
    use rehandle::error::{RehandleError, Result};
    use rehandle::github::{
        AuthenticatedUser, CommitRecord, FileContent, HostingService, PendingEdit, RepositoryRef,
        TreeEntry,
    };
    use std::collections::{HashMap, HashSet};
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Call {
        VerifyAuth,
        ListRepositories,
        ListTree(String),
        ReadFile(String, String),
        WriteFile {
            repo: String,
            path: String,
            sha: String,
            content: String,
            message: String,
        },
    }

    enum Blob {
        Text { text: String, sha: String },
        Binary,
    }

    #[derive(Default)]
    pub struct FakeHost {
        reject_auth: bool,
        repos: Vec<RepositoryRef>,
        trees: HashMap<String, Vec<TreeEntry>>,
        blobs: HashMap<(String, String), Blob>,
        broken_trees: HashSet<String>,
        broken_reads: HashSet<(String, String)>,
        stale_writes: HashSet<(String, String)>,
        calls: Mutex<Vec<Call>>,
    }

    impl FakeHost {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn rejecting_auth() -> Self {
            Self {
                reject_auth: true,
                ..Self::default()
            }
        }

        pub fn repo(mut self, repo: RepositoryRef) -> Self {
            self.trees.entry(repo.full_name.clone()).or_default();
            self.repos.push(repo);
            self
        }

        pub fn text(mut self, full_name: &str, path: &str, text: &str, sha: &str) -> Self {
            self.add_entry(full_name, path);
            self.blobs.insert(
                (full_name.to_string(), path.to_string()),
                Blob::Text {
                    text: text.to_string(),
                    sha: sha.to_string(),
                },
            );
            self
        }

        pub fn binary(mut self, full_name: &str, path: &str) -> Self {
            self.add_entry(full_name, path);
            self.blobs
                .insert((full_name.to_string(), path.to_string()), Blob::Binary);
            self
        }

        pub fn broken_tree(mut self, full_name: &str) -> Self {
            self.broken_trees.insert(full_name.to_string());
            self
        }

        pub fn broken_read(mut self, full_name: &str, path: &str) -> Self {
            self.broken_reads
                .insert((full_name.to_string(), path.to_string()));
            self
        }

        pub fn stale_write(mut self, full_name: &str, path: &str) -> Self {
            self.stale_writes
                .insert((full_name.to_string(), path.to_string()));
            self
        }

        fn add_entry(&mut self, full_name: &str, path: &str) {
            self.trees
                .entry(full_name.to_string())
                .or_default()
                .push(TreeEntry::blob(path));
        }

        fn log(&self, call: Call) {
            self.calls.lock().unwrap().push(call);
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        pub fn writes(&self) -> Vec<Call> {
            self.calls()
                .into_iter()
                .filter(|c| matches!(c, Call::WriteFile { .. }))
                .collect()
        }
    }

    #[async_trait]
    impl HostingService for FakeHost {
        async fn verify_auth(&self) -> Result<AuthenticatedUser> {
            self.log(Call::VerifyAuth);
            if self.reject_auth {
                return Err(RehandleError::Auth("Bad credentials".to_string()));
            }
            Ok(AuthenticatedUser {
                login: "alice".to_string(),
                name: None,
            })
        }

        async fn list_all_repositories(&self) -> Result<Vec<RepositoryRef>> {
            self.log(Call::ListRepositories);
            Ok(self.repos.clone())
        }

        async fn list_tree(&self, owner: &str, repo: &str) -> Result<Vec<TreeEntry>> {
            let full_name = format!("{}/{}", owner, repo);
            self.log(Call::ListTree(full_name.clone()));
            if self.broken_trees.contains(&full_name) {
                return Err(RehandleError::Transport {
                    status: 500,
                    message: "Server Error".to_string(),
                });
            }
            Ok(self.trees.get(&full_name).cloned().unwrap_or_default())
        }

        async fn read_file(
            &self,
            owner: &str,
            repo: &str,
            path: &str,
        ) -> Result<Option<FileContent>> {
            let key = (format!("{}/{}", owner, repo), path.to_string());
            self.log(Call::ReadFile(key.0.clone(), key.1.clone()));
            if self.broken_reads.contains(&key) {
                return Err(RehandleError::Transport {
                    status: 502,
                    message: "Bad Gateway".to_string(),
                });
            }
            match self.blobs.get(&key) {
                Some(Blob::Text { text, sha }) => Ok(Some(FileContent {
                    path: path.to_string(),
                    text: text.clone(),
                    sha: sha.clone(),
                    encoding: "base64".to_string(),
                })),
                Some(Blob::Binary) => Ok(None),
                None => Err(RehandleError::Transport {
                    status: 404,
                    message: "Not Found".to_string(),
                }),
            }
        }

        async fn write_file(
            &self,
            owner: &str,
            repo: &str,
            edit: &PendingEdit,
            message: &str,
        ) -> Result<CommitRecord> {
            let full_name = format!("{}/{}", owner, repo);
            self.log(Call::WriteFile {
                repo: full_name.clone(),
                path: edit.path.clone(),
                sha: edit.sha.clone(),
                content: edit.content.clone(),
                message: message.to_string(),
            });
            if self.stale_writes.contains(&(full_name, edit.path.clone())) {
                return Err(RehandleError::Conflict {
                    path: edit.path.clone(),
                });
            }
            Ok(CommitRecord {
                commit_sha: format!("commit-{}", edit.path),
                content_sha: Some(format!("new-{}", edit.sha)),
                html_url: None,
            })
        }
    }
}

struct Harness {
    host: Arc<FakeHost>,
    sleeper: RecordingSleeper,
    reporter: Arc<CollectingReporter>,
    orchestrator: Orchestrator,
}

fn harness(host: FakeHost, options: RunOptions, pacing: PacingConfig) -> Harness {
    let host = Arc::new(host);
    let service: Arc<dyn HostingService> = host.clone();
    let sleeper = RecordingSleeper::new();
    let pacer = Pacer::new(Arc::new(sleeper.clone()), pacing);
    let reporter = Arc::new(CollectingReporter::new());
    let orchestrator = Orchestrator::new(service, options, pacer, reporter.clone());

    Harness {
        host,
        sleeper,
        reporter,
        orchestrator,
    }
}

fn alice_to_bob() -> RunOptions {
    RunOptions::new(UsernamePair::new("alice", "bob").unwrap())
}

fn readme_and_license() -> FakeHost {
    FakeHost::new()
        .repo(RepositoryRef::new("alice", "site"))
        .text("alice/site", "README.md", "Hello alice, alice!", "sha-readme")
        .text("alice/site", "LICENSE", "Copyright alice", "sha-license")
}

#[tokio::test]
async fn test_dry_run_counts_changes_without_writing() {
    let h = harness(
        readme_and_license(),
        alice_to_bob().dry_run(true),
        PacingConfig::none(),
    );

    let report = h.orchestrator.run().await.unwrap();

    assert_eq!(
        report.stats,
        RunStats {
            total_repos: 1,
            updated: 1,
            skipped: 0,
            failed: 0,
            files_changed: 2,
            total_replacements: 3,
        }
    );
    assert!(report.dry_run);
    assert_eq!(
        report.repositories[0].outcome,
        RepositoryOutcome::WouldCommit { files: 2 }
    );
    assert!(h.host.writes().is_empty());
}

#[tokio::test]
async fn test_live_run_writes_each_file_with_its_prior_sha() {
    let h = harness(readme_and_license(), alice_to_bob(), PacingConfig::none());

    let report = h.orchestrator.run().await.unwrap();

    assert_eq!(report.stats.updated, 1);
    assert_eq!(report.stats.failed, 0);
    assert_eq!(
        h.host.writes(),
        vec![
            Call::WriteFile {
                repo: "alice/site".to_string(),
                path: "README.md".to_string(),
                sha: "sha-readme".to_string(),
                content: "Hello bob, bob!".to_string(),
                message: "chore: updated username from alice to bob".to_string(),
            },
            Call::WriteFile {
                repo: "alice/site".to_string(),
                path: "LICENSE".to_string(),
                sha: "sha-license".to_string(),
                content: "Copyright bob".to_string(),
                message: "chore: updated username from alice to bob".to_string(),
            },
        ]
    );
    assert_eq!(report.repositories[0].commits.len(), 2);
}

#[tokio::test]
async fn test_archived_repository_is_never_scanned() {
    let host = FakeHost::new()
        .repo(RepositoryRef::new("alice", "old").archived(true))
        .text("alice/old", "README.md", "alice", "s");
    let h = harness(host, alice_to_bob(), PacingConfig::none());

    let report = h.orchestrator.run().await.unwrap();

    assert_eq!(report.stats.skipped, 1);
    assert_eq!(
        report.repositories[0].outcome,
        RepositoryOutcome::Skipped {
            reason: SkipReason::Archived
        }
    );
    assert_eq!(
        h.host.calls(),
        vec![Call::VerifyAuth, Call::ListRepositories]
    );
}

#[tokio::test]
async fn test_forks_skipped_only_when_asked() {
    let host = || {
        FakeHost::new()
            .repo(RepositoryRef::new("alice", "fork").fork(true))
            .text("alice/fork", "README.md", "by alice", "s")
    };

    let h = harness(host(), alice_to_bob().include_forks(false), PacingConfig::none());
    let report = h.orchestrator.run().await.unwrap();
    assert_eq!(
        report.repositories[0].outcome,
        RepositoryOutcome::Skipped {
            reason: SkipReason::Fork
        }
    );

    let h = harness(host(), alice_to_bob(), PacingConfig::none());
    let report = h.orchestrator.run().await.unwrap();
    assert_eq!(
        report.repositories[0].outcome,
        RepositoryOutcome::Committed { files: 1 }
    );
}

#[tokio::test]
async fn test_repository_without_eligible_files_is_skipped() {
    let host = FakeHost::new()
        .repo(RepositoryRef::new("alice", "assets"))
        .binary("alice/assets", "logo.png")
        .binary("alice/assets", "font.woff2");
    let h = harness(host, alice_to_bob(), PacingConfig::none());

    let report = h.orchestrator.run().await.unwrap();

    assert_eq!(
        report.repositories[0].outcome,
        RepositoryOutcome::Skipped {
            reason: SkipReason::NoEligibleFiles
        }
    );
    assert!(!h
        .host
        .calls()
        .iter()
        .any(|c| matches!(c, Call::ReadFile(..))));
}

#[tokio::test]
async fn test_no_matches_is_counted_as_skipped() {
    let host = FakeHost::new()
        .repo(RepositoryRef::new("alice", "notes"))
        .text("alice/notes", "todo.md", "nothing here", "s");
    let h = harness(host, alice_to_bob(), PacingConfig::none());

    let report = h.orchestrator.run().await.unwrap();

    assert_eq!(report.repositories[0].outcome, RepositoryOutcome::NoChange);
    assert_eq!(report.stats.skipped, 1);
    assert_eq!(report.stats.files_changed, 0);
    assert!(h.reporter.events().contains(&ProgressEvent::FileSkipped {
        path: "todo.md".to_string(),
        reason: FileSkipReason::NoMatch,
    }));
}

#[tokio::test]
async fn test_unreadable_file_is_skipped_not_emptied() {
    let host = FakeHost::new()
        .repo(RepositoryRef::new("alice", "site"))
        .binary("alice/site", "data.json")
        .text("alice/site", "README.md", "alice", "s");
    let h = harness(host, alice_to_bob(), PacingConfig::none());

    let report = h.orchestrator.run().await.unwrap();

    assert_eq!(report.stats.files_changed, 1);
    assert!(h.reporter.events().contains(&ProgressEvent::FileSkipped {
        path: "data.json".to_string(),
        reason: FileSkipReason::Unreadable,
    }));
    let written: Vec<_> = h
        .host
        .writes()
        .into_iter()
        .filter_map(|c| match c {
            Call::WriteFile { path, .. } => Some(path),
            _ => None,
        })
        .collect();
    assert_eq!(written, vec!["README.md".to_string()]);
}

#[tokio::test]
async fn test_failed_read_does_not_stop_other_files() {
    let host = FakeHost::new()
        .repo(RepositoryRef::new("alice", "site"))
        .text("alice/site", "a.md", "alice", "sa")
        .text("alice/site", "b.md", "alice", "sb")
        .text("alice/site", "c.md", "alice", "sc")
        .broken_read("alice/site", "b.md");
    let h = harness(host, alice_to_bob(), PacingConfig::none());

    let report = h.orchestrator.run().await.unwrap();
    let repo = &report.repositories[0];

    assert_eq!(repo.outcome, RepositoryOutcome::Committed { files: 2 });
    assert_eq!(repo.file_failures, 1);
    assert_eq!(report.stats.updated, 1);
    assert_eq!(report.stats.files_changed, 2);
    assert!(h
        .reporter
        .events()
        .iter()
        .any(|e| matches!(e, ProgressEvent::FileFailed { path, .. } if path == "b.md")));
}

#[tokio::test]
async fn test_conflict_stops_remaining_commits() {
    let host = FakeHost::new()
        .repo(RepositoryRef::new("alice", "site"))
        .text("alice/site", "a.md", "alice", "sa")
        .text("alice/site", "b.md", "alice", "sb")
        .text("alice/site", "c.md", "alice", "sc")
        .stale_write("alice/site", "b.md");
    let h = harness(host, alice_to_bob(), PacingConfig::none());

    let report = h.orchestrator.run().await.unwrap();
    let repo = &report.repositories[0];

    // a.md landed, b.md conflicted, c.md was never attempted.
    assert_eq!(h.host.writes().len(), 2);
    assert_eq!(repo.commits.len(), 1);
    match &repo.outcome {
        RepositoryOutcome::Failed { error, committed } => {
            assert!(error.contains("b.md"));
            assert_eq!(*committed, 1);
        }
        other => panic!("expected failure, got {:?}", other),
    }
    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.updated, 0);
    // Staged edits still count toward the totals.
    assert_eq!(report.stats.files_changed, 3);
    assert_eq!(report.stats.total_replacements, 3);
}

#[tokio::test]
async fn test_repository_failure_does_not_abort_batch() {
    let host = FakeHost::new()
        .repo(RepositoryRef::new("alice", "broken"))
        .repo(RepositoryRef::new("alice", "site"))
        .text("alice/site", "README.md", "alice", "s")
        .broken_tree("alice/broken");
    let h = harness(host, alice_to_bob(), PacingConfig::none());

    let report = h.orchestrator.run().await.unwrap();

    assert_eq!(report.stats.failed, 1);
    assert_eq!(report.stats.updated, 1);
    assert_eq!(report.stats.processed(), report.stats.total_repos);
    assert!(matches!(
        report.repositories[0].outcome,
        RepositoryOutcome::Failed { committed: 0, .. }
    ));
}

#[tokio::test]
async fn test_auth_failure_stops_before_listing() {
    let h = harness(
        FakeHost::rejecting_auth().repo(RepositoryRef::new("alice", "site")),
        alice_to_bob(),
        PacingConfig::none(),
    );

    let err = h.orchestrator.run().await.unwrap_err();

    assert!(matches!(err, RehandleError::Auth(_)));
    assert!(err.is_fatal());
    assert_eq!(h.host.calls(), vec![Call::VerifyAuth]);
}

#[tokio::test]
async fn test_pause_between_repositories_but_not_after_last() {
    let host = FakeHost::new()
        .repo(RepositoryRef::new("alice", "one"))
        .repo(RepositoryRef::new("alice", "two"))
        .repo(RepositoryRef::new("alice", "three"));
    let pacing = PacingConfig {
        repository_ms: 1500,
        ..PacingConfig::none()
    };
    let h = harness(host, alice_to_bob(), pacing);

    h.orchestrator.run().await.unwrap();

    assert_eq!(
        h.sleeper.naps(),
        vec![Duration::from_millis(1500), Duration::from_millis(1500)]
    );
}

#[tokio::test]
async fn test_file_and_commit_pacing() {
    let pacing = PacingConfig {
        file_read_ms: 300,
        commit_ms: 500,
        ..PacingConfig::none()
    };
    let h = harness(readme_and_license(), alice_to_bob(), pacing);

    h.orchestrator.run().await.unwrap();

    assert_eq!(
        h.sleeper.naps(),
        vec![
            Duration::from_millis(300),
            Duration::from_millis(300),
            Duration::from_millis(500),
            Duration::from_millis(500),
        ]
    );
}

#[tokio::test]
async fn test_progress_event_sequence() {
    let h = harness(
        readme_and_license(),
        alice_to_bob().dry_run(true),
        PacingConfig::none(),
    );

    h.orchestrator.run().await.unwrap();

    assert_eq!(
        h.reporter.events(),
        vec![
            ProgressEvent::Authenticated {
                login: "alice".to_string()
            },
            ProgressEvent::RepositoriesListed { count: 1 },
            ProgressEvent::RepositoryStarted {
                index: 1,
                total: 1,
                full_name: "alice/site".to_string()
            },
            ProgressEvent::FileChanged {
                path: "README.md".to_string(),
                count: 2
            },
            ProgressEvent::FileChanged {
                path: "LICENSE".to_string(),
                count: 1
            },
            ProgressEvent::RepositoryFinished {
                full_name: "alice/site".to_string(),
                outcome: RepositoryOutcome::WouldCommit { files: 2 }
            },
        ]
    );
}
