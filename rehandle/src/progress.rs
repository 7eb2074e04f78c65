use serde::Serialize;
use std::sync::Mutex;

use crate::processor::RepositoryOutcome;

/// Why a file was looked at but left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FileSkipReason {
    /// Not transported as text (binary, too large, invalid UTF-8)
    Unreadable,
    /// Read fine, the old username does not occur in it
    NoMatch,
}

/// Things worth telling the user while a run is in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ProgressEvent {
    Authenticated {
        login: String,
    },
    RepositoriesListed {
        count: usize,
    },
    RepositoryStarted {
        index: usize,
        total: usize,
        full_name: String,
    },
    FileChanged {
        path: String,
        count: usize,
    },
    FileSkipped {
        path: String,
        reason: FileSkipReason,
    },
    FileFailed {
        path: String,
        error: String,
    },
    RepositoryFinished {
        full_name: String,
        outcome: RepositoryOutcome,
    },
}

/// Receives progress events; rendering is up to the implementor.
pub trait Reporter: Send + Sync {
    fn report(&self, event: &ProgressEvent);
}

/// Forwards every event to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingReporter;

impl Reporter for TracingReporter {
    fn report(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Authenticated { login } => tracing::info!("Authenticated as {}", login),
            ProgressEvent::RepositoriesListed { count } => {
                tracing::info!("Found {} repositories", count)
            }
            ProgressEvent::RepositoryStarted {
                index,
                total,
                full_name,
            } => tracing::info!("[{}/{}] {}", index, total, full_name),
            ProgressEvent::FileChanged { path, count } => {
                tracing::info!("  {} ({} replacement(s))", path, count)
            }
            ProgressEvent::FileSkipped { path, reason } => {
                tracing::debug!("  {} skipped ({:?})", path, reason)
            }
            ProgressEvent::FileFailed { path, error } => {
                tracing::error!("  Failed to process {}: {}", path, error)
            }
            ProgressEvent::RepositoryFinished { full_name, outcome } => {
                tracing::info!("{}: {}", full_name, outcome)
            }
        }
    }
}

/// Keeps every event in memory.
#[derive(Debug, Default)]
pub struct CollectingReporter {
    events: Mutex<Vec<ProgressEvent>>,
}

impl CollectingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().map(|e| e.clone()).unwrap_or_default()
    }
}

impl Reporter for CollectingReporter {
    fn report(&self, event: &ProgressEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event.clone());
        }
    }
}
