use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use crate::config::PacingConfig;

/// Something that can suspend the current task for a while.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Wall-clock sleeper backed by the tokio timer.
#[derive(Debug, Default, Clone, Copy)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        tokio::time::sleep(duration).await;
    }
}

/// Returns immediately and remembers every requested duration.
#[derive(Debug, Default, Clone)]
pub struct RecordingSleeper {
    naps: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every duration requested so far, in order
    pub fn naps(&self) -> Vec<Duration> {
        self.naps.lock().map(|n| n.clone()).unwrap_or_default()
    }

    pub fn total(&self) -> Duration {
        self.naps().into_iter().sum()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        if let Ok(mut naps) = self.naps.lock() {
            naps.push(duration);
        }
    }
}

/// The points in a run where a fixed pause is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pause {
    ListingPage,
    FileRead,
    Commit,
    Repository,
}

/// Fixed-interval scheduler keeping the run under GitHub's throttling.
#[derive(Clone)]
pub struct Pacer {
    sleeper: Arc<dyn Sleeper>,
    intervals: PacingConfig,
}

impl Pacer {
    pub fn new(sleeper: Arc<dyn Sleeper>, intervals: PacingConfig) -> Self {
        Self { sleeper, intervals }
    }

    /// Real sleeps with the given intervals.
    pub fn tokio(intervals: PacingConfig) -> Self {
        Self::new(Arc::new(TokioSleeper), intervals)
    }

    pub fn interval(&self, pause: Pause) -> Duration {
        let ms = match pause {
            Pause::ListingPage => self.intervals.listing_ms,
            Pause::FileRead => self.intervals.file_read_ms,
            Pause::Commit => self.intervals.commit_ms,
            Pause::Repository => self.intervals.repository_ms,
        };
        Duration::from_millis(ms)
    }

    pub async fn pause(&self, pause: Pause) {
        let duration = self.interval(pause);
        if !duration.is_zero() {
            self.sleeper.sleep(duration).await;
        }
    }

    /// Arbitrary wait, used for rate-limit backoff.
    pub async fn wait(&self, duration: Duration) {
        self.sleeper.sleep(duration).await;
    }
}

impl std::fmt::Debug for Pacer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pacer")
            .field("intervals", &self.intervals)
            .finish_non_exhaustive()
    }
}
