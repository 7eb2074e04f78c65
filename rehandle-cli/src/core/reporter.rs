use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use rehandle::processor::Bucket;
use rehandle::progress::{FileSkipReason, ProgressEvent, Reporter};
use std::sync::Mutex;

/// Renders progress on stderr: a bar across repositories, with per-repository
/// and per-file lines printed above it.
pub struct ConsoleReporter {
    bar: Mutex<Option<ProgressBar>>,
    verbose: bool,
    hidden: bool,
}

impl ConsoleReporter {
    pub fn new(verbose: bool) -> Self {
        Self {
            bar: Mutex::new(None),
            verbose,
            hidden: false,
        }
    }

    /// No bar is drawn; lines still go to stderr.
    #[cfg(test)]
    pub fn hidden(verbose: bool) -> Self {
        Self {
            hidden: true,
            ..Self::new(verbose)
        }
    }

    pub fn finish(&self) {
        if let Some(bar) = self.current_bar() {
            bar.finish_and_clear();
        }
    }

    pub(crate) fn current_bar(&self) -> Option<ProgressBar> {
        self.bar.lock().ok().and_then(|bar| bar.clone())
    }

    fn start_bar(&self, total: usize) {
        let bar = ProgressBar::new(total as u64);
        if self.hidden {
            bar.set_draw_target(ProgressDrawTarget::hidden());
        }
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:30.cyan/blue}] {pos}/{len} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("=> "),
        );
        bar.enable_steady_tick(std::time::Duration::from_millis(100));

        if let Ok(mut slot) = self.bar.lock() {
            *slot = Some(bar);
        }
    }

    /// Print above the bar so it is not torn.
    fn line(&self, text: String) {
        match self.current_bar() {
            Some(bar) => bar.suspend(|| eprintln!("{}", text)),
            None => eprintln!("{}", text),
        }
    }
}

impl Reporter for ConsoleReporter {
    fn report(&self, event: &ProgressEvent) {
        match event {
            ProgressEvent::Authenticated { login } => {
                self.line(format!("✓ Authenticated as {}", login));
            }
            ProgressEvent::RepositoriesListed { count } => {
                self.line(format!("Found {} repositories", count));
                if *count > 0 {
                    self.start_bar(*count);
                }
            }
            ProgressEvent::RepositoryStarted {
                index,
                total,
                full_name,
            } => {
                if let Some(bar) = self.current_bar() {
                    bar.set_message(full_name.clone());
                }
                if self.verbose {
                    self.line(format!("[{}/{}] {}", index, total, full_name));
                }
            }
            ProgressEvent::FileChanged { path, count } => {
                self.line(format!("    ✎ {} ({} replacement(s))", path, count));
            }
            ProgressEvent::FileSkipped { path, reason } => {
                if self.verbose {
                    let why = match reason {
                        FileSkipReason::Unreadable => "not readable as text",
                        FileSkipReason::NoMatch => "no match",
                    };
                    self.line(format!("    · {} ({})", path, why));
                }
            }
            ProgressEvent::FileFailed { path, error } => {
                self.line(format!("    ⚠️  {}: {}", path, error));
            }
            ProgressEvent::RepositoryFinished { full_name, outcome } => {
                let icon = match outcome.bucket() {
                    Bucket::Updated => "✓",
                    Bucket::Skipped => "·",
                    Bucket::Failed => "✗",
                };
                self.line(format!("{} {}: {}", icon, full_name, outcome));
                if let Some(bar) = self.current_bar() {
                    bar.inc(1);
                }
            }
        }
    }
}
