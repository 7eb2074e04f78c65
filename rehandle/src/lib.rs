// rehandle/src/lib.rs
pub mod classifier;
pub mod config;
pub mod error;
pub mod github;
pub mod identifier;
pub mod orchestrator;
pub mod pacing;
pub mod processor;
pub mod progress;
pub mod stats;
pub mod substitute;

// Re-export key types
pub use config::Config;
pub use error::{RehandleError, Result};
pub use github::{GitHubClient, HostingService};
pub use identifier::{is_valid_username, Username, UsernamePair};
pub use orchestrator::{Orchestrator, RunReport};
pub use pacing::{Pacer, Pause, RecordingSleeper, Sleeper, TokioSleeper};
pub use processor::{RepositoryOutcome, RepositoryProcessor, RepositoryReport, RunOptions};
pub use progress::{ProgressEvent, Reporter};
pub use stats::RunStats;
pub use substitute::{substitute, Replacement, Substitution};
