pub mod client;
pub mod rate_limit;
pub mod service;
pub mod types;

pub use client::GitHubClient;
pub use rate_limit::QuotaExhausted;
pub use service::HostingService;
pub use types::{
    AuthenticatedUser, CommitRecord, EntryKind, FileContent, Owner, PendingEdit, RepositoryRef,
    TreeEntry,
};
