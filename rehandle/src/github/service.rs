use async_trait::async_trait;

use super::types::{AuthenticatedUser, CommitRecord, FileContent, PendingEdit, RepositoryRef, TreeEntry};
use crate::error::Result;

/// The slice of a source-hosting API a migration run needs.
///
/// Calls are issued one at a time; implementations handle their own
/// rate-limit backoff and listing pagination.
#[async_trait]
pub trait HostingService: Send + Sync {
    /// Check the credential and return who it belongs to.
    async fn verify_auth(&self) -> Result<AuthenticatedUser>;

    /// Every repository of the authenticated user, most recently updated first.
    async fn list_all_repositories(&self) -> Result<Vec<RepositoryRef>>;

    /// Blob entries of the default branch, recursively.
    async fn list_tree(&self, owner: &str, repo: &str) -> Result<Vec<TreeEntry>>;

    /// `Ok(None)` means the file is not transported as text and must be skipped.
    async fn read_file(&self, owner: &str, repo: &str, path: &str) -> Result<Option<FileContent>>;

    /// Commit one edit, guarded by the sha it was read at.
    async fn write_file(
        &self,
        owner: &str,
        repo: &str,
        edit: &PendingEdit,
        message: &str,
    ) -> Result<CommitRecord>;
}
