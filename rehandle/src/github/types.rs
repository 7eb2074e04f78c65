use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthenticatedUser {
    pub login: String,
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Owner {
    pub login: String,
}

/// A repository as returned by the listing endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepositoryRef {
    pub name: String,
    pub full_name: String,
    pub owner: Owner,
    #[serde(default)]
    pub archived: bool,
    #[serde(default)]
    pub fork: bool,
    #[serde(default = "default_branch")]
    pub default_branch: String,
}

fn default_branch() -> String {
    "main".to_string()
}

impl RepositoryRef {
    pub fn new(owner: &str, name: &str) -> Self {
        Self {
            name: name.to_string(),
            full_name: format!("{}/{}", owner, name),
            owner: Owner {
                login: owner.to_string(),
            },
            archived: false,
            fork: false,
            default_branch: default_branch(),
        }
    }

    pub fn archived(mut self, archived: bool) -> Self {
        self.archived = archived;
        self
    }

    pub fn fork(mut self, fork: bool) -> Self {
        self.fork = fork;
        self
    }

    pub fn owner(&self) -> &str {
        &self.owner.login
    }
}

/// Just enough of `GET /repos/{owner}/{repo}` to find the branch to read.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct RepositoryMetadata {
    pub default_branch: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Blob,
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeEntry {
    pub path: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    #[serde(default)]
    pub sha: Option<String>,
}

impl TreeEntry {
    pub fn blob(path: &str) -> Self {
        Self {
            path: path.to_string(),
            kind: EntryKind::Blob,
            sha: None,
        }
    }

    pub fn is_blob(&self) -> bool {
        self.kind == EntryKind::Blob
    }
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct TreeResponse {
    pub tree: Vec<TreeEntry>,
    #[serde(default)]
    pub truncated: bool,
}

/// Raw `GET /repos/{owner}/{repo}/contents/{path}` payload for a file.
#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ContentResponse {
    pub path: String,
    pub sha: String,
    #[serde(default)]
    pub encoding: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

/// A decoded text file and the sha it was read at.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileContent {
    pub path: String,
    pub text: String,
    /// Blob sha; the optimistic-concurrency precondition for the next write
    pub sha: String,
    pub encoding: String,
}

/// A rewritten file waiting to be committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PendingEdit {
    pub path: String,
    /// Sha the file had when it was read
    pub sha: String,
    pub content: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRecord {
    pub commit_sha: String,
    /// Sha of the new blob, if the service reported one
    pub content_sha: Option<String>,
    pub html_url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WriteResponse {
    #[serde(default)]
    pub content: Option<WrittenContent>,
    pub commit: WrittenCommit,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WrittenContent {
    pub sha: String,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct WrittenCommit {
    pub sha: String,
    #[serde(default)]
    pub html_url: Option<String>,
}

impl From<WriteResponse> for CommitRecord {
    fn from(response: WriteResponse) -> Self {
        Self {
            commit_sha: response.commit.sha,
            content_sha: response.content.map(|c| c.sha),
            html_url: response.commit.html_url,
        }
    }
}
