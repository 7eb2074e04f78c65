use thiserror::Error;

#[derive(Error, Debug)]
pub enum RehandleError {
    #[error("Invalid {role} username format: {value}")]
    InvalidUsername { role: &'static str, value: String },

    #[error("Old and new usernames cannot be the same")]
    SameUsername,

    #[error("GitHub token is required (--token, GITHUB_TOKEN or [github].token in the config file)")]
    MissingToken,

    #[error("Authentication failed: {0}")]
    Auth(String),

    #[error("GitHub API error {status}: {message}")]
    Transport { status: u16, message: String },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limit still exhausted after retries (resets in {reset_in_secs}s)")]
    RateLimited { reset_in_secs: u64 },

    #[error("Conflict updating {path}: file changed since it was read")]
    Conflict { path: String },

    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("Failed to decode file content: {0}")]
    Decode(String),

    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),
}

impl RehandleError {
    /// Errors that must stop the whole run before any repository is touched.
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            RehandleError::InvalidUsername { .. }
                | RehandleError::SameUsername
                | RehandleError::MissingToken
                | RehandleError::Auth(_)
                | RehandleError::Config(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, RehandleError>;
