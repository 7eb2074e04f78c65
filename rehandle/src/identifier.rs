use crate::error::{RehandleError, Result};
use serde::Serialize;
use std::fmt;

/// Longest login GitHub accepts.
pub const MAX_USERNAME_LEN: usize = 39;

/// Check a string against GitHub's login grammar: ASCII alphanumerics and
/// single hyphens, 1-39 characters, no leading or trailing hyphen.
pub fn is_valid_username(candidate: &str) -> bool {
    if candidate.is_empty() || candidate.len() > MAX_USERNAME_LEN {
        return false;
    }

    let bytes = candidate.as_bytes();
    if bytes[0] == b'-' || bytes[bytes.len() - 1] == b'-' {
        return false;
    }

    let mut previous_hyphen = false;
    for &b in bytes {
        match b {
            b'-' if previous_hyphen => return false,
            b'-' => previous_hyphen = true,
            b if b.is_ascii_alphanumeric() => previous_hyphen = false,
            _ => return false,
        }
    }

    true
}

/// A username that passed [`is_valid_username`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Username(String);

impl Username {
    /// Validate `value`; `role` ("old" / "new") only feeds the error message.
    pub fn parse(role: &'static str, value: &str) -> Result<Self> {
        if is_valid_username(value) {
            Ok(Self(value.to_string()))
        } else {
            Err(RehandleError::InvalidUsername {
                role,
                value: value.to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Username {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for Username {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The validated old → new pair a run migrates between.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsernamePair {
    pub old: Username,
    pub new: Username,
}

impl UsernamePair {
    pub fn new(old: &str, new: &str) -> Result<Self> {
        let old = Username::parse("old", old)?;
        let new = Username::parse("new", new)?;

        if old == new {
            return Err(RehandleError::SameUsername);
        }

        Ok(Self { old, new })
    }

    /// Message used for every commit the run writes.
    pub fn commit_message(&self) -> String {
        format!("chore: updated username from {} to {}", self.old, self.new)
    }
}
