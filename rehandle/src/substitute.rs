use regex::{NoExpand, Regex};
use serde::Serialize;

/// Outcome of running a [`Substitution`] over one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Replacement {
    /// Content after replacement (identical to the input when `count == 0`)
    pub content: String,

    /// Number of occurrences replaced
    pub count: usize,
}

/// Literal, case-sensitive, global replacement of one string with another.
#[derive(Debug, Clone)]
pub struct Substitution {
    /// Escaped literal; never interpreted as a pattern
    pattern: Regex,

    /// Inserted verbatim, `$` is not a group reference here
    replacement: String,
}

impl Substitution {
    pub fn new(old: &str, new: &str) -> Self {
        let pattern =
            Regex::new(&regex::escape(old)).expect("escaped literal is always a valid pattern");

        Self {
            pattern,
            replacement: new.to_string(),
        }
    }

    /// Replace every non-overlapping occurrence, scanning left to right.
    pub fn apply(&self, content: &str) -> Replacement {
        if self.pattern.as_str().is_empty() {
            return Replacement {
                content: content.to_string(),
                count: 0,
            };
        }

        let count = self.pattern.find_iter(content).count();
        if count == 0 {
            return Replacement {
                content: content.to_string(),
                count,
            };
        }

        let replaced = self
            .pattern
            .replace_all(content, NoExpand(&self.replacement));

        Replacement {
            content: replaced.into_owned(),
            count,
        }
    }
}

/// One-shot form of [`Substitution::apply`].
pub fn substitute(content: &str, old: &str, new: &str) -> Replacement {
    Substitution::new(old, new).apply(content)
}
