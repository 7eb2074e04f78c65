use reqwest::header::HeaderMap;
use reqwest::StatusCode;
use std::time::Duration;

const REMAINING: &str = "x-ratelimit-remaining";
const RESET: &str = "x-ratelimit-reset";
const RETRY_AFTER: &str = "retry-after";

/// Fallback when GitHub says the quota is gone but not when it comes back.
const UNKNOWN_RESET_WAIT: Duration = Duration::from_secs(60);

/// An exhausted quota and how long until it refills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuotaExhausted {
    /// Time until reset, never negative
    pub wait: Duration,
    /// Unix timestamp of the reset, when the primary limit was hit
    pub reset_at: Option<i64>,
}

impl QuotaExhausted {
    /// Inspect a failed response. `now` is the current unix time in seconds.
    ///
    /// Only 403 and 429 responses qualify, and only when they carry either a
    /// `retry-after` header (secondary limits) or `x-ratelimit-remaining: 0`.
    pub fn detect(status: StatusCode, headers: &HeaderMap, now: i64) -> Option<Self> {
        if status != StatusCode::FORBIDDEN && status != StatusCode::TOO_MANY_REQUESTS {
            return None;
        }

        if let Some(secs) = header_value::<u64>(headers, RETRY_AFTER) {
            return Some(Self {
                wait: Duration::from_secs(secs),
                reset_at: None,
            });
        }

        if header_value::<u64>(headers, REMAINING) != Some(0) {
            return None;
        }

        match header_value::<i64>(headers, RESET) {
            Some(reset_at) => Some(Self {
                wait: Duration::from_secs(reset_at.saturating_sub(now).max(0) as u64),
                reset_at: Some(reset_at),
            }),
            None => Some(Self {
                wait: UNKNOWN_RESET_WAIT,
                reset_at: None,
            }),
        }
    }
}

/// Remaining quota as reported on a response, for debug logging.
pub fn remaining(headers: &HeaderMap) -> Option<u64> {
    header_value(headers, REMAINING)
}

fn header_value<T: std::str::FromStr>(headers: &HeaderMap, name: &str) -> Option<T> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.trim().parse().ok())
}
