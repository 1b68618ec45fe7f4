//! Domain errors. Used by ports and use cases.
//!
//! `ErrorKind` is per-request outcome data (never a fault); `DomainError` covers
//! infrastructure failures that adapters map into.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why shortening failed. Carried inside `ShortResult::Failure` or returned for batch rejection.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    #[error("Invalid URL (must start with http:// or https://)")]
    InvalidUrl,

    #[error("Invalid alias (3-30 letters, numbers or hyphens)")]
    InvalidAlias,

    #[error("Custom alias already taken")]
    AliasTaken,

    #[error("Shortening service timed out")]
    UpstreamTimeout,

    #[error("Shortening service rejected the URL")]
    UpstreamRejected,

    #[error("Shortening service unavailable")]
    UpstreamUnavailable,

    #[error("Too many URLs in one batch")]
    BatchTooLarge,
}

impl ErrorKind {
    /// Transient kinds are worth one more attempt.
    pub fn is_transient(self) -> bool {
        matches!(self, Self::UpstreamTimeout | Self::UpstreamUnavailable)
    }
}

#[derive(Error, Debug)]
pub enum DomainError {
    #[error("Usage store error: {0}")]
    Store(String),

    #[error("Telegram error: {0}")]
    Telegram(String),

    #[error("Configuration error: {0}")]
    Config(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_timeouts_and_unavailable_are_transient() {
        assert!(ErrorKind::UpstreamTimeout.is_transient());
        assert!(ErrorKind::UpstreamUnavailable.is_transient());
        assert!(!ErrorKind::InvalidUrl.is_transient());
        assert!(!ErrorKind::AliasTaken.is_transient());
        assert!(!ErrorKind::UpstreamRejected.is_transient());
    }
}
