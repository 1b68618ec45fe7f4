//! Domain entities. Pure data structures for the core business.
//!
//! No Telegram/HTTP types here; adapters map into these.

use crate::domain::errors::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::fmt;

/// Opaque identifier of the user who submitted a request (Telegram user id).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// User-chosen short-link suffix. Construct with [`Alias::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Alias(String);

impl Alias {
    /// 3-30 characters, ASCII letters, digits or hyphens.
    pub fn parse(raw: &str) -> Result<Self, ErrorKind> {
        let len = raw.chars().count();
        let charset_ok = raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-');
        if (3..=30).contains(&len) && charset_ok {
            Ok(Self(raw.to_string()))
        } else {
            Err(ErrorKind::InvalidAlias)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Alias {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<&str> for Alias {
    type Error = ErrorKind;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        Self::parse(raw)
    }
}

/// A single shortening request. Built per call, never persisted.
#[derive(Debug, Clone)]
pub struct ShortenRequest {
    pub original_url: String,
    pub alias: Option<Alias>,
    pub requester_id: UserId,
}

impl ShortenRequest {
    pub fn new(original_url: impl Into<String>, requester_id: UserId) -> Self {
        Self {
            original_url: original_url.into(),
            alias: None,
            requester_id,
        }
    }

    pub fn with_alias(mut self, alias: Alias) -> Self {
        self.alias = Some(alias);
        self
    }
}

/// Outcome of shortening one URL.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", rename_all = "lowercase")]
pub enum ShortResult {
    Success {
        original_url: String,
        short_url: String,
        /// Slug of the short link; analytics live at `https://cutt.ly/<id>/stats`.
        click_tracking_id: String,
    },
    Failure {
        reason: ErrorKind,
        original_url: String,
    },
}

impl ShortResult {
    pub fn failure(reason: ErrorKind, original_url: impl Into<String>) -> Self {
        Self::Failure {
            reason,
            original_url: original_url.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, Self::Success { .. })
    }

    pub fn original_url(&self) -> &str {
        match self {
            Self::Success { original_url, .. } | Self::Failure { original_url, .. } => {
                original_url
            }
        }
    }

    /// Failure reason, or None for a success.
    pub fn reason(&self) -> Option<ErrorKind> {
        match self {
            Self::Success { .. } => None,
            Self::Failure { reason, .. } => Some(*reason),
        }
    }
}

/// Per-item results of a batch, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    items: Vec<ShortResult>,
}

impl BatchResult {
    pub fn new(items: Vec<ShortResult>) -> Self {
        Self { items }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ShortResult> {
        self.items.iter()
    }

    pub fn as_slice(&self) -> &[ShortResult] {
        &self.items
    }

    pub fn success_count(&self) -> usize {
        self.items.iter().filter(|r| r.is_success()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.len() - self.success_count()
    }

    pub fn into_inner(self) -> Vec<ShortResult> {
        self.items
    }
}

impl<'a> IntoIterator for &'a BatchResult {
    type Item = &'a ShortResult;
    type IntoIter = std::slice::Iter<'a, ShortResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}

/// Usage tier shown in `/stats`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rank {
    Beginner,
    Regular,
    Pro,
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Rank::Beginner => "Beginner",
            Rank::Regular => "Regular",
            Rank::Pro => "Pro",
        };
        f.write_str(s)
    }
}

/// Per-user usage counters. Mutated only through the usage store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub user_id: UserId,
    pub total_shortened: u64,
    /// Most recent first.
    pub recent: VecDeque<ShortResult>,
    #[serde(default)]
    pub first_used: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_used: Option<DateTime<Utc>>,
}

impl UserStats {
    /// Zero-valued stats for a user that has never shortened anything.
    pub fn empty(user_id: UserId) -> Self {
        Self {
            user_id,
            total_shortened: 0,
            recent: VecDeque::new(),
            first_used: None,
            last_used: None,
        }
    }

    /// Apply a set of results. Failures are ignored; returns how many successes were counted.
    pub fn apply(&mut self, results: &[ShortResult], capacity: usize, now: DateTime<Utc>) -> usize {
        let mut counted = 0;
        for result in results.iter().filter(|r| r.is_success()) {
            self.recent.push_front(result.clone());
            counted += 1;
        }
        self.recent.truncate(capacity);
        if counted > 0 {
            self.total_shortened += counted as u64;
            self.first_used.get_or_insert(now);
            self.last_used = Some(now);
        }
        counted
    }

    pub fn rank(&self) -> Rank {
        match self.total_shortened {
            n if n < 5 => Rank::Beginner,
            n if n > 50 => Rank::Pro,
            _ => Rank::Regular,
        }
    }
}
