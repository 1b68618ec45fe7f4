//! Mock shortener for dry runs and tests.
//!
//! Hands out deterministic `https://dry-run.invalid/mockN` links without network calls.
//! Outcomes can be scripted per URL, and call counts / peak concurrency are recorded.

use crate::domain::{Alias, ErrorKind, ShortResult};
use crate::ports::ShortenerPort;
use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::info;

/// Base of generated short links. The `.invalid` TLD never resolves.
const MOCK_BASE: &str = "https://dry-run.invalid";

/// Scripted result of one call for a given URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MockOutcome {
    Succeed,
    Fail(ErrorKind),
    /// Sleep, then succeed. Longer than the client timeout means a timeout.
    Stall(Duration),
}

/// Mock shortener adapter.
pub struct MockShortener {
    /// Simulated network delay applied to every call.
    delay: Duration,
    script: Mutex<HashMap<String, VecDeque<MockOutcome>>>,
    calls: Mutex<HashMap<String, usize>>,
    taken_aliases: Mutex<HashSet<String>>,
    issued: AtomicUsize,
    in_flight: AtomicUsize,
    peak_in_flight: AtomicUsize,
}

impl MockShortener {
    /// Create a mock with no delay.
    pub fn new() -> Self {
        Self::with_delay(Duration::ZERO)
    }

    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay,
            script: Mutex::new(HashMap::new()),
            calls: Mutex::new(HashMap::new()),
            taken_aliases: Mutex::new(HashSet::new()),
            issued: AtomicUsize::new(0),
            in_flight: AtomicUsize::new(0),
            peak_in_flight: AtomicUsize::new(0),
        }
    }

    /// Queue outcomes for `url`, consumed one per call. Once drained, calls succeed.
    pub fn script(self, url: &str, outcomes: impl IntoIterator<Item = MockOutcome>) -> Self {
        if let Ok(mut script) = self.script.lock() {
            script
                .entry(url.to_string())
                .or_default()
                .extend(outcomes);
        }
        self
    }

    /// Number of calls made for `url`.
    pub fn calls_for(&self, url: &str) -> usize {
        self.calls
            .lock()
            .map(|c| c.get(url).copied().unwrap_or(0))
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.calls.lock().map(|c| c.values().sum()).unwrap_or(0)
    }

    /// Highest number of calls observed running at the same time.
    pub fn peak_in_flight(&self) -> usize {
        self.peak_in_flight.load(Ordering::SeqCst)
    }

    fn next_outcome(&self, url: &str) -> MockOutcome {
        if let Ok(mut calls) = self.calls.lock() {
            *calls.entry(url.to_string()).or_insert(0) += 1;
        }
        self.script
            .lock()
            .ok()
            .and_then(|mut s| s.get_mut(url).and_then(VecDeque::pop_front))
            .unwrap_or(MockOutcome::Succeed)
    }

    fn issue(&self, url: &str, alias: Option<&Alias>) -> ShortResult {
        let slug = match alias {
            Some(alias) => {
                let fresh = self
                    .taken_aliases
                    .lock()
                    .map(|mut taken| taken.insert(alias.as_str().to_string()))
                    .unwrap_or(false);
                if !fresh {
                    return ShortResult::failure(ErrorKind::AliasTaken, url);
                }
                alias.as_str().to_string()
            }
            None => format!("mock{}", self.issued.fetch_add(1, Ordering::SeqCst) + 1),
        };
        ShortResult::Success {
            original_url: url.to_string(),
            short_url: format!("{}/{}", MOCK_BASE, slug),
            click_tracking_id: slug,
        }
    }
}

impl Default for MockShortener {
    fn default() -> Self {
        Self::new()
    }
}

/// Decrements the in-flight counter even when the call is cancelled.
struct InFlightGuard<'a>(&'a AtomicUsize);

impl Drop for InFlightGuard<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

#[async_trait::async_trait]
impl ShortenerPort for MockShortener {
    async fn shorten(&self, url: &str, alias: Option<&Alias>) -> ShortResult {
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.peak_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlightGuard(&self.in_flight);

        info!(url, alias = alias.map(Alias::as_str), "[MOCK] shortening");
        let outcome = self.next_outcome(url);

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        match outcome {
            MockOutcome::Succeed => self.issue(url, alias),
            MockOutcome::Fail(kind) => ShortResult::failure(kind, url),
            MockOutcome::Stall(pause) => {
                tokio::time::sleep(pause).await;
                self.issue(url, alias)
            }
        }
    }
}
