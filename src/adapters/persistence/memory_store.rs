//! Implements UsageStorePort in memory.
//!
//! One mutex per user: records for the same user serialize, different users never contend
//! beyond the short map lookup.

use crate::domain::{DomainError, ShortResult, UserId, UserStats};
use crate::ports::UsageStorePort;
use chrono::Utc;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Process-lifetime usage store.
pub struct MemoryUsageStore {
    capacity: usize,
    users: Mutex<HashMap<UserId, Arc<Mutex<UserStats>>>>,
}

impl MemoryUsageStore {
    /// `capacity` bounds each user's recent list.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            users: Mutex::new(HashMap::new()),
        }
    }

    /// Entry for `user_id`, created on first use.
    async fn entry(&self, user_id: UserId) -> Arc<Mutex<UserStats>> {
        let mut users = self.users.lock().await;
        Arc::clone(
            users
                .entry(user_id)
                .or_insert_with(|| Arc::new(Mutex::new(UserStats::empty(user_id)))),
        )
    }
}

#[async_trait::async_trait]
impl UsageStorePort for MemoryUsageStore {
    async fn record(&self, user_id: UserId, results: &[ShortResult]) -> Result<(), DomainError> {
        // Users appear only after their first success.
        if !results.iter().any(ShortResult::is_success) {
            return Ok(());
        }
        let entry = self.entry(user_id).await;
        let mut stats = entry.lock().await;
        let counted = stats.apply(results, self.capacity, Utc::now());
        debug!(%user_id, counted, total = stats.total_shortened, "usage recorded");
        Ok(())
    }

    async fn read(&self, user_id: UserId) -> Result<UserStats, DomainError> {
        let entry = {
            let users = self.users.lock().await;
            users.get(&user_id).cloned()
        };
        match entry {
            Some(entry) => Ok(entry.lock().await.clone()),
            None => Ok(UserStats::empty(user_id)),
        }
    }
}
