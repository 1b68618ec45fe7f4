//! Outbound ports. Application calls into infrastructure.
//!
//! Implemented by adapters.

use crate::domain::{Alias, DomainError, ShortResult, UserId, UserStats};

/// External shortening service. One call per URL.
///
/// Implementations never raise: transport and upstream errors come back as a
/// classified `ShortResult::Failure`.
#[async_trait::async_trait]
pub trait ShortenerPort: Send + Sync {
    async fn shorten(&self, url: &str, alias: Option<&Alias>) -> ShortResult;
}

/// Usage accounting store. `record` is the only mutator.
#[async_trait::async_trait]
pub trait UsageStorePort: Send + Sync {
    /// Count the successes in `results` for `user_id` and push them onto the recent list.
    /// Calls for the same user are serialized.
    async fn record(&self, user_id: UserId, results: &[ShortResult]) -> Result<(), DomainError>;

    /// Current stats for a user; zero-valued for an unknown user.
    async fn read(&self, user_id: UserId) -> Result<UserStats, DomainError>;
}
