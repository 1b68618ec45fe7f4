//! Inbound port. Chat surface (adapter) calls into the application.

use crate::domain::DomainError;

/// Input port: a chat frontend that feeds messages to the command router.
#[async_trait::async_trait]
pub trait InputPort: Send + Sync {
    /// Receive and answer messages until shutdown.
    async fn run(&self) -> Result<(), DomainError>;
}
