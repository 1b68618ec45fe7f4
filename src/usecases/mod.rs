//! Application use cases. Orchestrate domain logic via ports.

pub mod bulk_processor;
pub mod command;
pub mod command_router;
pub mod replies;
pub mod shortening_client;

pub use bulk_processor::{BulkPolicy, BulkProcessor};
pub use command::{ButtonAction, Command};
pub use command_router::CommandRouter;
pub use replies::{Button, Reply};
pub use shortening_client::ShorteningClient;
