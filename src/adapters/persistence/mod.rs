//! Usage store adapters. Implement UsageStorePort.

pub mod memory_store;
pub mod state_json;

pub use memory_store::MemoryUsageStore;
pub use state_json::JsonUsageStore;
