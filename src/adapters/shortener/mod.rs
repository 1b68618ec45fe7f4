//! Shortener adapters. Implement ShortenerPort.
//!
//! Cuttly over HTTPS, and a mock for dry runs and tests.

pub mod cuttly_adapter;
pub mod mock_adapter;

pub use cuttly_adapter::CuttlyAdapter;
pub use mock_adapter::{MockOutcome, MockShortener};
