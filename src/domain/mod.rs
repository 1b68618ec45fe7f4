//! Core domain layer. No external I/O dependencies.
//!
//! Entities and business rules live here. Dependencies flow inward.

pub mod entities;
pub mod errors;
pub mod validation;

pub use entities::{Alias, BatchResult, Rank, ShortResult, ShortenRequest, UserId, UserStats};
pub use errors::{DomainError, ErrorKind};
pub use validation::{is_valid_url, validate_url};
