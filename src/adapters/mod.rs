//! Infrastructure adapters. Implement ports.
//!
//! Cuttly, usage stores, Telegram. Map errors to DomainError or ShortResult failures.

pub mod persistence;
pub mod shortener;
pub mod telegram;
