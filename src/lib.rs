//! tg-shortener: Telegram URL shortener bot (Cuttly) with Hexagonal Architecture.

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod shared;
pub mod usecases;
