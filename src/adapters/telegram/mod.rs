//! Telegram adapter. Implements InputPort over the Bot API.

pub mod bot;

pub use bot::TelegramBot;
