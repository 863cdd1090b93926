//! Core dispatch engine and domain logic for the Splitty chat bot.
//!
//! This crate is framework-agnostic. Telegram lives behind ports (traits)
//! implemented in the adapter crate.

pub mod bot;
pub mod config;
pub mod dispatch;
pub mod domain;
pub mod error_sink;
pub mod errors;
pub mod formatting;
pub mod i18n;
pub mod logging;
pub mod messaging;
pub mod model;
pub mod store;

#[cfg(test)]
mod testing;

pub use errors::{Error, Result};
