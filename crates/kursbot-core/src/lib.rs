//! Core domain + application logic for kursbot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the two
//! upstream data providers live behind ports (traits) implemented in adapter
//! crates.

pub mod broadcast;
pub mod config;
pub mod conversation;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod rates;
pub mod registry;
pub mod weather;
pub mod window;

pub use errors::{Error, Result};
