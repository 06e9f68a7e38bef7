//! Core domain + application logic for the gated-club subscription bot.
//!
//! This crate is intentionally framework-agnostic. Telegram / YooKassa live
//! behind ports (traits) implemented in adapter crates.

pub mod catalog;
pub mod config;
pub mod domain;
pub mod errors;
pub mod ledger;
pub mod logging;
pub mod ports;
pub mod purchase;
pub mod sweeper;

pub use errors::{Error, Result};
