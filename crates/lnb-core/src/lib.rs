//! Core domain + application logic for the Luvento notification bot.
//!
//! This crate is intentionally framework-agnostic. Telegram and the HTTP ingress live
//! behind ports (traits) implemented in adapter crates; SQLite persistence lives here.

pub mod broadcast;
pub mod commands;
pub mod config;
pub mod domain;
pub mod errors;
pub mod formatting;
pub mod logging;
pub mod messaging;
pub mod notifications;
pub mod store;

pub use errors::{Error, Result};
