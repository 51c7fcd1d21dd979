//! Messenger abstractions (Telegram today) used by the broadcaster and command handler.

pub mod port;
pub mod types;
