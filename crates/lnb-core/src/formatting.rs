//! Formatting utilities for Telegram HTML messages.

use chrono::{DateTime, TimeZone};

/// Marker appended to truncated free-text fields.
pub const TRUNCATION_MARKER: &str = "...";

/// Escape HTML special characters for Telegram HTML parse mode.
pub fn escape_html(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// Keep at most `max_chars` characters, appending [`TRUNCATION_MARKER`] when anything was cut.
///
/// Counts Unicode scalar values so multi-byte text is never split mid-character.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        None => text.to_string(),
        Some((cut, _)) => format!("{}{TRUNCATION_MARKER}", &text[..cut]),
    }
}

/// `DD.MM.YYYY HH:MM:SS`, in the timestamp's own offset.
pub fn format_timestamp<Tz>(ts: &DateTime<Tz>) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    ts.format("%d.%m.%Y %H:%M:%S").to_string()
}
