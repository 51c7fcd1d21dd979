//! Backend event payloads and their Telegram HTML renderings.

use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use serde::Deserialize;

use crate::formatting::{escape_html, format_timestamp, truncate_chars};

/// Longest `error` / `stack` excerpt forwarded to chats, in characters.
pub const MAX_ERROR_CHARS: usize = 500;

/// Recognized registration metadata keys, in display order, with their labels.
const METADATA_FIELDS: [(&str, &str); 6] = [
    ("country", "Страна"),
    ("city", "Город"),
    ("browser", "Браузер"),
    ("os", "ОС"),
    ("referrer", "Источник"),
    ("ip", "IP"),
];

/// A new user signed up.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRegistered {
    pub email: String,
    pub created_at: DateTime<FixedOffset>,
    #[serde(default)]
    pub metadata: Option<HashMap<String, String>>,
}

/// A user wrote to support.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SupportMessage {
    pub user_email: String,
    pub message: String,
    pub created_at: DateTime<FixedOffset>,
}

/// A backend service reported an error.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerError {
    pub service: String,
    pub error: String,
    #[serde(default)]
    pub stack: Option<String>,
    pub created_at: DateTime<FixedOffset>,
}

impl UserRegistered {
    pub fn render(&self) -> String {
        let mut text = format!(
            "👤 <b>Новый пользователь</b>\n\n\
📧 Email: <code>{}</code>\n\
🕐 Время: {}",
            escape_html(&self.email),
            format_timestamp(&self.created_at),
        );

        if let Some(metadata) = self.metadata.as_ref().filter(|m| !m.is_empty()) {
            text.push_str("\n\n📍 <b>Информация:</b>");
            for (key, label) in METADATA_FIELDS {
                let Some(value) = metadata.get(key).filter(|v| !v.is_empty()) else {
                    continue;
                };
                let value = escape_html(value);
                if key == "ip" {
                    text.push_str(&format!("\n• {label}: <code>{value}</code>"));
                } else {
                    text.push_str(&format!("\n• {label}: {value}"));
                }
            }
        }

        text
    }
}

impl SupportMessage {
    pub fn render(&self) -> String {
        format!(
            "💬 <b>Сообщение в поддержку</b>\n\n\
👤 От: <code>{}</code>\n\
🕐 Время: {}\n\n\
📝 Сообщение:\n{}",
            escape_html(&self.user_email),
            format_timestamp(&self.created_at),
            escape_html(&self.message),
        )
    }
}

impl ServerError {
    pub fn render(&self) -> String {
        let mut text = format!(
            "🚨 <b>Ошибка на сервере</b>\n\n\
🔧 Сервис: <code>{}</code>\n\
🕐 Время: {}\n\n\
❌ Ошибка:\n<pre>{}</pre>",
            escape_html(&self.service),
            format_timestamp(&self.created_at),
            escape_html(&truncate_chars(&self.error, MAX_ERROR_CHARS)),
        );

        if let Some(stack) = self.stack.as_deref().filter(|s| !s.is_empty()) {
            text.push_str(&format!(
                "\n\n📚 Stack trace:\n<pre>{}</pre>",
                escape_html(&truncate_chars(stack, MAX_ERROR_CHARS))
            ));
        }

        text
    }
}
