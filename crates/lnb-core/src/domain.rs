use chrono::{DateTime, Utc};

/// Telegram user id (numeric).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct UserId(pub i64);

/// Telegram chat id (numeric). Negative for groups and supergroups.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct ChatId(pub i64);

/// A chat opted in to receive broadcast notifications.
///
/// `chat_id` is the natural key; `id` is the surrogate assigned by the store.
#[derive(Clone, Debug, PartialEq, Eq, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub chat_id: i64,
    pub title: String,
    pub added_by: i64,
    pub created_at: DateTime<Utc>,
}

impl Subscription {
    pub fn chat(&self) -> ChatId {
        ChatId(self.chat_id)
    }

    /// Title for display; falls back to the numeric chat id when the stored title is blank.
    pub fn display_title(&self) -> String {
        if self.title.trim().is_empty() {
            format!("chat {}", self.chat_id)
        } else {
            self.title.clone()
        }
    }
}
