use crate::domain::{ChatId, UserId};

/// Kind of chat a command was issued from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    pub fn is_group(self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// Messenger-agnostic inbound command.
///
/// Telegram-specific fields stay in the Telegram adapter.
#[derive(Clone, Debug)]
pub struct Command {
    pub chat_id: ChatId,
    pub chat_kind: ChatKind,
    pub chat_title: Option<String>,
    pub user_id: UserId,
    pub name: String,
}

impl Command {
    /// Build a command from raw message text. Returns `None` for non-command text.
    pub fn from_text(
        chat_id: ChatId,
        chat_kind: ChatKind,
        chat_title: Option<String>,
        user_id: UserId,
        text: &str,
    ) -> Option<Self> {
        let name = parse_command(text)?;
        Some(Self {
            chat_id,
            chat_kind,
            chat_title,
            user_id,
            name,
        })
    }
}

/// Lowercase command name from `/cmd@botname args`. Arguments are ignored.
pub fn parse_command(text: &str) -> Option<String> {
    let first = text.trim().split_whitespace().next()?;
    let cmd = first
        .strip_prefix('/')?
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    if cmd.is_empty() {
        return None;
    }
    Some(cmd)
}
