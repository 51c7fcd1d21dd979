use async_trait::async_trait;

use crate::{
    domain::{ChatId, UserId},
    Result,
};

/// Outbound side of the chat transport.
///
/// Telegram is the only implementation; the broadcaster, the command handler and the
/// startup notification all talk to the transport through this trait so they can be
/// exercised with fakes.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    async fn send_html(&self, chat_id: ChatId, html: &str) -> Result<()>;

    /// Users currently holding administrator rights in `chat_id` (creator included).
    async fn chat_administrators(&self, chat_id: ChatId) -> Result<Vec<UserId>>;
}
