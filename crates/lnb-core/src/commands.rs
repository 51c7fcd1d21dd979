//! Chat command handling: `/start`, `/help`, `/addgroup`, `/removegroup`, `/status`.
//!
//! Stateless between invocations; subscriptions live in the store and admin rights are
//! looked up through the messaging port on every mutation.

use std::sync::Arc;

use crate::{
    domain::{ChatId, UserId},
    formatting::escape_html,
    messaging::{port::MessagingPort, types::Command},
    store::SubscriptionStore,
};

pub const HELP_TEXT: &str = "🤖 <b>Luvento Notification Bot</b>\n\n\
Я отправляю уведомления о важных событиях:\n\
• Новые регистрации пользователей\n\
• Сообщения в поддержку\n\
• Ошибки сервера\n\n\
<b>Команды:</b>\n\
/addgroup — добавить эту группу в рассылку\n\
/removegroup — убрать группу из рассылки\n\
/status — показать статус\n\
/help — помощь";

pub const GROUPS_ONLY: &str = "⚠️ Эта команда работает только в группах";
pub const ADMIN_CHECK_FAILED: &str = "❌ Ошибка проверки прав";
pub const ADD_NOT_ADMIN: &str = "⚠️ Только администраторы могут добавлять группу";
pub const REMOVE_NOT_ADMIN: &str = "⚠️ Только администраторы могут удалять группу";
pub const ADDED: &str = "✅ Группа добавлена в рассылку уведомлений";
pub const REMOVED: &str = "✅ Группа удалена из рассылки";
pub const ADD_FAILED: &str = "❌ Ошибка добавления группы";
pub const REMOVE_FAILED: &str = "❌ Ошибка удаления группы";
pub const STATUS_FAILED: &str = "❌ Ошибка получения статуса";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Mutation {
    Add,
    Remove,
}

/// Interprets inbound chat commands against the subscription store.
pub struct CommandHandler {
    store: Arc<dyn SubscriptionStore>,
    messenger: Arc<dyn MessagingPort>,
}

impl CommandHandler {
    pub fn new(store: Arc<dyn SubscriptionStore>, messenger: Arc<dyn MessagingPort>) -> Self {
        Self { store, messenger }
    }

    /// Handle a command and deliver its reply, if any. Send failures are logged only.
    pub async fn handle(&self, cmd: &Command) {
        let Some(reply) = self.reply_for(cmd).await else {
            return;
        };
        if let Err(e) = self.messenger.send_html(cmd.chat_id, &reply).await {
            tracing::warn!(chat_id = cmd.chat_id.0, command = %cmd.name, error = %e, "failed to send reply");
        }
    }

    /// Apply a command and return the reply text. `None` means stay silent.
    pub async fn reply_for(&self, cmd: &Command) -> Option<String> {
        match cmd.name.as_str() {
            "start" | "help" => Some(HELP_TEXT.to_string()),
            "addgroup" => Some(self.mutate(cmd, Mutation::Add).await),
            "removegroup" => Some(self.mutate(cmd, Mutation::Remove).await),
            "status" => Some(self.status(cmd).await),
            _ => None,
        }
    }

    async fn mutate(&self, cmd: &Command, mutation: Mutation) -> String {
        if !cmd.chat_kind.is_group() {
            return GROUPS_ONLY.to_string();
        }

        match self.is_admin(cmd.chat_id, cmd.user_id).await {
            Ok(true) => {}
            Ok(false) => {
                return match mutation {
                    Mutation::Add => ADD_NOT_ADMIN,
                    Mutation::Remove => REMOVE_NOT_ADMIN,
                }
                .to_string()
            }
            Err(e) => {
                tracing::error!(chat_id = cmd.chat_id.0, user_id = cmd.user_id.0, error = %e, "failed to check admin status");
                return ADMIN_CHECK_FAILED.to_string();
            }
        }

        match mutation {
            Mutation::Add => {
                let title = cmd.chat_title.as_deref().unwrap_or_default();
                match self
                    .store
                    .add_or_replace(cmd.chat_id, title, cmd.user_id)
                    .await
                {
                    Ok(()) => {
                        tracing::info!(chat_id = cmd.chat_id.0, title, by = cmd.user_id.0, "group added");
                        ADDED.to_string()
                    }
                    Err(e) => {
                        tracing::error!(chat_id = cmd.chat_id.0, error = %e, "failed to add group");
                        ADD_FAILED.to_string()
                    }
                }
            }
            Mutation::Remove => match self.store.remove(cmd.chat_id).await {
                Ok(()) => {
                    tracing::info!(chat_id = cmd.chat_id.0, by = cmd.user_id.0, "group removed");
                    REMOVED.to_string()
                }
                Err(e) => {
                    tracing::error!(chat_id = cmd.chat_id.0, error = %e, "failed to remove group");
                    REMOVE_FAILED.to_string()
                }
            },
        }
    }

    async fn is_admin(&self, chat_id: ChatId, user_id: UserId) -> crate::Result<bool> {
        let admins = self.messenger.chat_administrators(chat_id).await?;
        Ok(admins.contains(&user_id))
    }

    async fn status(&self, cmd: &Command) -> String {
        let subscriptions = match self.store.list_all().await {
            Ok(s) => s,
            Err(e) => {
                tracing::error!(error = %e, "failed to get groups");
                return STATUS_FAILED.to_string();
            }
        };

        let mut lines = vec!["📊 <b>Статус</b>\n".to_string()];
        if subscriptions.is_empty() {
            lines.push("Нет подписанных групп".to_string());
        } else {
            lines.push(format!("Подписанных групп: {}\n", subscriptions.len()));
            for sub in &subscriptions {
                lines.push(format!("• {}", escape_html(&sub.display_title())));
            }
        }

        if cmd.chat_kind.is_group() {
            match self.store.is_subscribed(cmd.chat_id).await {
                Ok(true) => lines.push("\n✅ Этот чат получает уведомления".to_string()),
                Ok(false) => lines.push("\n⚪ Этот чат не подписан".to_string()),
                Err(e) => {
                    tracing::warn!(chat_id = cmd.chat_id.0, error = %e, "failed to check subscription")
                }
            }
        }

        lines.join("\n")
    }
}
