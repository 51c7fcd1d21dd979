use std::sync::Arc;

use teloxide::{
    dispatching::{Dispatcher, ShutdownToken},
    dptree,
    prelude::*,
};
use tokio::task::JoinHandle;

use lnb_core::{
    commands::CommandHandler,
    domain::{ChatId, UserId},
    messaging::port::MessagingPort,
};

use crate::handlers;

#[derive(Clone)]
pub struct AppState {
    pub commands: Arc<CommandHandler>,
}

/// Running long-polling loop.
pub struct PollingHandle {
    token: ShutdownToken,
    task: JoinHandle<()>,
}

impl PollingHandle {
    /// Stop fetching updates and wait for in-flight handlers to finish.
    pub async fn shutdown(self) {
        let PollingHandle { token, task } = self;
        match token.shutdown() {
            Ok(done) => done.await,
            Err(e) => {
                tracing::warn!("telegram dispatcher was not running: {e}");
                task.abort();
                return;
            }
        }
        if let Err(e) = task.await {
            tracing::error!("telegram dispatcher task join error: {e}");
        }
    }
}

/// Spawn the command loop on the current runtime.
pub async fn start_polling(bot: Bot, state: Arc<AppState>) -> PollingHandle {
    match bot.get_me().await {
        Ok(me) => tracing::info!(username = %me.username(), "authorized on telegram"),
        Err(e) => tracing::warn!("getMe failed: {e}"),
    }

    let handler =
        dptree::entry().branch(Update::filter_message().endpoint(handlers::handle_message));

    let mut dispatcher = Dispatcher::builder(bot, handler)
        .dependencies(dptree::deps![state])
        .default_handler(|_| async {})
        .build();
    let token = dispatcher.shutdown_token();

    let task = tokio::spawn(async move {
        dispatcher.dispatch().await;
    });

    PollingHandle { token, task }
}

/// Tell the owner the bot is up. Best-effort.
pub async fn send_startup_notification(messenger: Arc<dyn MessagingPort>, owner: UserId) {
    let text = "🤖 <b>Luvento Notification Bot</b> запущен";
    if let Err(e) = messenger.send_html(ChatId(owner.0), text).await {
        tracing::warn!(user_id = owner.0, error = %e, "startup notification failed");
    }
}
