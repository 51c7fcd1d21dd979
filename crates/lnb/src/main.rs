use std::{future::Future, sync::Arc, time::Duration};

use anyhow::Context;
use teloxide::Bot;

use lnb_core::{
    broadcast::Broadcaster, commands::CommandHandler, config::Config,
    messaging::port::MessagingPort, store::SqliteStore, store::SubscriptionStore,
};
use lnb_telegram::{
    router::{self, AppState as TelegramState},
    TelegramMessenger,
};
use lnb_webhook::AppState as WebhookState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    lnb_core::logging::init("lnb")?;

    let cfg = Config::load()?;

    let store = Arc::new(
        SqliteStore::open(&cfg.database_path)
            .await
            .with_context(|| format!("opening {}", cfg.database_path.display()))?,
    );
    tracing::info!(path = %cfg.database_path.display(), "subscription store ready");

    let bot = Bot::new(cfg.telegram_bot_token.clone());
    let messenger: Arc<dyn MessagingPort> = Arc::new(TelegramMessenger::new(bot.clone()));
    let subscriptions: Arc<dyn SubscriptionStore> = store.clone();

    let commands = Arc::new(CommandHandler::new(subscriptions.clone(), messenger.clone()));
    let broadcaster = Arc::new(Broadcaster::new(subscriptions, messenger.clone()));

    let polling = router::start_polling(bot, Arc::new(TelegramState { commands })).await;

    let app = lnb_webhook::router(
        WebhookState::new(cfg.webhook_api_key.as_str(), broadcaster),
        cfg.request_timeout,
    );
    let mut server = match lnb_webhook::start_server(&format!("0.0.0.0:{}", cfg.port), app).await {
        Ok(server) => server,
        Err(e) => {
            polling.shutdown().await;
            store.close().await;
            return Err(e.context("starting webhook server"));
        }
    };

    if let Some(owner) = cfg.owner_id {
        router::send_startup_notification(messenger, owner).await;
    }

    let server_failure = tokio::select! {
        _ = shutdown_signal() => None,
        err = server.exited() => Some(err),
    };

    match server_failure {
        None => {
            tracing::info!("shutting down");
            let drain = async {
                tokio::join!(server.stop(), polling.shutdown());
            };
            drain_within(cfg.shutdown_timeout, drain).await;
            store.close().await;
            tracing::info!("stopped");
            Ok(())
        }
        Some(err) => {
            tracing::error!("{err:#}");
            drain_within(cfg.shutdown_timeout, polling.shutdown()).await;
            store.close().await;
            Err(err)
        }
    }
}

async fn drain_within(limit: Duration, work: impl Future<Output = ()>) {
    if tokio::time::timeout(limit, work).await.is_err() {
        tracing::warn!(timeout_secs = limit.as_secs(), "graceful shutdown timed out");
    }
}

async fn shutdown_signal() {
    #[cfg(unix)]
    {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut sigterm) => {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => {}
                    _ = sigterm.recv() => {}
                }
            }
            Err(e) => {
                tracing::warn!("failed to listen for SIGTERM: {e}");
                wait_ctrl_c().await;
            }
        }
    }
    #[cfg(not(unix))]
    wait_ctrl_c().await;
}

async fn wait_ctrl_c() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("failed to listen for Ctrl+C: {e}");
        std::future::pending::<()>().await;
    }
}
