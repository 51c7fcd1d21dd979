//! HTTP ingress: `GET /health` and the API-key protected `POST /webhook/*` endpoints that
//! turn backend events into group broadcasts.

use std::{sync::Arc, time::Duration};

use anyhow::{anyhow, Result};
use axum::{
    http::StatusCode,
    middleware::from_fn_with_state,
    routing::{get, post},
    Router,
};
use tokio::{net::TcpListener, sync::oneshot};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use lnb_core::broadcast::Broadcaster;

pub mod auth;
pub mod error;
pub mod handlers;

pub use error::WebhookError;

/// Shared state for the HTTP server.
#[derive(Clone)]
pub struct AppState {
    pub api_key: Arc<str>,
    pub broadcaster: Arc<Broadcaster>,
}

impl AppState {
    pub fn new(api_key: impl Into<Arc<str>>, broadcaster: Arc<Broadcaster>) -> Self {
        Self {
            api_key: api_key.into(),
            broadcaster,
        }
    }
}

/// Build the ingress router. Every request is bounded by `request_timeout`.
pub fn router(state: AppState, request_timeout: Duration) -> Router {
    let webhooks = Router::new()
        .route("/user-registered", post(handlers::user_registered))
        .route("/support-message", post(handlers::support_message))
        .route("/server-error", post(handlers::server_error))
        .layer(from_fn_with_state(state.clone(), auth::require_api_key));

    Router::new()
        .route("/health", get(handlers::health))
        .nest("/webhook", webhooks)
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            request_timeout,
        ))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Running HTTP server with graceful shutdown.
pub struct WebhookServer {
    shutdown_tx: oneshot::Sender<()>,
    task: tokio::task::JoinHandle<std::io::Result<()>>,
}

pub async fn start_server(bind_addr: &str, app: Router) -> Result<WebhookServer> {
    let listener = TcpListener::bind(bind_addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "starting HTTP server");

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
    let task = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });
    Ok(WebhookServer { shutdown_tx, task })
}

impl WebhookServer {
    /// Stop accepting connections and wait for in-flight requests.
    pub async fn stop(self) {
        let WebhookServer { shutdown_tx, task } = self;
        let _ = shutdown_tx.send(());
        match task.await {
            Ok(Ok(())) => {}
            Ok(Err(e)) => tracing::error!("HTTP server failed: {e}"),
            Err(e) => tracing::error!("HTTP server task join error: {e}"),
        }
    }

    /// Resolves only if the server stops without [`WebhookServer::stop`] being called.
    ///
    /// Cancel-safe: dropping the future leaves the server running and `stop` usable.
    pub async fn exited(&mut self) -> anyhow::Error {
        match (&mut self.task).await {
            Ok(Ok(())) => anyhow!("HTTP server exited unexpectedly"),
            Ok(Err(e)) => anyhow::Error::new(e).context("HTTP server failed"),
            Err(e) => anyhow::Error::new(e).context("HTTP server task ended"),
        }
    }
}

#[cfg(test)]
mod tests;
