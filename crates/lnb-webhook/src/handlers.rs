use axum::{body::Bytes, extract::State};
use serde_json::from_slice;

use lnb_core::notifications::{ServerError, SupportMessage, UserRegistered};

use crate::{error::WebhookError, AppState};

pub async fn health() -> &'static str {
    "OK"
}

pub async fn user_registered(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, WebhookError> {
    let payload: UserRegistered = decode(&body, "user-registered")?;
    dispatch(&state, payload.render(), "user-registered").await?;
    tracing::info!(email = %payload.email, "user registered notification sent");
    Ok("OK")
}

pub async fn support_message(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, WebhookError> {
    let payload: SupportMessage = decode(&body, "support-message")?;
    dispatch(&state, payload.render(), "support-message").await?;
    tracing::info!(email = %payload.user_email, "support message notification sent");
    Ok("OK")
}

pub async fn server_error(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<&'static str, WebhookError> {
    let payload: ServerError = decode(&body, "server-error")?;
    dispatch(&state, payload.render(), "server-error").await?;
    tracing::info!(service = %payload.service, "server error notification sent");
    Ok("OK")
}

fn decode<T: serde::de::DeserializeOwned>(body: &[u8], event: &str) -> Result<T, WebhookError> {
    from_slice(body).map_err(|e| {
        tracing::error!(event, error = %e, "failed to decode payload");
        WebhookError::Decode(e)
    })
}

/// Broadcast on a detached task: a request timeout ends the wait, never the fan-out.
async fn dispatch(state: &AppState, html: String, event: &str) -> Result<(), WebhookError> {
    let broadcaster = state.broadcaster.clone();
    let job = tokio::spawn(async move { broadcaster.broadcast(&html).await });

    match job.await? {
        Ok(report) => {
            if !report.failures.is_empty() {
                tracing::warn!(
                    event,
                    sent = report.sent,
                    failed = report.failures.len(),
                    "notification partially delivered"
                );
            }
            Ok(())
        }
        Err(e) => {
            tracing::error!(event, error = %e, "failed to send notification");
            Err(WebhookError::Dispatch(e))
        }
    }
}
