use axum::{
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};

use crate::{error::WebhookError, AppState};

pub const API_KEY_HEADER: &str = "x-api-key";

/// Middleware rejecting requests whose `X-API-Key` does not match the configured key.
pub async fn require_api_key(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Result<Response, WebhookError> {
    if let Err(e) = validate_api_key(request.headers(), &state.api_key) {
        tracing::warn!(path = %request.uri().path(), "rejected webhook: {e}");
        return Err(e);
    }
    Ok(next.run(request).await)
}

pub(crate) fn validate_api_key(headers: &HeaderMap, expected: &str) -> Result<(), WebhookError> {
    let provided = headers
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();
    if !provided.is_empty() && provided == expected {
        Ok(())
    } else {
        Err(WebhookError::Unauthorized)
    }
}
