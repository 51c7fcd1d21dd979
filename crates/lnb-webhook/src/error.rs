use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Request-scoped ingress failures. Nothing here is fatal to the process.
#[derive(Debug, thiserror::Error)]
pub enum WebhookError {
    #[error("missing or invalid api key")]
    Unauthorized,

    #[error("malformed payload: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("dispatch failed: {0}")]
    Dispatch(#[from] lnb_core::Error),

    #[error("broadcast task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl IntoResponse for WebhookError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            Self::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized"),
            Self::Decode(_) => (StatusCode::BAD_REQUEST, "Bad Request"),
            Self::Dispatch(_) | Self::Join(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error")
            }
        };
        (status, body).into_response()
    }
}
