//! Domain-level error kinds and their HTTP mapping (§7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use serde_json::json;

/// Errors surfaced by the queue service (C9) and wallet topup flow.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("insufficient funds for customer {customer_id}")]
    InsufficientFunds { customer_id: i64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        match self {
            ServiceError::InsufficientFunds { customer_id } => (
                StatusCode::PAYMENT_REQUIRED,
                Json(json!({
                    "error": "insufficient_funds",
                    "description": "wallet balance is lower than the lane price",
                    "customer_id": customer_id,
                })),
            )
                .into_response(),
            ServiceError::InvalidInput(msg) => {
                (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
            }
            ServiceError::Storage(e) => {
                tracing::error!(error = %e, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Errors surfaced while authenticating a request (middleware).
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing api key")]
    Missing,

    #[error("invalid api key")]
    Invalid,

    #[error("auth storage error: {0}")]
    Storage(#[from] sqlx::Error),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        match self {
            AuthError::Missing => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "missing api key" })),
            )
                .into_response(),
            AuthError::Invalid => (
                StatusCode::UNAUTHORIZED,
                Json(json!({ "error": "invalid api key" })),
            )
                .into_response(),
            AuthError::Storage(e) => {
                tracing::error!(error = %e, "auth error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "auth error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Errors the provider dispatcher (C1-C3) can produce. Every variant here is
/// counted as a send failure by the sender worker; none of them panics.
#[derive(Debug, thiserror::Error, Clone)]
pub enum DispatchError {
    #[error("no healthy providers available")]
    NoHealthyProviders,

    #[error("provider {provider} did not admit the request (breaker not ready)")]
    NotAcquired { provider: String },

    #[error("provider {provider} transport error on {path}: {source}")]
    ProviderTransport {
        provider: String,
        path: String,
        source: String,
    },

    #[error("provider {provider} returned status {status} on {path}")]
    ProviderStatus {
        provider: String,
        path: String,
        status: u16,
    },
}
