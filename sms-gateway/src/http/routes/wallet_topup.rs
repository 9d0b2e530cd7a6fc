//! POST /v1/wallet/topup (§6).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use serde::Deserialize;
use serde_json::json;

use crate::http::AppState;
use crate::models::Customer;

#[derive(Debug, Deserialize)]
pub struct TopupRequest {
    pub amount: i64,
    #[serde(default)]
    pub request_id: String,
}

pub async fn topup(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Json(req): Json<TopupRequest>,
) -> Response {
    let request_id = req.request_id.trim();

    if req.amount <= 0 || request_id.is_empty() || request_id.len() > 128 {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "invalid payload" })),
        )
            .into_response();
    }

    match state
        .wallet_service
        .topup(customer.id, req.amount, request_id)
        .await
    {
        Ok(outcome) => (
            StatusCode::OK,
            Json(json!({
                "topup": true,
                "idempotent": outcome.idempotent,
                "amount": req.amount,
                "customer_id": customer.id,
                "request_id": request_id,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}
