//! POST /v1/sms/send (§6).

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use serde::Deserialize;
use serde_json::json;

use crate::http::AppState;
use crate::models::{Customer, Sms, SmsType};
use crate::phone;

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub r#type: String,
}

pub async fn send_sms(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Json(req): Json<SendRequest>,
) -> Response {
    let phone = phone::normalize(&req.phone);
    let text = req.text.trim().to_string();

    if phone.is_empty() || text.is_empty() {
        return bad_request("bad request");
    }
    if text.chars().count() > 300 {
        return bad_request("text too long");
    }

    let Some(lane) = SmsType::parse(&req.r#type) else {
        return bad_request("invalid type");
    };

    let sms = Sms { phone, text, r#type: Some(lane.as_str().to_string()) };

    match state.queue_service.enqueue(customer.id, sms, lane).await {
        Ok(id) => (
            StatusCode::ACCEPTED,
            Json(json!({
                "enqueued": true,
                "id": id,
                "type": lane.as_str(),
                "customer_id": customer.id,
            })),
        )
            .into_response(),
        Err(e) => e.into_response(),
    }
}

fn bad_request(msg: &str) -> Response {
    (StatusCode::BAD_REQUEST, Json(json!({ "error": msg }))).into_response()
}
