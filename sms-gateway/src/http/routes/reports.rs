//! GET /v1/reports/messages (§6).

use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Json, Response};
use axum::Extension;
use serde::Deserialize;
use serde_json::json;

use crate::http::AppState;
use crate::models::{Customer, MessageStatus};
use crate::phone;

#[derive(Debug, Deserialize)]
pub struct ListMessagesQuery {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
    pub status: Option<String>,
    pub phone: Option<String>,
}

pub async fn list_messages(
    State(state): State<AppState>,
    Extension(customer): Extension<Customer>,
    Query(q): Query<ListMessagesQuery>,
) -> Response {
    let limit = q.limit.unwrap_or(50).clamp(1, 1000);
    let offset = q.offset.unwrap_or(0).max(0);
    let status = q.status.as_deref().and_then(MessageStatus::parse);
    let phone = q.phone.as_deref().map(phone::normalize);

    match crate::repos::messages_repo::list_by_customer(
        &state.pool,
        customer.id,
        status,
        phone.as_deref(),
        limit,
        offset,
    )
    .await
    {
        Ok(results) => (
            StatusCode::OK,
            Json(json!({
                "limit": limit,
                "offset": offset,
                "count": results.len(),
                "results": results.iter().map(message_json).collect::<Vec<_>>(),
            })),
        )
            .into_response(),
        Err(e) => {
            tracing::error!(error = %e, "reports query failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": "query failed" })),
            )
                .into_response()
        }
    }
}

fn message_json(m: &crate::models::Message) -> serde_json::Value {
    json!({
        "id": m.id,
        "customer_id": m.customer_id,
        "phone": m.phone,
        "text": m.text,
        "type": m.sms_type,
        "status": m.status,
        "created_at": m.created_at,
        "updated_at": m.updated_at,
    })
}
