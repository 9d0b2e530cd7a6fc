//! GET /healthz (§6).

use axum::extract::State;
use axum::http::StatusCode;
use sqlx::PgPool;

pub async fn healthz(State(pool): State<PgPool>) -> (StatusCode, &'static str) {
    match sqlx::query("SELECT 1").execute(&pool).await {
        Ok(_) => (StatusCode::OK, "ok"),
        Err(e) => {
            tracing::error!(error = %e, "healthz db check failed");
            (StatusCode::SERVICE_UNAVAILABLE, "unavailable")
        }
    }
}
