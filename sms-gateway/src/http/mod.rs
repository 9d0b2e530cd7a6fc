pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::extract::FromRef;
use axum::middleware::from_fn_with_state;
use axum::routing::{get, post};
use axum::Router;
use sqlx::PgPool;
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::health::healthz;
use crate::metrics::{metrics_handler, Metrics};
use crate::services::{QueueService, WalletService};

use self::middleware::{api_key_middleware, rate_limit_middleware, RateLimiter};

/// Shared application state injected into every handler via `State<AppState>`.
#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub queue_service: Arc<QueueService>,
    pub wallet_service: Arc<WalletService>,
    pub metrics: Metrics,
}

impl FromRef<AppState> for PgPool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Metrics {
    fn from_ref(state: &AppState) -> Self {
        state.metrics.clone()
    }
}

/// Build the full router: `/v1` endpoints behind API-key auth and
/// per-customer rate limiting, plus unauthenticated `/healthz` and
/// `/metrics` (§6).
pub fn build_router(state: AppState, config: &Config) -> Router {
    let rate_limiter = RateLimiter::new(config.rate_limit.rps);

    let v1 = Router::new()
        .route("/sms/send", post(routes::send_sms::send_sms))
        .route("/wallet/topup", post(routes::wallet_topup::topup))
        .route("/reports/messages", get(routes::reports::list_messages))
        .layer(from_fn_with_state(rate_limiter, rate_limit_middleware))
        .layer(from_fn_with_state(state.pool.clone(), api_key_middleware));

    Router::new()
        .route("/healthz", get(healthz))
        .route("/metrics", get(metrics_handler))
        .nest("/v1", v1)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
