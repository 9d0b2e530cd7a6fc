//! Fixed 1-second window per-customer rate limiting (§6). In-process
//! dashmap-keyed counters — no Redis dependency in the retrievable stack,
//! matching the teacher's in-process `KeyedLimiters` shape
//! (`platform/identity-auth/src/rate_limit.rs`) but with a plain
//! fixed-window counter instead of a token-bucket crate, since the spec
//! asks for "fixed 1-second window", not a smoothed rate.

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use axum::body::Body;
use axum::extract::{Request, State};
use axum::http::{HeaderValue, StatusCode};
use axum::middleware::Next;
use axum::response::{IntoResponse, Json, Response};
use dashmap::DashMap;
use serde_json::json;

use crate::models::Customer;

struct Window {
    epoch_sec: AtomicI64,
    count: AtomicU32,
}

#[derive(Clone)]
pub struct RateLimiter {
    windows: Arc<DashMap<i64, Arc<Window>>>,
    default_rps: u32,
}

impl RateLimiter {
    pub fn new(default_rps: u32) -> Self {
        Self {
            windows: Arc::new(DashMap::new()),
            default_rps,
        }
    }

    /// Returns `Ok(())` if admitted, `Err(retry_after_secs)` if the
    /// customer has exceeded their per-second budget for the current
    /// window.
    fn check(&self, customer_id: i64, limit: u32) -> Result<(), u64> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("system clock before unix epoch")
            .as_secs() as i64;

        let window = self
            .windows
            .entry(customer_id)
            .or_insert_with(|| {
                Arc::new(Window {
                    epoch_sec: AtomicI64::new(now),
                    count: AtomicU32::new(0),
                })
            })
            .clone();

        let prev_epoch = window.epoch_sec.swap(now, Ordering::SeqCst);
        let count = if prev_epoch == now {
            window.count.fetch_add(1, Ordering::SeqCst) + 1
        } else {
            window.count.store(1, Ordering::SeqCst);
            1
        };

        if count > limit.max(1) {
            return Err(1);
        }
        Ok(())
    }
}

pub async fn rate_limit_middleware(
    State(limiter): State<RateLimiter>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let Some(customer) = request.extensions().get::<Customer>() else {
        // Auth middleware runs before this one; absence means an
        // unauthenticated route is mounted under this layer by mistake.
        return next.run(request).await;
    };

    let limit = customer
        .rate_limit_rps
        .filter(|&v| v > 0)
        .map(|v| v as u32)
        .unwrap_or(limiter.default_rps);

    match limiter.check(customer.id, limit) {
        Ok(()) => next.run(request).await,
        Err(retry_after) => {
            let mut response = (
                StatusCode::TOO_MANY_REQUESTS,
                Json(json!({ "error": "rate limited" })),
            )
                .into_response();
            if let Ok(value) = HeaderValue::from_str(&retry_after.to_string()) {
                response.headers_mut().insert("Retry-After", value);
            }
            response
        }
    }
}
