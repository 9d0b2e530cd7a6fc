//! API key authentication middleware. Every `/v1` route requires a valid,
//! active customer identified by the `X-API-Key` header (§6).

use axum::body::Body;
use axum::extract::{Request, State};
use axum::middleware::Next;
use axum::response::Response;
use sqlx::PgPool;

use crate::errors::AuthError;
use crate::models::Customer;
use crate::repos::customers_repo;

const API_KEY_HEADER: &str = "x-api-key";

pub async fn api_key_middleware(
    State(pool): State<PgPool>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AuthError> {
    let key = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .ok_or(AuthError::Missing)?
        .to_string();

    let customer: Option<Customer> = customers_repo::get_by_api_key(&pool, &key).await?;

    let customer = match customer {
        Some(c) if c.is_active() => c,
        _ => return Err(AuthError::Invalid),
    };

    request.extensions_mut().insert(customer);
    Ok(next.run(request).await)
}
