//! Read-only access to the customer table, used only by the API-key auth
//! middleware. Nothing else in this crate touches `customers`.

use sqlx::PgPool;

use crate::models::Customer;

pub async fn get_by_api_key(pool: &PgPool, api_key: &str) -> Result<Option<Customer>, sqlx::Error> {
    sqlx::query_as::<_, Customer>(
        r#"
        SELECT id, name, api_key, status, rate_limit_rps, created_at, updated_at
        FROM customers
        WHERE api_key = $1
        "#,
    )
    .bind(api_key)
    .fetch_optional(pool)
    .await
}
