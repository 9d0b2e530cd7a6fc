use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// Customer identity and rate limit. Read-only from the core's perspective
/// — nothing in this crate inserts or mutates customers.
#[derive(Debug, Clone, FromRow)]
pub struct Customer {
    pub id: i64,
    pub name: String,
    pub api_key: String,
    pub status: String,
    pub rate_limit_rps: Option<i32>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Customer {
    pub fn is_active(&self) -> bool {
        self.status == "active"
    }
}
