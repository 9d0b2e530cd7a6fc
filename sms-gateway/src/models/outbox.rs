use chrono::{DateTime, Utc};
use sqlx::FromRow;

/// A pending publish, inserted only inside the Enqueue transaction (C9) and
/// never read back by this core — the (external, unimplemented) CDC relay
/// owns consuming/removing these rows. See §3 / §6 Outbox contract.
#[derive(Debug, Clone, FromRow)]
pub struct OutboxEvent {
    pub id: i64,
    pub aggregate: String,
    pub aggregate_id: String,
    pub topic: String,
    pub payload: Vec<u8>,
    pub attempts: i32,
    pub created_at: DateTime<Utc>,
}
