//! Outbox repository (C8): insert-only, in the caller's transaction. No
//! repository in this crate opens its own transaction — see
//! `services::queue_service`.

use sqlx::{Postgres, Transaction};

pub async fn insert(
    tx: &mut Transaction<'_, Postgres>,
    aggregate: &str,
    aggregate_id: &str,
    topic: &str,
    payload: &[u8],
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO outbox_events (aggregate, aggregate_id, topic, payload)
        VALUES ($1, $2, $3, $4)
        "#,
    )
    .bind(aggregate)
    .bind(aggregate_id)
    .bind(topic)
    .bind(payload)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
