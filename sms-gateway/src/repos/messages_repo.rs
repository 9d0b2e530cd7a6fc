//! Messages repository (C7): insert the queued row, later batch-update
//! status from the sender's batch writer.

use sqlx::{PgPool, Postgres, QueryBuilder, Transaction};

use crate::models::{Message, MessageStatus};

pub async fn insert_queued(
    tx: &mut Transaction<'_, Postgres>,
    message: &Message,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO messages (id, customer_id, phone, text, type, status)
        VALUES ($1, $2, $3, $4, $5, 'queued')
        "#,
    )
    .bind(&message.id)
    .bind(message.customer_id)
    .bind(&message.phone)
    .bind(&message.text)
    .bind(&message.sms_type)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Batch-transition a set of message ids to `status`. A no-op if `ids` is
/// empty. Idempotent: re-applying `sent` to an already-`sent` row is a
/// harmless no-op UPDATE, which is what makes duplicate bus delivery safe
/// (scenario S6).
pub async fn batch_update_status(
    tx: &mut Transaction<'_, Postgres>,
    ids: &[String],
    status: MessageStatus,
) -> Result<(), sqlx::Error> {
    if ids.is_empty() {
        return Ok(());
    }

    sqlx::query(
        r#"
        UPDATE messages
        SET status = $1, updated_at = now()
        WHERE id = ANY($2)
        "#,
    )
    .bind(status.as_str())
    .bind(ids)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Read-only listing for the reports endpoint (§6), scoped to one
/// customer with optional status/phone filters. Sits directly on the
/// relational store rather than the analytical one — the out-of-scope
/// analytical read-view is a separate, unimplemented external collaborator.
pub async fn list_by_customer(
    pool: &PgPool,
    customer_id: i64,
    status: Option<MessageStatus>,
    phone: Option<&str>,
    limit: i64,
    offset: i64,
) -> Result<Vec<Message>, sqlx::Error> {
    let mut qb = QueryBuilder::new(
        "SELECT id, customer_id, phone, text, type, status, created_at, updated_at \
         FROM messages WHERE customer_id = ",
    );
    qb.push_bind(customer_id);

    if let Some(status) = status {
        qb.push(" AND status = ");
        qb.push_bind(status.as_str());
    }
    if let Some(phone) = phone {
        if !phone.is_empty() {
            qb.push(" AND phone = ");
            qb.push_bind(phone);
        }
    }

    qb.push(" ORDER BY id DESC LIMIT ");
    qb.push_bind(limit);
    qb.push(" OFFSET ");
    qb.push_bind(offset);

    qb.build_query_as::<Message>().fetch_all(pool).await
}
