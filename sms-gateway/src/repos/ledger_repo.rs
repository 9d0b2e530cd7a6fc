//! Ledger repository (C6): append-only journal with idempotency-key
//! uniqueness. Second insert with a colliding key is a no-op — translated
//! from the reference implementation's MySQL `ON DUPLICATE KEY UPDATE id =
//! id` into Postgres `ON CONFLICT (idempotency_key) DO NOTHING`.

use sqlx::{Postgres, Transaction};

use crate::models::LedgerOp;

/// One row to insert in a capture/refund batch.
#[derive(Debug, Clone)]
pub struct LedgerRow {
    pub customer_id: i64,
    pub amount: i64,
    pub message_id: String,
}

/// A row that the batch insert actually affected (i.e. was not a duplicate
/// of an already-present idempotency key). The batch writer derives wallet
/// deltas from this set rather than from the raw input batch — see
/// DESIGN.md's Open Question decision on wallet delta derivation.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct AppliedLedgerRow {
    pub customer_id: i64,
    pub amount: i64,
    pub message_id: String,
}

pub async fn exists_by_idem(
    tx: &mut Transaction<'_, Postgres>,
    idem: &str,
) -> Result<bool, sqlx::Error> {
    let row: Option<(i32,)> =
        sqlx::query_as("SELECT 1 FROM wallet_ledger WHERE idempotency_key = $1 LIMIT 1")
            .bind(idem)
            .fetch_optional(&mut **tx)
            .await?;
    Ok(row.is_some())
}

pub async fn insert_topup(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: i64,
    amount: i64,
    idem: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO wallet_ledger (customer_id, op, amount, idempotency_key)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (idempotency_key) DO NOTHING
        "#,
    )
    .bind(customer_id)
    .bind(LedgerOp::Topup.as_str())
    .bind(amount)
    .bind(idem)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn insert_reserve(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: i64,
    amount: i64,
    message_id: &str,
    idem: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO wallet_ledger (customer_id, op, amount, idempotency_key, message_id)
        VALUES ($1, $2, $3, $4, $5)
        ON CONFLICT (idempotency_key) DO NOTHING
        "#,
    )
    .bind(customer_id)
    .bind(LedgerOp::Reserve.as_str())
    .bind(amount)
    .bind(idem)
    .bind(message_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn insert_capture_batch(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[LedgerRow],
) -> Result<Vec<AppliedLedgerRow>, sqlx::Error> {
    insert_batch(tx, LedgerOp::Capture, rows).await
}

pub async fn insert_refund_batch(
    tx: &mut Transaction<'_, Postgres>,
    rows: &[LedgerRow],
) -> Result<Vec<AppliedLedgerRow>, sqlx::Error> {
    insert_batch(tx, LedgerOp::Refund, rows).await
}

/// Multi-row insert-or-ignore keyed on `<op-prefix>-<message_id>` (`cap-` /
/// `ref-`), returning only the rows that were actually inserted so the
/// caller can compute wallet deltas from real effect, not from the raw
/// input list (duplicate deliveries then contribute zero delta).
async fn insert_batch(
    tx: &mut Transaction<'_, Postgres>,
    op: LedgerOp,
    rows: &[LedgerRow],
) -> Result<Vec<AppliedLedgerRow>, sqlx::Error> {
    if rows.is_empty() {
        return Ok(Vec::new());
    }

    let prefix = match op {
        LedgerOp::Capture => "cap",
        LedgerOp::Refund => "ref",
        LedgerOp::Topup | LedgerOp::Reserve => unreachable!("batch insert is capture/refund only"),
    };

    let customer_ids: Vec<i64> = rows.iter().map(|r| r.customer_id).collect();
    let amounts: Vec<i64> = rows.iter().map(|r| r.amount).collect();
    let message_ids: Vec<String> = rows.iter().map(|r| r.message_id.clone()).collect();
    let idem_keys: Vec<String> = rows
        .iter()
        .map(|r| format!("{prefix}-{}", r.message_id))
        .collect();
    let ops: Vec<&str> = rows.iter().map(|_| op.as_str()).collect();

    let applied = sqlx::query_as::<_, AppliedLedgerRow>(
        r#"
        INSERT INTO wallet_ledger (customer_id, op, amount, idempotency_key, message_id)
        SELECT * FROM UNNEST($1::bigint[], $2::text[], $3::bigint[], $4::text[], $5::text[])
        ON CONFLICT (idempotency_key) DO NOTHING
        RETURNING customer_id, amount, message_id
        "#,
    )
    .bind(&customer_ids)
    .bind(&ops)
    .bind(&amounts)
    .bind(&idem_keys)
    .bind(&message_ids)
    .fetch_all(&mut **tx)
    .await?;

    Ok(applied)
}
