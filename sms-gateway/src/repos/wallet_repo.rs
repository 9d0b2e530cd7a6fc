//! Wallet repository (C5): balance/reserved arithmetic, batched deltas, and
//! the `FOR UPDATE` row lock Enqueue relies on. Translated from the
//! reference implementation's MySQL `ON DUPLICATE KEY UPDATE` / per-row
//! `UNION ALL` derived table into Postgres `ON CONFLICT` / `UPDATE ... FROM
//! (SELECT unnest(...))`.

use sqlx::{Postgres, Transaction};

/// Net per-customer change to apply in one batched UPDATE. `dec_reserved`
/// and `inc_balance` are both non-negative sums of individual deltas.
#[derive(Debug, Clone, Copy)]
pub struct WalletDelta {
    pub customer_id: i64,
    pub dec_reserved: i64,
    pub inc_balance: i64,
}

pub async fn upsert_account(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO wallet_accounts (customer_id, balance, reserved)
        VALUES ($1, 0, 0)
        ON CONFLICT (customer_id) DO UPDATE SET updated_at = now()
        "#,
    )
    .bind(customer_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Row-locks the wallet and returns `(balance, reserved)`.
pub async fn get_for_update(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: i64,
) -> Result<(i64, i64), sqlx::Error> {
    let row: (i64, i64) = sqlx::query_as(
        r#"
        SELECT balance, reserved
        FROM wallet_accounts
        WHERE customer_id = $1
        FOR UPDATE
        "#,
    )
    .bind(customer_id)
    .fetch_one(&mut **tx)
    .await?;

    Ok(row)
}

pub async fn adjust(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: i64,
    delta_balance: i64,
    delta_reserved: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE wallet_accounts
        SET balance = balance + $1, reserved = reserved + $2, updated_at = now()
        WHERE customer_id = $3
        "#,
    )
    .bind(delta_balance)
    .bind(delta_reserved)
    .bind(customer_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

pub async fn topup(
    tx: &mut Transaction<'_, Postgres>,
    customer_id: i64,
    amount: i64,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        UPDATE wallet_accounts
        SET balance = balance + $1, updated_at = now()
        WHERE customer_id = $2
        "#,
    )
    .bind(amount)
    .bind(customer_id)
    .execute(&mut **tx)
    .await?;

    Ok(())
}

/// Apply summed per-customer deltas in a single UPDATE. Deltas are sorted
/// by `customer_id` before binding to canonicalize lock acquisition order
/// across the normal/express lanes' independent batch writers (see
/// DESIGN.md's two-lane contention decision).
pub async fn batch_apply_sums(
    tx: &mut Transaction<'_, Postgres>,
    deltas: &[WalletDelta],
) -> Result<(), sqlx::Error> {
    if deltas.is_empty() {
        return Ok(());
    }

    let mut sorted: Vec<WalletDelta> = deltas.to_vec();
    sorted.sort_by_key(|d| d.customer_id);

    let customer_ids: Vec<i64> = sorted.iter().map(|d| d.customer_id).collect();
    let dec_reserved: Vec<i64> = sorted.iter().map(|d| d.dec_reserved).collect();
    let inc_balance: Vec<i64> = sorted.iter().map(|d| d.inc_balance).collect();

    sqlx::query(
        r#"
        UPDATE wallet_accounts w
        SET reserved = w.reserved - s.dec_reserved,
            balance = w.balance + s.inc_balance,
            updated_at = now()
        FROM (
            SELECT customer_id, SUM(dec_reserved) AS dec_reserved, SUM(inc_balance) AS inc_balance
            FROM UNNEST($1::bigint[], $2::bigint[], $3::bigint[])
                AS t(customer_id, dec_reserved, inc_balance)
            GROUP BY customer_id
        ) s
        WHERE s.customer_id = w.customer_id
        "#,
    )
    .bind(&customer_ids)
    .bind(&dec_reserved)
    .bind(&inc_balance)
    .execute(&mut **tx)
    .await?;

    Ok(())
}
