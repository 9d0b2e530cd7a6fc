//! Batch writer (1 per lane): buffers update items and flushes them in one
//! transaction, size- or time-triggered (§4.5).
//!
//! Ordering within a flush is ledger, then wallet, then messages, matching
//! the spec's rationale: the ledger's idempotency-key uniqueness is the
//! safety net, wallet deltas are derived from the rows the ledger insert
//! actually affected (DESIGN.md's Open Question decision), and the message
//! status update is itself idempotent.

use std::time::Duration;

use sqlx::PgPool;
use tokio::sync::mpsc::Receiver;
use tokio_util::sync::CancellationToken;

use crate::models::MessageStatus;
use crate::repos::{ledger_repo, messages_repo, wallet_repo};
use crate::repos::ledger_repo::LedgerRow;
use crate::repos::wallet_repo::WalletDelta;

use super::UpdateItem;

pub(super) async fn run(
    pool: PgPool,
    mut updates: Receiver<UpdateItem>,
    batch_size: usize,
    batch_wait: Duration,
    shutdown: CancellationToken,
) {
    let mut success: Vec<UpdateItem> = Vec::new();
    let mut failed: Vec<UpdateItem> = Vec::new();
    let mut tick = tokio::time::interval(batch_wait);
    tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;

            _ = shutdown.cancelled() => {
                drain_remaining(&mut updates, &mut success, &mut failed, batch_size);
                flush(&pool, &mut success, &mut failed).await;
                return;
            }

            item = updates.recv() => {
                match item {
                    Some(item) => {
                        match item.status {
                            MessageStatus::Sent => success.push(item),
                            MessageStatus::Failed => failed.push(item),
                            MessageStatus::Queued => unreachable!("processors never emit Queued"),
                        }
                        if success.len() + failed.len() >= batch_size {
                            flush(&pool, &mut success, &mut failed).await;
                        }
                    }
                    None => {
                        flush(&pool, &mut success, &mut failed).await;
                        return;
                    }
                }
            }

            _ = tick.tick() => {
                flush(&pool, &mut success, &mut failed).await;
            }
        }
    }
}

/// Best-effort final drain on shutdown: pick up whatever is already
/// buffered in the channel without blocking.
fn drain_remaining(
    updates: &mut Receiver<UpdateItem>,
    success: &mut Vec<UpdateItem>,
    failed: &mut Vec<UpdateItem>,
    batch_size: usize,
) {
    while success.len() + failed.len() < batch_size * 4 {
        match updates.try_recv() {
            Ok(item) => match item.status {
                MessageStatus::Sent => success.push(item),
                MessageStatus::Failed => failed.push(item),
                MessageStatus::Queued => unreachable!("processors never emit Queued"),
            },
            Err(_) => break,
        }
    }
}

/// Flush buffered updates in one transaction. On error, rolls back and
/// leaves the buffers untouched so the next trigger retries the whole
/// batch — ledger/status idempotency makes that safe (§4.5 step 4, §7).
async fn flush(pool: &PgPool, success: &mut Vec<UpdateItem>, failed: &mut Vec<UpdateItem>) {
    if success.is_empty() && failed.is_empty() {
        return;
    }

    match try_flush(pool, success, failed).await {
        Ok(()) => {
            tracing::info!(
                sent = success.len(),
                failed = failed.len(),
                "batch flush committed"
            );
            success.clear();
            failed.clear();
        }
        Err(e) => {
            tracing::error!(error = %e, "batch flush failed, will retry on next trigger");
        }
    }
}

async fn try_flush(
    pool: &PgPool,
    success: &[UpdateItem],
    failed: &[UpdateItem],
) -> Result<(), sqlx::Error> {
    let cap_rows: Vec<LedgerRow> = success
        .iter()
        .map(|it| LedgerRow {
            customer_id: it.customer_id,
            amount: it.amount,
            message_id: it.id.clone(),
        })
        .collect();
    let ref_rows: Vec<LedgerRow> = failed
        .iter()
        .map(|it| LedgerRow {
            customer_id: it.customer_id,
            amount: it.amount,
            message_id: it.id.clone(),
        })
        .collect();

    let mut tx = pool.begin().await?;

    let applied_caps = ledger_repo::insert_capture_batch(&mut tx, &cap_rows).await?;
    let applied_refs = ledger_repo::insert_refund_batch(&mut tx, &ref_rows).await?;

    let mut deltas: std::collections::HashMap<i64, WalletDelta> = std::collections::HashMap::new();
    for row in &applied_caps {
        let d = deltas.entry(row.customer_id).or_insert(WalletDelta {
            customer_id: row.customer_id,
            dec_reserved: 0,
            inc_balance: 0,
        });
        d.dec_reserved += row.amount;
    }
    for row in &applied_refs {
        let d = deltas.entry(row.customer_id).or_insert(WalletDelta {
            customer_id: row.customer_id,
            dec_reserved: 0,
            inc_balance: 0,
        });
        d.dec_reserved += row.amount;
        d.inc_balance += row.amount;
    }
    let deltas: Vec<WalletDelta> = deltas.into_values().collect();

    wallet_repo::batch_apply_sums(&mut tx, &deltas).await?;

    let sent_ids: Vec<String> = success.iter().map(|it| it.id.clone()).collect();
    let failed_ids: Vec<String> = failed.iter().map(|it| it.id.clone()).collect();

    messages_repo::batch_update_status(&mut tx, &sent_ids, MessageStatus::Sent).await?;
    messages_repo::batch_update_status(&mut tx, &failed_ids, MessageStatus::Failed).await?;

    tx.commit().await
}
