//! Wallet topup — the one wallet-facing write path outside Enqueue.
//! Idempotent on `request_id`: a repeated request_id is detected via the
//! ledger's `topup-<request_id>` key and returns the prior result without
//! crediting the wallet twice.

use sqlx::PgPool;

use crate::errors::ServiceError;
use crate::repos::{ledger_repo, wallet_repo};

pub struct TopupOutcome {
    pub idempotent: bool,
}

pub struct WalletService {
    pool: PgPool,
}

impl WalletService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn topup(
        &self,
        customer_id: i64,
        amount: i64,
        request_id: &str,
    ) -> Result<TopupOutcome, ServiceError> {
        let idem = format!("topup-{request_id}");

        let mut tx = self.pool.begin().await?;

        wallet_repo::upsert_account(&mut tx, customer_id).await?;

        if ledger_repo::exists_by_idem(&mut tx, &idem).await? {
            tx.commit().await?;
            return Ok(TopupOutcome { idempotent: true });
        }

        ledger_repo::insert_topup(&mut tx, customer_id, amount, &idem).await?;
        wallet_repo::topup(&mut tx, customer_id, amount).await?;

        tx.commit().await?;

        Ok(TopupOutcome { idempotent: false })
    }
}
