use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::fmt;

/// One per customer. Invariants: `balance >= 0`, `reserved >= 0`; created
/// lazily on first touch via an idempotent upsert.
#[derive(Debug, Clone, FromRow)]
pub struct WalletAccount {
    pub customer_id: i64,
    pub balance: i64,
    pub reserved: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Wallet mutation kind, stored on each ledger row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerOp {
    Topup,
    Reserve,
    Capture,
    Refund,
}

impl LedgerOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            LedgerOp::Topup => "topup",
            LedgerOp::Reserve => "reserve",
            LedgerOp::Capture => "capture",
            LedgerOp::Refund => "refund",
        }
    }
}

impl fmt::Display for LedgerOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An append-only ledger row. `idempotency_key` is globally unique; a
/// second insert with the same key is a no-op (see `ledger_repo`).
#[derive(Debug, Clone, FromRow)]
pub struct WalletLedgerRow {
    pub id: i64,
    pub customer_id: i64,
    pub op: String,
    pub amount: i64,
    pub idempotency_key: String,
    pub message_id: Option<String>,
    pub created_at: DateTime<Utc>,
}
