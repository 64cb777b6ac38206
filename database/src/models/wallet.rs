use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Per-employer running balance plus lifetime totals.
///
/// `balance == total_added - total_used` after every committed operation;
/// every mutation goes through the credit or drawdown paths, never direct
/// column writes.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Wallet {
    pub employer_id: Uuid,
    pub balance: Decimal,
    pub total_added: Decimal,
    pub total_used: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// One credit or debit event. Append-only: the only permitted mutations
/// are status flips on `pending` rows and soft deletion.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct LedgerEntry {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub amount: Decimal,
    pub kind: String,
    pub reference_note: Option<String>,
    pub payment_mode: Option<String>,
    pub external_transaction_id: Option<String>,
    pub status: String,
    pub actor_id: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub deleted_at: Option<DateTime<Utc>>,
}

/// Insert shape for a ledger append.
#[derive(Debug, Clone)]
pub struct NewLedgerEntry {
    pub employer_id: Uuid,
    pub employee_id: Option<Uuid>,
    pub amount: Decimal,
    pub kind: String,
    pub reference_note: Option<String>,
    pub payment_mode: Option<String>,
    pub external_transaction_id: Option<String>,
    pub status: String,
    pub actor_id: Option<Uuid>,
}
