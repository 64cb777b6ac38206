//! Rows the billing core touches at its boundary with the rest of the
//! platform: employers, employee sub-wallets, vendors, bills and pending
//! signup requests.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employer {
    pub id: Uuid,
    pub company_name: String,
    pub contact_email: Option<String>,
    pub plan_name: Option<String>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Employee {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub full_name: String,
    pub credit_balance: Decimal,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Vendor {
    pub id: Uuid,
    pub employer_id: Uuid,
    pub name: String,
    pub payment_status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Bill {
    pub id: Uuid,
    pub employee_id: Uuid,
    pub description: Option<String>,
    pub amount: Decimal,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A company signup awaiting acceptance. Accepting one bootstraps the
/// employer, its wallet, and optionally its first subscription in a
/// single unit of work.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct CompanyRequest {
    pub id: Uuid,
    pub company_name: String,
    pub contact_email: String,
    pub plan_id: Option<Uuid>,
    pub payment_marked_paid: bool,
    pub status: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
