//! API models for the employer credit wallet: top-ups, credit requests,
//! drawdown operations and ledger reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Amounts moving through the wallet must be strictly positive; zero and
/// negative deltas are rejected before any transaction is opened.
pub fn amount_strictly_positive(amount: &Decimal) -> Result<(), ValidationError> {
    if *amount <= Decimal::ZERO {
        return Err(ValidationError::new("amount_must_be_positive"));
    }
    Ok(())
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AddCreditRequest {
    pub employer_id: Uuid,
    #[validate(custom(function = "amount_strictly_positive"))]
    pub amount: Decimal,
    #[validate(length(max = 500))]
    pub reference_note: Option<String>,
    pub payment_mode: Option<String>,
    pub transaction_id: Option<String>,
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct BulkAddCreditRequest {
    #[validate(length(min = 1))]
    pub employer_ids: Vec<Uuid>,
    #[validate(custom(function = "amount_strictly_positive"))]
    pub amount: Decimal,
    #[validate(length(max = 500))]
    pub reference_note: Option<String>,
    pub payment_mode: Option<String>,
    pub transaction_id: Option<String>,
    pub actor_id: Option<Uuid>,
}

/// Employer-initiated top-up request; lands in the ledger as `pending`
/// and does not touch the wallet until approved.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RequestCreditRequest {
    pub employer_id: Uuid,
    #[validate(custom(function = "amount_strictly_positive"))]
    pub amount: Decimal,
    #[validate(length(max = 500))]
    pub reference_note: Option<String>,
    pub payment_mode: Option<String>,
    pub transaction_id: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RejectCreditRequest {
    #[validate(length(min = 1, max = 500))]
    pub reason: String,
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApproveCreditRequest {
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreditResponse {
    pub employer_id: Uuid,
    pub amount: Decimal,
    pub new_balance: Decimal,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BulkCreditResponse {
    pub results: Vec<CreditResponse>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PaySalaryRequest {
    pub employer_id: Uuid,
    #[validate(custom(function = "amount_strictly_positive"))]
    pub amount: Decimal,
    #[validate(length(min = 1, max = 50))]
    pub period: String,
    #[validate(length(max = 500))]
    pub notes: Option<String>,
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PayVendorRequest {
    pub employer_id: Uuid,
    #[validate(custom(function = "amount_strictly_positive"))]
    pub amount: Decimal,
    pub payment_method: Option<String>,
    pub reference: Option<String>,
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AssignCreditRequest {
    pub employer_id: Uuid,
    #[validate(custom(function = "amount_strictly_positive"))]
    pub amount: Decimal,
    #[validate(length(max = 500))]
    pub reason: Option<String>,
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayBillRequest {
    pub bill_id: Uuid,
    pub actor_id: Option<Uuid>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DrawdownResponse {
    pub employer_id: Uuid,
    pub amount: Decimal,
    pub new_balance: Decimal,
    pub ledger_entry_id: Uuid,
}

/// Query filters for the paginated ledger read.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerQuery {
    pub employer_id: Option<Uuid>,
    pub kind: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_zero_and_negative_amounts() {
        assert!(amount_strictly_positive(&Decimal::ZERO).is_err());
        assert!(amount_strictly_positive(&Decimal::new(-100, 2)).is_err());
        assert!(amount_strictly_positive(&Decimal::new(1, 2)).is_ok());
    }

    #[test]
    fn add_credit_request_validates_amount() {
        let req = AddCreditRequest {
            employer_id: Uuid::new_v4(),
            amount: Decimal::ZERO,
            reference_note: None,
            payment_mode: None,
            transaction_id: None,
            actor_id: None,
        };
        assert!(req.validate().is_err());
    }

    #[test]
    fn bulk_request_requires_at_least_one_employer() {
        let req = BulkAddCreditRequest {
            employer_ids: vec![],
            amount: Decimal::new(50000, 2),
            reference_note: None,
            payment_mode: None,
            transaction_id: None,
            actor_id: None,
        };
        assert!(req.validate().is_err());
    }
}
