//! API models and status vocabularies for plans, subscriptions, invoices
//! and payments.
//!
//! Status and kind columns are stored as plain text in Postgres; these
//! enums are the single source of the accepted values on both sides of
//! the wire.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

use crate::wallet::amount_strictly_positive;

macro_rules! status_enum {
    ($name:ident { $($variant:ident => $text:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(format!("unknown {} value: {}", stringify!($name), other)),
                }
            }
        }
    };
}

status_enum!(LedgerKind {
    Credit => "credit",
    Debit => "debit",
    Salary => "salary",
    SalaryCredit => "salary_credit",
    VendorPayment => "vendor_payment",
    BillPayment => "bill_payment",
});

status_enum!(LedgerStatus {
    Pending => "pending",
    Success => "success",
    Failed => "failed",
});

status_enum!(SubscriptionStatus {
    Pending => "pending",
    Active => "active",
    Expired => "expired",
});

status_enum!(InvoiceStatus {
    Pending => "pending",
    Paid => "paid",
});

status_enum!(PaymentStatus {
    Success => "success",
    Failed => "failed",
});

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePlanRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(custom(function = "amount_strictly_positive"))]
    pub price: Decimal,
    #[validate(range(min = 1, max = 120))]
    pub duration_months: i32,
    #[validate(range(min = 1))]
    pub max_employees: i32,
    #[validate(range(min = 0))]
    pub max_jobs: i32,
    pub features: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

/// Typed partial update: only the fields present are written, translated
/// to SQL by the storage layer rather than by string concatenation.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct UpdatePlanRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: Option<String>,
    pub price: Option<Decimal>,
    #[validate(range(min = 1, max = 120))]
    pub duration_months: Option<i32>,
    #[validate(range(min = 1))]
    pub max_employees: Option<i32>,
    #[validate(range(min = 0))]
    pub max_jobs: Option<i32>,
    pub features: Option<serde_json::Value>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct PurchasePlanRequest {
    pub employer_id: Uuid,
    pub plan_id: Uuid,
    #[validate(length(min = 1, max = 50))]
    pub payment_method: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AssignPlanRequest {
    pub plan_id: Uuid,
    pub start_date: Option<DateTime<Utc>>,
    pub auto_renew: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PurchaseResponse {
    pub subscription_id: Uuid,
    pub invoice_id: Uuid,
    pub invoice_number: String,
    pub payment_id: Uuid,
    pub status: SubscriptionStatus,
    pub end_date: DateTime<Utc>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PageQuery {
    pub page: Option<i64>,
    pub per_page: Option<i64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_round_trips_through_text() {
        assert_eq!(LedgerKind::SalaryCredit.as_str(), "salary_credit");
        assert_eq!(
            "vendor_payment".parse::<LedgerKind>().unwrap(),
            LedgerKind::VendorPayment
        );
        assert_eq!(
            "active".parse::<SubscriptionStatus>().unwrap(),
            SubscriptionStatus::Active
        );
        assert!("cancelled".parse::<SubscriptionStatus>().is_err());
    }

    #[test]
    fn serde_uses_snake_case_text() {
        let json = serde_json::to_string(&LedgerKind::BillPayment).unwrap();
        assert_eq!(json, "\"bill_payment\"");
        let status: PaymentStatus = serde_json::from_str("\"failed\"").unwrap();
        assert_eq!(status, PaymentStatus::Failed);
    }
}
