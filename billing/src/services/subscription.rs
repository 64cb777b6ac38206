//! Subscription engine: owns the subscription/invoice/payment triad and
//! drives purchase, administrative assignment, onboarding acceptance and
//! manual activation.
//!
//! Per employer the lifecycle is `pending -> active -> expired`; a new
//! activation force-expires whatever was active before it, so at most one
//! subscription is ever active for an employer.

use std::sync::Arc;

use chrono::{DateTime, Months, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use tracing::{info, warn};
use uuid::Uuid;

use worklane_database::models::{
    Invoice, NewLedgerEntry, PaginatedResult, Payment, Subscription,
};
use worklane_database::repositories::{billing, company, ledger, plan, wallet};
use worklane_models::billing::{
    AssignPlanRequest, InvoiceStatus, LedgerKind, LedgerStatus, PageQuery, PaymentStatus,
    PurchasePlanRequest, PurchaseResponse, SubscriptionStatus,
};

use crate::errors::ServiceError;
use crate::services::credit::pagination_from;
use crate::services::gateway::PaymentGateway;

/// Flat tax applied to subscription invoices. Jurisdiction logic is out
/// of scope; the invoice arithmetic invariant is total = amount + tax.
const FLAT_TAX: Decimal = Decimal::ZERO;

/// Human-readable unique invoice number: timestamp plus the first eight
/// hex digits of the employer id.
pub(crate) fn invoice_number(employer_id: Uuid, at: DateTime<Utc>) -> String {
    let id = employer_id.simple().to_string();
    format!("INV-{}-{}", at.format("%Y%m%d%H%M%S"), &id[..8])
}

/// Month arithmetic with day clamping (Jan 31 + 1 month = Feb 28/29).
pub(crate) fn add_months(
    start: DateTime<Utc>,
    months: i32,
) -> Result<DateTime<Utc>, ServiceError> {
    if months <= 0 {
        return Err(ServiceError::Validation(format!(
            "plan duration must be positive, got {}",
            months
        )));
    }
    start
        .checked_add_months(Months::new(months as u32))
        .ok_or_else(|| ServiceError::Internal("subscription end date out of range".to_string()))
}

pub struct SubscriptionService {
    pool: PgPool,
    gateway: Arc<dyn PaymentGateway>,
}

impl SubscriptionService {
    pub fn new(pool: PgPool, gateway: Arc<dyn PaymentGateway>) -> Self {
        Self { pool, gateway }
    }

    /// Purchase: gateway create + verify first, then one transaction for
    /// the whole triad. A declined verification leaves an audit ledger
    /// entry behind but creates no subscription, invoice or payment.
    pub async fn purchase_plan(
        &self,
        req: &PurchasePlanRequest,
    ) -> Result<PurchaseResponse, ServiceError> {
        let now = Utc::now();

        let mut conn = self.pool.acquire().await?;
        let plan = plan::find_by_id(&mut conn, req.plan_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("plan {} not found", req.plan_id)))?;
        if !plan.is_active {
            return Err(ServiceError::State(format!(
                "plan {} is not active",
                req.plan_id
            )));
        }
        if !company::employer_exists(&mut conn, req.employer_id).await? {
            return Err(ServiceError::NotFound(format!(
                "employer {} not found",
                req.employer_id
            )));
        }
        drop(conn);

        let intent = self
            .gateway
            .create_intent(req.employer_id, plan.price, &req.payment_method)
            .await?;
        let verified = self.gateway.verify_intent(&intent).await?;
        if !verified {
            // The audit write is its own short transaction; it must
            // survive the failed purchase.
            let mut conn = self.pool.acquire().await?;
            ledger::append(
                &mut conn,
                &NewLedgerEntry {
                    employer_id: req.employer_id,
                    employee_id: None,
                    amount: plan.price,
                    kind: LedgerKind::Debit.to_string(),
                    reference_note: Some(format!(
                        "plan purchase declined by gateway, intent {}",
                        intent.intent_id
                    )),
                    payment_mode: Some(req.payment_method.clone()),
                    external_transaction_id: Some(intent.transaction_id.clone()),
                    status: LedgerStatus::Failed.to_string(),
                    actor_id: None,
                },
            )
            .await?;
            warn!(
                employer_id = %req.employer_id,
                plan_id = %req.plan_id,
                intent_id = %intent.intent_id,
                "plan purchase declined"
            );
            return Err(ServiceError::PaymentGateway(
                "payment verification failed".to_string(),
            ));
        }

        let mut tx = self.pool.begin().await?;
        let superseded = billing::expire_active_for_employer(&mut tx, req.employer_id).await?;
        let end_date = add_months(now, plan.duration_months)?;
        let subscription = billing::insert_subscription(
            &mut tx,
            req.employer_id,
            plan.id,
            now,
            end_date,
            SubscriptionStatus::Active.as_str(),
            false,
        )
        .await?;
        let invoice = billing::insert_invoice(
            &mut tx,
            &invoice_number(req.employer_id, now),
            req.employer_id,
            Some(subscription.id),
            plan.id,
            plan.price,
            FLAT_TAX,
            now,
            Some(now),
            InvoiceStatus::Paid.as_str(),
            Some(&format!("purchase of plan {}", plan.name)),
        )
        .await?;
        let payment = billing::insert_payment(
            &mut tx,
            invoice.id,
            req.employer_id,
            invoice.total_amount,
            &req.payment_method,
            Some(&intent.transaction_id),
            PaymentStatus::Success.as_str(),
        )
        .await?;
        company::set_employer_plan_name(&mut tx, req.employer_id, &plan.name).await?;
        tx.commit().await?;

        info!(
            employer_id = %req.employer_id,
            plan = %plan.name,
            subscription_id = %subscription.id,
            superseded,
            "plan purchased"
        );
        Ok(PurchaseResponse {
            subscription_id: subscription.id,
            invoice_id: invoice.id,
            invoice_number: invoice.invoice_number,
            payment_id: payment.id,
            status: SubscriptionStatus::Active,
            end_date: subscription.end_date,
        })
    }

    /// Administrative variant of purchase: no payment step, no invoice.
    pub async fn assign_plan_to_company(
        &self,
        employer_id: Uuid,
        req: &AssignPlanRequest,
    ) -> Result<Subscription, ServiceError> {
        let mut tx = self.pool.begin().await?;

        if !company::employer_exists(&mut tx, employer_id).await? {
            return Err(ServiceError::NotFound(format!(
                "employer {} not found",
                employer_id
            )));
        }
        let plan = plan::find_by_id(&mut tx, req.plan_id)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("plan {} not found", req.plan_id)))?;
        if !plan.is_active {
            return Err(ServiceError::State(format!(
                "plan {} is not active",
                req.plan_id
            )));
        }

        billing::expire_active_for_employer(&mut tx, employer_id).await?;
        let start = req.start_date.unwrap_or_else(Utc::now);
        let end = add_months(start, plan.duration_months)?;
        let subscription = billing::insert_subscription(
            &mut tx,
            employer_id,
            plan.id,
            start,
            end,
            SubscriptionStatus::Active.as_str(),
            req.auto_renew.unwrap_or(false),
        )
        .await?;
        company::set_employer_plan_name(&mut tx, employer_id, &plan.name).await?;

        tx.commit().await?;
        info!(
            employer_id = %employer_id,
            plan = %plan.name,
            subscription_id = %subscription.id,
            "plan assigned"
        );
        Ok(subscription)
    }

    /// Onboarding bridge: accepting a signup creates the employer, its
    /// zero-balance wallet, and, when the request names a plan, the
    /// subscription and billing records, all in one unit of work.
    pub async fn accept_company_request(
        &self,
        request_id: Uuid,
    ) -> Result<AcceptOutcome, ServiceError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let request = company::find_company_request(&mut tx, request_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("company request {} not found", request_id))
            })?;
        if request.status != "pending" {
            return Err(ServiceError::State(format!(
                "company request {} is already {}",
                request_id, request.status
            )));
        }

        let employer =
            company::insert_employer(&mut tx, &request.company_name, Some(&request.contact_email))
                .await?;
        wallet::lock_or_create(&mut tx, employer.id).await?;

        let mut subscription_id = None;
        if let Some(plan_id) = request.plan_id {
            let plan = plan::find_by_id(&mut tx, plan_id)
                .await?
                .ok_or_else(|| ServiceError::NotFound(format!("plan {} not found", plan_id)))?;

            let paid = request.payment_marked_paid;
            let status = if paid {
                SubscriptionStatus::Active
            } else {
                SubscriptionStatus::Pending
            };
            let end = add_months(now, plan.duration_months)?;
            let subscription = billing::insert_subscription(
                &mut tx,
                employer.id,
                plan.id,
                now,
                end,
                status.as_str(),
                false,
            )
            .await?;
            let invoice = billing::insert_invoice(
                &mut tx,
                &invoice_number(employer.id, now),
                employer.id,
                Some(subscription.id),
                plan.id,
                plan.price,
                FLAT_TAX,
                now,
                paid.then_some(now),
                if paid {
                    InvoiceStatus::Paid.as_str()
                } else {
                    InvoiceStatus::Pending.as_str()
                },
                Some("onboarding subscription"),
            )
            .await?;
            if paid {
                billing::insert_payment(
                    &mut tx,
                    invoice.id,
                    employer.id,
                    invoice.total_amount,
                    "offline",
                    None,
                    PaymentStatus::Success.as_str(),
                )
                .await?;
            }
            company::set_employer_plan_name(&mut tx, employer.id, &plan.name).await?;
            subscription_id = Some(subscription.id);
        }

        company::mark_request_accepted(&mut tx, request_id).await?;
        tx.commit().await?;

        info!(
            request_id = %request_id,
            employer_id = %employer.id,
            subscription_id = ?subscription_id,
            "company request accepted"
        );
        Ok(AcceptOutcome {
            employer_id: employer.id,
            subscription_id,
        })
    }

    /// Activation: moves a pending subscription to active, restamping its
    /// window from the plan's duration at activation time, and settles
    /// the invoice/payment if they are not already settled. Idempotent
    /// for an already-active-and-paid subscription.
    pub async fn activate_subscription(
        &self,
        subscription_id: Uuid,
    ) -> Result<Subscription, ServiceError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let existing = billing::find_subscription(&mut tx, subscription_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("subscription {} not found", subscription_id))
            })?;
        if existing.status == SubscriptionStatus::Expired.as_str() {
            return Err(ServiceError::State(format!(
                "subscription {} is expired and cannot be activated",
                subscription_id
            )));
        }
        let plan = plan::find_by_id(&mut tx, existing.plan_id)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("plan {} not found", existing.plan_id))
            })?;

        let subscription = if existing.status == SubscriptionStatus::Active.as_str() {
            existing
        } else {
            billing::expire_active_for_employer(&mut tx, existing.employer_id).await?;
            let end = add_months(now, plan.duration_months)?;
            billing::activate_subscription(&mut tx, subscription_id, now, end).await?
        };

        let invoice = match billing::find_invoice_for_subscription(&mut tx, subscription.id)
            .await?
        {
            Some(inv) if inv.status == InvoiceStatus::Paid.as_str() => inv,
            Some(inv) => billing::mark_invoice_paid(&mut tx, inv.id, now).await?,
            None => {
                billing::insert_invoice(
                    &mut tx,
                    &invoice_number(subscription.employer_id, now),
                    subscription.employer_id,
                    Some(subscription.id),
                    plan.id,
                    plan.price,
                    FLAT_TAX,
                    now,
                    Some(now),
                    InvoiceStatus::Paid.as_str(),
                    Some("manual activation"),
                )
                .await?
            }
        };
        if !billing::successful_payment_exists(&mut tx, invoice.id).await? {
            billing::insert_payment(
                &mut tx,
                invoice.id,
                subscription.employer_id,
                invoice.total_amount,
                "manual",
                None,
                PaymentStatus::Success.as_str(),
            )
            .await?;
        }
        company::set_employer_status(&mut tx, subscription.employer_id, "active").await?;
        company::set_employer_plan_name(&mut tx, subscription.employer_id, &plan.name).await?;

        tx.commit().await?;
        info!(
            subscription_id = %subscription.id,
            employer_id = %subscription.employer_id,
            "subscription activated"
        );
        Ok(subscription)
    }

    /// Subscription list runs the expiry sweep inline first, as a safety
    /// net alongside the scheduled job.
    pub async fn list_subscriptions(
        &self,
        query: &PageQuery,
    ) -> Result<PaginatedResult<Subscription>, ServiceError> {
        let swept = billing::expire_lapsed(&self.pool).await?;
        if swept > 0 {
            info!(swept, "expired lapsed subscriptions inline");
        }
        let pagination = pagination_from(query.page, query.per_page);
        Ok(billing::list_subscriptions(&self.pool, &pagination).await?)
    }

    pub async fn list_invoices(
        &self,
        query: &PageQuery,
    ) -> Result<PaginatedResult<Invoice>, ServiceError> {
        let pagination = pagination_from(query.page, query.per_page);
        Ok(billing::list_invoices(&self.pool, &pagination).await?)
    }

    pub async fn list_payments(
        &self,
        query: &PageQuery,
    ) -> Result<PaginatedResult<Payment>, ServiceError> {
        let pagination = pagination_from(query.page, query.per_page);
        Ok(billing::list_payments(&self.pool, &pagination).await?)
    }
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct AcceptOutcome {
    pub employer_id: Uuid,
    pub subscription_id: Option<Uuid>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn invoice_number_embeds_timestamp_and_employer() {
        let employer = Uuid::parse_str("550e8400-e29b-41d4-a716-446655440000").unwrap();
        let at = Utc.with_ymd_and_hms(2026, 3, 14, 9, 26, 53).unwrap();
        assert_eq!(invoice_number(employer, at), "INV-20260314092653-550e8400");
    }

    #[test]
    fn add_months_advances_by_plan_duration() {
        let start = Utc.with_ymd_and_hms(2026, 1, 15, 0, 0, 0).unwrap();
        let end = add_months(start, 3).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 4, 15, 0, 0, 0).unwrap());
    }

    #[test]
    fn add_months_clamps_end_of_month() {
        let start = Utc.with_ymd_and_hms(2026, 1, 31, 12, 0, 0).unwrap();
        let end = add_months(start, 1).unwrap();
        assert_eq!(end, Utc.with_ymd_and_hms(2026, 2, 28, 12, 0, 0).unwrap());
    }

    #[test]
    fn add_months_rejects_non_positive_duration() {
        let start = Utc::now();
        assert!(add_months(start, 0).is_err());
        assert!(add_months(start, -2).is_err());
    }
}
