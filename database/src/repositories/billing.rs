use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Invoice, PaginatedResult, Pagination, Payment, Subscription};

pub async fn find_subscription(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<Subscription>, sqlx::Error> {
    sqlx::query_as::<_, Subscription>("SELECT * FROM subscriptions WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

/// Supersession: force-expires whatever is currently active for the
/// employer so a new subscription can take its place.
pub async fn expire_active_for_employer(
    conn: &mut PgConnection,
    employer_id: Uuid,
) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE subscriptions SET status = 'expired', updated_at = CURRENT_TIMESTAMP \
         WHERE employer_id = $1 AND status = 'active'",
    )
    .bind(employer_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn insert_subscription(
    conn: &mut PgConnection,
    employer_id: Uuid,
    plan_id: Uuid,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    status: &str,
    auto_renew: bool,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        "INSERT INTO subscriptions (employer_id, plan_id, start_date, end_date, status, auto_renew) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING *",
    )
    .bind(employer_id)
    .bind(plan_id)
    .bind(start_date)
    .bind(end_date)
    .bind(status)
    .bind(auto_renew)
    .fetch_one(conn)
    .await
}

/// Flips a subscription to `active`, restamping its window. The end date
/// is computed by the caller from the plan's duration at activation time.
pub async fn activate_subscription(
    conn: &mut PgConnection,
    id: Uuid,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
) -> Result<Subscription, sqlx::Error> {
    sqlx::query_as::<_, Subscription>(
        "UPDATE subscriptions SET \
             status = 'active', start_date = $2, end_date = $3, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(start_date)
    .bind(end_date)
    .fetch_one(conn)
    .await
}

/// Bulk transition of lapsed subscriptions. The predicate naturally
/// excludes anything activated after `now`, so the sweep is safe to run
/// concurrently with purchase/activation paths, and idempotent.
pub async fn expire_lapsed(pool: &PgPool) -> Result<u64, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE subscriptions SET status = 'expired', updated_at = CURRENT_TIMESTAMP \
         WHERE status = 'active' AND end_date < CURRENT_TIMESTAMP",
    )
    .execute(pool)
    .await?;
    Ok(result.rows_affected())
}

#[allow(clippy::too_many_arguments)]
pub async fn insert_invoice(
    conn: &mut PgConnection,
    invoice_number: &str,
    employer_id: Uuid,
    subscription_id: Option<Uuid>,
    plan_id: Uuid,
    amount: Decimal,
    tax_amount: Decimal,
    due_date: DateTime<Utc>,
    paid_date: Option<DateTime<Utc>>,
    status: &str,
    notes: Option<&str>,
) -> Result<Invoice, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(
        "INSERT INTO invoices \
             (invoice_number, employer_id, subscription_id, plan_id, amount, tax_amount, \
              total_amount, due_date, paid_date, status, notes) \
         VALUES ($1, $2, $3, $4, $5, $6, $5 + $6, $7, $8, $9, $10) \
         RETURNING *",
    )
    .bind(invoice_number)
    .bind(employer_id)
    .bind(subscription_id)
    .bind(plan_id)
    .bind(amount)
    .bind(tax_amount)
    .bind(due_date)
    .bind(paid_date)
    .bind(status)
    .bind(notes)
    .fetch_one(conn)
    .await
}

pub async fn find_invoice_for_subscription(
    conn: &mut PgConnection,
    subscription_id: Uuid,
) -> Result<Option<Invoice>, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(
        "SELECT * FROM invoices WHERE subscription_id = $1 ORDER BY created_at DESC LIMIT 1",
    )
    .bind(subscription_id)
    .fetch_optional(conn)
    .await
}

pub async fn mark_invoice_paid(
    conn: &mut PgConnection,
    invoice_id: Uuid,
    paid_date: DateTime<Utc>,
) -> Result<Invoice, sqlx::Error> {
    sqlx::query_as::<_, Invoice>(
        "UPDATE invoices SET status = 'paid', paid_date = $2, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(invoice_id)
    .bind(paid_date)
    .fetch_one(conn)
    .await
}

pub async fn insert_payment(
    conn: &mut PgConnection,
    invoice_id: Uuid,
    employer_id: Uuid,
    amount: Decimal,
    payment_method: &str,
    transaction_id: Option<&str>,
    status: &str,
) -> Result<Payment, sqlx::Error> {
    sqlx::query_as::<_, Payment>(
        "INSERT INTO payments \
             (invoice_id, employer_id, amount, payment_method, transaction_id, status, payment_date) \
         VALUES ($1, $2, $3, $4, $5, $6, CURRENT_TIMESTAMP) \
         RETURNING *",
    )
    .bind(invoice_id)
    .bind(employer_id)
    .bind(amount)
    .bind(payment_method)
    .bind(transaction_id)
    .bind(status)
    .fetch_one(conn)
    .await
}

pub async fn successful_payment_exists(
    conn: &mut PgConnection,
    invoice_id: Uuid,
) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM payments WHERE invoice_id = $1 AND status = 'success'",
    )
    .bind(invoice_id)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

pub async fn list_subscriptions(
    pool: &PgPool,
    pagination: &Pagination,
) -> Result<PaginatedResult<Subscription>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions")
        .fetch_one(pool)
        .await?;
    let items = sqlx::query_as::<_, Subscription>(
        "SELECT * FROM subscriptions ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(pagination.limit)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;
    Ok(PaginatedResult::new(items, total, pagination))
}

pub async fn list_invoices(
    pool: &PgPool,
    pagination: &Pagination,
) -> Result<PaginatedResult<Invoice>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM invoices")
        .fetch_one(pool)
        .await?;
    let items = sqlx::query_as::<_, Invoice>(
        "SELECT * FROM invoices ORDER BY created_at DESC LIMIT $1 OFFSET $2",
    )
    .bind(pagination.limit)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;
    Ok(PaginatedResult::new(items, total, pagination))
}

pub async fn list_payments(
    pool: &PgPool,
    pagination: &Pagination,
) -> Result<PaginatedResult<Payment>, sqlx::Error> {
    let total: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM payments")
        .fetch_one(pool)
        .await?;
    let items = sqlx::query_as::<_, Payment>(
        "SELECT * FROM payments ORDER BY payment_date DESC LIMIT $1 OFFSET $2",
    )
    .bind(pagination.limit)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;
    Ok(PaginatedResult::new(items, total, pagination))
}
