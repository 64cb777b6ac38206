//! Boundary queries against the rest of the platform: employers,
//! employee sub-wallets, vendors, bills, and company signup requests.

use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::{Bill, CompanyRequest, Employee, Employer, Vendor};

pub async fn employer_exists(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM employers WHERE id = $1")
        .bind(id)
        .fetch_one(conn)
        .await?;
    Ok(count > 0)
}

/// Membership check for bulk operations: returns the subset of `ids`
/// that exist, in no particular order.
pub async fn existing_employer_ids(
    conn: &mut PgConnection,
    ids: &[Uuid],
) -> Result<Vec<Uuid>, sqlx::Error> {
    sqlx::query_scalar("SELECT id FROM employers WHERE id = ANY($1)")
        .bind(ids)
        .fetch_all(conn)
        .await
}

pub async fn insert_employer(
    conn: &mut PgConnection,
    company_name: &str,
    contact_email: Option<&str>,
) -> Result<Employer, sqlx::Error> {
    sqlx::query_as::<_, Employer>(
        "INSERT INTO employers (company_name, contact_email, status) \
         VALUES ($1, $2, 'active') \
         RETURNING *",
    )
    .bind(company_name)
    .bind(contact_email)
    .fetch_one(conn)
    .await
}

pub async fn set_employer_plan_name(
    conn: &mut PgConnection,
    employer_id: Uuid,
    plan_name: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE employers SET plan_name = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
    )
    .bind(employer_id)
    .bind(plan_name)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn set_employer_status(
    conn: &mut PgConnection,
    employer_id: Uuid,
    status: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE employers SET status = $2, updated_at = CURRENT_TIMESTAMP WHERE id = $1")
        .bind(employer_id)
        .bind(status)
        .execute(conn)
        .await?;
    Ok(())
}

/// Row-locking read of an employee: their sub-wallet serializes the same
/// way the employer wallet does.
pub async fn lock_employee(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<Employee>, sqlx::Error> {
    sqlx::query_as::<_, Employee>("SELECT * FROM employees WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn credit_employee(
    conn: &mut PgConnection,
    id: Uuid,
    amount: Decimal,
) -> Result<Employee, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "UPDATE employees SET credit_balance = credit_balance + $2, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(amount)
    .fetch_one(conn)
    .await
}

pub async fn debit_employee(
    conn: &mut PgConnection,
    id: Uuid,
    amount: Decimal,
) -> Result<Employee, sqlx::Error> {
    sqlx::query_as::<_, Employee>(
        "UPDATE employees SET credit_balance = credit_balance - $2, updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(amount)
    .fetch_one(conn)
    .await
}

pub async fn find_vendor(conn: &mut PgConnection, id: Uuid) -> Result<Option<Vendor>, sqlx::Error> {
    sqlx::query_as::<_, Vendor>("SELECT * FROM vendors WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn mark_vendor_settled(conn: &mut PgConnection, id: Uuid) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE vendors SET payment_status = 'settled', updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1",
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}

pub async fn find_bill(conn: &mut PgConnection, id: Uuid) -> Result<Option<Bill>, sqlx::Error> {
    sqlx::query_as::<_, Bill>("SELECT * FROM bills WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn mark_bill_paid(conn: &mut PgConnection, id: Uuid) -> Result<Bill, sqlx::Error> {
    sqlx::query_as::<_, Bill>(
        "UPDATE bills SET status = 'paid', updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .fetch_one(conn)
    .await
}

pub async fn find_company_request(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<CompanyRequest>, sqlx::Error> {
    sqlx::query_as::<_, CompanyRequest>("SELECT * FROM company_requests WHERE id = $1 FOR UPDATE")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn mark_request_accepted(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<(), sqlx::Error> {
    sqlx::query(
        "UPDATE company_requests SET status = 'accepted', updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1",
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(())
}
