use chrono::{DateTime, Utc};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{LedgerEntry, NewLedgerEntry, PaginatedResult, Pagination};

pub async fn append(
    conn: &mut PgConnection,
    entry: &NewLedgerEntry,
) -> Result<LedgerEntry, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        "INSERT INTO ledger_entries \
             (employer_id, employee_id, amount, kind, reference_note, payment_mode, \
              external_transaction_id, status, actor_id) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9) \
         RETURNING *",
    )
    .bind(entry.employer_id)
    .bind(entry.employee_id)
    .bind(entry.amount)
    .bind(&entry.kind)
    .bind(&entry.reference_note)
    .bind(&entry.payment_mode)
    .bind(&entry.external_transaction_id)
    .bind(&entry.status)
    .bind(entry.actor_id)
    .fetch_one(conn)
    .await
}

pub async fn find_by_id(
    conn: &mut PgConnection,
    id: Uuid,
) -> Result<Option<LedgerEntry>, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        "SELECT * FROM ledger_entries WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .fetch_optional(conn)
    .await
}

/// Resolves a `pending` entry to `success` or `failed`, optionally
/// appending a suffix to the reference note (rejection reason). Returns
/// `None` when the row is no longer pending, which the caller maps to a
/// state error.
pub async fn resolve_pending(
    conn: &mut PgConnection,
    id: Uuid,
    status: &str,
    note_suffix: Option<&str>,
) -> Result<Option<LedgerEntry>, sqlx::Error> {
    sqlx::query_as::<_, LedgerEntry>(
        "UPDATE ledger_entries SET \
             status = $2, \
             reference_note = CASE WHEN $3::text IS NULL THEN reference_note \
                 ELSE COALESCE(reference_note, '') || $3 END \
         WHERE id = $1 AND status = 'pending' AND deleted_at IS NULL \
         RETURNING *",
    )
    .bind(id)
    .bind(status)
    .bind(note_suffix)
    .fetch_optional(conn)
    .await
}

/// Corrections are new entries, never edits; removal is a soft-delete
/// mark so history stays reconcilable.
pub async fn soft_delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        "UPDATE ledger_entries SET deleted_at = CURRENT_TIMESTAMP \
         WHERE id = $1 AND deleted_at IS NULL",
    )
    .bind(id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

#[derive(Debug, Clone, Default)]
pub struct LedgerFilter {
    pub employer_id: Option<Uuid>,
    pub kind: Option<String>,
    pub from: Option<DateTime<Utc>>,
    pub to: Option<DateTime<Utc>>,
}

pub async fn list(
    pool: &PgPool,
    filter: &LedgerFilter,
    pagination: &Pagination,
) -> Result<PaginatedResult<LedgerEntry>, sqlx::Error> {
    let where_clause = "WHERE deleted_at IS NULL \
         AND ($1::uuid IS NULL OR employer_id = $1) \
         AND ($2::text IS NULL OR kind = $2) \
         AND ($3::timestamptz IS NULL OR created_at >= $3) \
         AND ($4::timestamptz IS NULL OR created_at <= $4)";

    let total: i64 = sqlx::query_scalar(&format!(
        "SELECT COUNT(*) FROM ledger_entries {}",
        where_clause
    ))
    .bind(filter.employer_id)
    .bind(&filter.kind)
    .bind(filter.from)
    .bind(filter.to)
    .fetch_one(pool)
    .await?;

    let items = sqlx::query_as::<_, LedgerEntry>(&format!(
        "SELECT * FROM ledger_entries {} ORDER BY created_at DESC LIMIT $5 OFFSET $6",
        where_clause
    ))
    .bind(filter.employer_id)
    .bind(&filter.kind)
    .bind(filter.from)
    .bind(filter.to)
    .bind(pagination.limit)
    .bind(pagination.offset)
    .fetch_all(pool)
    .await?;

    Ok(PaginatedResult::new(items, total, pagination))
}
