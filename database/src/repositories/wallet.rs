use rust_decimal::Decimal;
use sqlx::PgConnection;
use uuid::Uuid;

use crate::models::Wallet;

/// Lazily creates a zero-seeded wallet if the employer does not have one
/// yet, then takes the row lock. Serializes concurrent mutations of the
/// same employer's wallet for the lifetime of the enclosing transaction.
pub async fn lock_or_create(
    conn: &mut PgConnection,
    employer_id: Uuid,
) -> Result<Wallet, sqlx::Error> {
    sqlx::query(
        "INSERT INTO wallets (employer_id, balance, total_added, total_used) \
         VALUES ($1, 0, 0, 0) ON CONFLICT (employer_id) DO NOTHING",
    )
    .bind(employer_id)
    .execute(&mut *conn)
    .await?;

    sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE employer_id = $1 FOR UPDATE")
        .bind(employer_id)
        .fetch_one(conn)
        .await
}

/// Upsert credit: increments balance and lifetime total_added, creating
/// the wallet seeded at the amount when absent.
pub async fn credit(
    conn: &mut PgConnection,
    employer_id: Uuid,
    amount: Decimal,
) -> Result<Wallet, sqlx::Error> {
    sqlx::query_as::<_, Wallet>(
        "INSERT INTO wallets (employer_id, balance, total_added, total_used) \
         VALUES ($1, $2, $2, 0) \
         ON CONFLICT (employer_id) DO UPDATE SET \
             balance = wallets.balance + EXCLUDED.balance, \
             total_added = wallets.total_added + EXCLUDED.total_added, \
             updated_at = CURRENT_TIMESTAMP \
         RETURNING *",
    )
    .bind(employer_id)
    .bind(amount)
    .fetch_one(conn)
    .await
}

/// Debit: decrements balance and increments lifetime total_used. The
/// non-negative floor is enforced by the service layer against a locked
/// read before calling this.
pub async fn debit(
    conn: &mut PgConnection,
    employer_id: Uuid,
    amount: Decimal,
) -> Result<Wallet, sqlx::Error> {
    sqlx::query_as::<_, Wallet>(
        "UPDATE wallets SET \
             balance = balance - $2, \
             total_used = total_used + $2, \
             updated_at = CURRENT_TIMESTAMP \
         WHERE employer_id = $1 \
         RETURNING *",
    )
    .bind(employer_id)
    .bind(amount)
    .fetch_one(conn)
    .await
}
