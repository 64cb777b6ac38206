use rust_decimal::Decimal;
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

use crate::models::{Plan, PlanChanges};

pub async fn insert(
    conn: &mut PgConnection,
    name: &str,
    price: Decimal,
    duration_months: i32,
    max_employees: i32,
    max_jobs: i32,
    features: Option<&serde_json::Value>,
    is_active: bool,
) -> Result<Plan, sqlx::Error> {
    sqlx::query_as::<_, Plan>(
        "INSERT INTO plans (name, price, duration_months, max_employees, max_jobs, features, is_active) \
         VALUES ($1, $2, $3, $4, $5, $6, $7) \
         RETURNING *",
    )
    .bind(name)
    .bind(price)
    .bind(duration_months)
    .bind(max_employees)
    .bind(max_jobs)
    .bind(features)
    .bind(is_active)
    .fetch_one(conn)
    .await
}

pub async fn find_by_id(conn: &mut PgConnection, id: Uuid) -> Result<Option<Plan>, sqlx::Error> {
    sqlx::query_as::<_, Plan>("SELECT * FROM plans WHERE id = $1")
        .bind(id)
        .fetch_optional(conn)
        .await
}

pub async fn list(pool: &PgPool, only_active: bool) -> Result<Vec<Plan>, sqlx::Error> {
    sqlx::query_as::<_, Plan>(
        "SELECT * FROM plans WHERE ($1 = FALSE OR is_active = TRUE) ORDER BY price ASC",
    )
    .bind(only_active)
    .fetch_all(pool)
    .await
}

/// Applies a typed partial update; absent fields keep their value. The
/// statement shape is fixed, never built from strings.
pub async fn update(
    conn: &mut PgConnection,
    id: Uuid,
    changes: &PlanChanges,
) -> Result<Option<Plan>, sqlx::Error> {
    sqlx::query_as::<_, Plan>(
        "UPDATE plans SET \
             name = COALESCE($2, name), \
             price = COALESCE($3, price), \
             duration_months = COALESCE($4, duration_months), \
             max_employees = COALESCE($5, max_employees), \
             max_jobs = COALESCE($6, max_jobs), \
             features = COALESCE($7, features), \
             is_active = COALESCE($8, is_active), \
             updated_at = CURRENT_TIMESTAMP \
         WHERE id = $1 \
         RETURNING *",
    )
    .bind(id)
    .bind(&changes.name)
    .bind(changes.price)
    .bind(changes.duration_months)
    .bind(changes.max_employees)
    .bind(changes.max_jobs)
    .bind(&changes.features)
    .bind(changes.is_active)
    .fetch_optional(conn)
    .await
}

pub async fn delete(conn: &mut PgConnection, id: Uuid) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM plans WHERE id = $1")
        .bind(id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Number of live subscriptions still pointing at this plan; a plan with
/// any cannot be deleted, only deactivated.
pub async fn active_subscription_count(
    conn: &mut PgConnection,
    plan_id: Uuid,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE plan_id = $1 AND status = 'active'")
        .bind(plan_id)
        .fetch_one(conn)
        .await
}
