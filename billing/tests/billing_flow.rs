//! End-to-end service tests against a live Postgres.
//!
//! All tests here are `#[ignore]` so the default test run passes without
//! a database; run them with `cargo test -- --ignored` and DATABASE_URL
//! pointing at a scratch database.

use std::sync::Arc;

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use worklane_billing::errors::ServiceError;
use worklane_billing::services::credit::CreditService;
use worklane_billing::services::drawdown::DrawdownService;
use worklane_billing::services::gateway::MockGateway;
use worklane_billing::services::subscription::SubscriptionService;
use worklane_billing::services::sweep;
use worklane_database::models::Wallet;
use worklane_database::{Database, DatabaseConfig};
use worklane_models::billing::PurchasePlanRequest;
use worklane_models::wallet::{
    AddCreditRequest, AssignCreditRequest, BulkAddCreditRequest, PaySalaryRequest,
};

async fn setup() -> PgPool {
    dotenv::dotenv().ok();
    let db = Database::new(&DatabaseConfig::from_env())
        .await
        .expect("database connection");
    db.migrate().await.expect("migrations");
    db.pool().clone()
}

async fn seed_employer(pool: &PgPool) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO employers (company_name, status) VALUES ($1, 'active') RETURNING id",
    )
    .bind(format!("acme-{}", Uuid::new_v4().simple()))
    .fetch_one(pool)
    .await
    .expect("seed employer")
}

async fn seed_employee(pool: &PgPool, employer_id: Uuid) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO employees (employer_id, full_name) VALUES ($1, 'Pat Doe') RETURNING id",
    )
    .bind(employer_id)
    .fetch_one(pool)
    .await
    .expect("seed employee")
}

async fn seed_plan(pool: &PgPool, price: Decimal, duration_months: i32) -> Uuid {
    sqlx::query_scalar(
        "INSERT INTO plans (name, price, duration_months, max_employees, max_jobs) \
         VALUES ($1, $2, $3, 50, 10) RETURNING id",
    )
    .bind(format!("plan-{}", Uuid::new_v4().simple()))
    .bind(price)
    .bind(duration_months)
    .fetch_one(pool)
    .await
    .expect("seed plan")
}

async fn wallet_of(pool: &PgPool, employer_id: Uuid) -> Option<Wallet> {
    sqlx::query_as::<_, Wallet>("SELECT * FROM wallets WHERE employer_id = $1")
        .bind(employer_id)
        .fetch_optional(pool)
        .await
        .expect("wallet read")
}

fn add_credit(employer_id: Uuid, amount: Decimal) -> AddCreditRequest {
    AddCreditRequest {
        employer_id,
        amount,
        reference_note: Some("top-up".to_string()),
        payment_mode: None,
        transaction_id: None,
        actor_id: None,
    }
}

#[tokio::test]
#[ignore]
async fn wallet_stays_reconcilable_across_credit_and_drawdown() {
    let pool = setup().await;
    let employer = seed_employer(&pool).await;
    let employee = seed_employee(&pool, employer).await;

    let credits = CreditService::new(pool.clone());
    let result = credits
        .add_credit_single(&add_credit(employer, Decimal::new(50000, 2)))
        .await
        .unwrap();
    assert_eq!(result.new_balance, Decimal::new(50000, 2));

    let drawdown = DrawdownService::new(pool.clone());
    drawdown
        .pay_salary(
            employee,
            &PaySalaryRequest {
                employer_id: employer,
                amount: Decimal::new(30000, 2),
                period: "2026-08".to_string(),
                notes: None,
                actor_id: None,
            },
        )
        .await
        .unwrap();

    let wallet = wallet_of(&pool, employer).await.unwrap();
    assert_eq!(wallet.balance, Decimal::new(20000, 2));
    assert_eq!(wallet.total_added, Decimal::new(50000, 2));
    assert_eq!(wallet.total_used, Decimal::new(30000, 2));
    assert_eq!(wallet.balance, wallet.total_added - wallet.total_used);

    // Salary pays into the employee sub-wallet and leaves paired entries.
    let sub_balance: Decimal =
        sqlx::query_scalar("SELECT credit_balance FROM employees WHERE id = $1")
            .bind(employee)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(sub_balance, Decimal::new(30000, 2));
    let entries: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM ledger_entries WHERE employer_id = $1 \
         AND kind IN ('salary', 'salary_credit')",
    )
    .bind(employer)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(entries, 2);

    // Assigning more than the remaining balance is rejected with no
    // state change.
    let err = drawdown
        .assign_credit_to_employee(
            employee,
            &AssignCreditRequest {
                employer_id: employer,
                amount: Decimal::new(25000, 2),
                reason: None,
                actor_id: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::InsufficientFunds(_)));
    let wallet = wallet_of(&pool, employer).await.unwrap();
    assert_eq!(wallet.balance, Decimal::new(20000, 2));
}

#[tokio::test]
#[ignore]
async fn bulk_add_is_all_or_nothing() {
    let pool = setup().await;
    let a = seed_employer(&pool).await;
    let b = seed_employer(&pool).await;
    let ghost = Uuid::new_v4();

    let err = CreditService::new(pool.clone())
        .add_credit_bulk(&BulkAddCreditRequest {
            employer_ids: vec![a, b, ghost],
            amount: Decimal::new(10000, 2),
            reference_note: None,
            payment_mode: None,
            transaction_id: None,
            actor_id: None,
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    assert!(wallet_of(&pool, a).await.is_none());
    assert!(wallet_of(&pool, b).await.is_none());
    let entries: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM ledger_entries WHERE employer_id = ANY($1)")
            .bind(vec![a, b])
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(entries, 0);
}

#[tokio::test]
#[ignore]
async fn pending_credit_request_resolves_once() {
    let pool = setup().await;
    let employer = seed_employer(&pool).await;
    let credits = CreditService::new(pool.clone());

    let entry = credits
        .request_credit(&worklane_models::wallet::RequestCreditRequest {
            employer_id: employer,
            amount: Decimal::new(15000, 2),
            reference_note: Some("monthly float".to_string()),
            payment_mode: Some("bank_transfer".to_string()),
            transaction_id: None,
        })
        .await
        .unwrap();
    assert_eq!(entry.status, "pending");
    assert!(wallet_of(&pool, employer).await.is_none());

    let approved = credits
        .approve_credit_request(entry.id, None)
        .await
        .unwrap();
    assert_eq!(approved.new_balance, Decimal::new(15000, 2));

    // A second resolution attempt is a state error.
    let err = credits
        .reject_credit_request(entry.id, "late", None)
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::State(_)));
}

#[tokio::test]
#[ignore]
async fn purchase_keeps_single_active_subscription() {
    let pool = setup().await;
    let employer = seed_employer(&pool).await;
    let plan_a = seed_plan(&pool, Decimal::new(100000, 2), 3).await;
    let plan_b = seed_plan(&pool, Decimal::new(200000, 2), 12).await;

    let service = SubscriptionService::new(pool.clone(), Arc::new(MockGateway::new()));
    let first = service
        .purchase_plan(&PurchasePlanRequest {
            employer_id: employer,
            plan_id: plan_a,
            payment_method: "card".to_string(),
        })
        .await
        .unwrap();
    let second = service
        .purchase_plan(&PurchasePlanRequest {
            employer_id: employer,
            plan_id: plan_b,
            payment_method: "card".to_string(),
        })
        .await
        .unwrap();
    assert_ne!(first.subscription_id, second.subscription_id);

    let active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM subscriptions WHERE employer_id = $1 AND status = 'active'",
    )
    .bind(employer)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(active, 1);

    // Invoice arithmetic and settlement for the surviving purchase.
    let (amount, tax, total, status): (Decimal, Decimal, Decimal, String) = sqlx::query_as(
        "SELECT amount, tax_amount, total_amount, status FROM invoices WHERE id = $1",
    )
    .bind(second.invoice_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(total, amount + tax);
    assert_eq!(status, "paid");
}

#[tokio::test]
#[ignore]
async fn declined_gateway_leaves_audit_but_no_subscription() {
    let pool = setup().await;
    let employer = seed_employer(&pool).await;
    let plan = seed_plan(&pool, Decimal::new(100000, 2), 3).await;

    let service = SubscriptionService::new(pool.clone(), Arc::new(MockGateway::declining()));
    let err = service
        .purchase_plan(&PurchasePlanRequest {
            employer_id: employer,
            plan_id: plan,
            payment_method: "card".to_string(),
        })
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::PaymentGateway(_)));

    let subs: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM subscriptions WHERE employer_id = $1")
        .bind(employer)
        .fetch_one(&pool)
        .await
        .unwrap();
    assert_eq!(subs, 0);
    let audit: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM ledger_entries WHERE employer_id = $1 AND status = 'failed'",
    )
    .bind(employer)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(audit, 1);
}

#[tokio::test]
#[ignore]
async fn expiry_sweep_is_idempotent() {
    let pool = setup().await;
    let employer = seed_employer(&pool).await;
    let plan = seed_plan(&pool, Decimal::new(100000, 2), 1).await;

    sqlx::query(
        "INSERT INTO subscriptions (employer_id, plan_id, start_date, end_date, status) \
         VALUES ($1, $2, CURRENT_TIMESTAMP - INTERVAL '2 months', \
                 CURRENT_TIMESTAMP - INTERVAL '1 month', 'active')",
    )
    .bind(employer)
    .bind(plan)
    .execute(&pool)
    .await
    .unwrap();

    let first = sweep::expire_lapsed(&pool).await.unwrap();
    assert!(first >= 1);
    let second = sweep::expire_lapsed(&pool).await.unwrap();
    assert_eq!(second, 0);

    let stale_active: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM subscriptions WHERE employer_id = $1 AND status = 'active'",
    )
    .bind(employer)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(stale_active, 0);
}

#[tokio::test]
#[ignore]
async fn repeated_activation_records_one_payment() {
    let pool = setup().await;
    let employer = seed_employer(&pool).await;
    let plan = seed_plan(&pool, Decimal::new(100000, 2), 3).await;

    let subscription_id: Uuid = sqlx::query_scalar(
        "INSERT INTO subscriptions (employer_id, plan_id, start_date, end_date, status) \
         VALUES ($1, $2, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP + INTERVAL '3 months', 'pending') \
         RETURNING id",
    )
    .bind(employer)
    .bind(plan)
    .fetch_one(&pool)
    .await
    .unwrap();

    let service = SubscriptionService::new(pool.clone(), Arc::new(MockGateway::new()));
    let first = service.activate_subscription(subscription_id).await.unwrap();
    assert_eq!(first.status, "active");
    let second = service.activate_subscription(subscription_id).await.unwrap();
    assert_eq!(second.id, first.id);
    assert_eq!(second.status, "active");

    let payments: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM payments WHERE employer_id = $1 AND status = 'success'",
    )
    .bind(employer)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(payments, 1);

    let invoices: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM invoices WHERE employer_id = $1 AND status = 'paid'",
    )
    .bind(employer)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(invoices, 1);
}

#[tokio::test]
#[ignore]
async fn accepted_request_provisions_employer_wallet_and_billing() {
    let pool = setup().await;
    let plan = seed_plan(&pool, Decimal::new(100000, 2), 12).await;

    let request_id: Uuid = sqlx::query_scalar(
        "INSERT INTO company_requests (company_name, contact_email, plan_id, payment_marked_paid) \
         VALUES ($1, 'ops@acme.test', $2, TRUE) RETURNING id",
    )
    .bind(format!("acme-{}", Uuid::new_v4().simple()))
    .bind(plan)
    .fetch_one(&pool)
    .await
    .unwrap();

    let service = SubscriptionService::new(pool.clone(), Arc::new(MockGateway::new()));
    let outcome = service.accept_company_request(request_id).await.unwrap();
    let subscription_id = outcome.subscription_id.unwrap();

    let wallet = wallet_of(&pool, outcome.employer_id).await.unwrap();
    assert_eq!(wallet.balance, Decimal::ZERO);

    let sub_status: String =
        sqlx::query_scalar("SELECT status FROM subscriptions WHERE id = $1")
            .bind(subscription_id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert_eq!(sub_status, "active");

    let (invoice_status, payments): (String, i64) = sqlx::query_as(
        "SELECT i.status, COUNT(p.id) FROM invoices i \
         LEFT JOIN payments p ON p.invoice_id = i.id AND p.status = 'success' \
         WHERE i.subscription_id = $1 GROUP BY i.status",
    )
    .bind(subscription_id)
    .fetch_one(&pool)
    .await
    .unwrap();
    assert_eq!(invoice_status, "paid");
    assert_eq!(payments, 1);

    // The whole bridge is one resolution; accepting again is a state error.
    let err = service.accept_company_request(request_id).await.unwrap_err();
    assert!(matches!(err, ServiceError::State(_)));
}

#[tokio::test]
#[ignore]
async fn only_unsettled_ledger_entries_can_be_voided() {
    let pool = setup().await;
    let employer = seed_employer(&pool).await;

    let credits = CreditService::new(pool.clone());
    let pending = credits
        .request_credit(&worklane_models::wallet::RequestCreditRequest {
            employer_id: employer,
            amount: Decimal::new(10000, 2),
            reference_note: None,
            payment_mode: None,
            transaction_id: None,
        })
        .await
        .unwrap();
    credits.void_ledger_entry(pending.id).await.unwrap();

    let deleted: Option<chrono::DateTime<chrono::Utc>> =
        sqlx::query_scalar("SELECT deleted_at FROM ledger_entries WHERE id = $1")
            .bind(pending.id)
            .fetch_one(&pool)
            .await
            .unwrap();
    assert!(deleted.is_some());

    // A voided entry is gone as far as resolution is concerned.
    let err = credits.approve_credit_request(pending.id, None).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)));

    credits
        .add_credit_single(&add_credit(employer, Decimal::new(5000, 2)))
        .await
        .unwrap();
    let settled: Uuid = sqlx::query_scalar(
        "SELECT id FROM ledger_entries WHERE employer_id = $1 AND status = 'success'",
    )
    .bind(employer)
    .fetch_one(&pool)
    .await
    .unwrap();
    let err = credits.void_ledger_entry(settled).await.unwrap_err();
    assert!(matches!(err, ServiceError::State(_)));
}
