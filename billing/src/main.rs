use std::env;
use std::sync::Arc;

use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use sqlx::PgPool;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use worklane_billing::handlers;
use worklane_billing::services::gateway::{MockGateway, PaymentGateway};
use worklane_billing::services::sweep;
use worklane_database::{Database, DatabaseConfig};

#[actix_web::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Structured logging, RUST_LOG-controlled
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(fmt::layer())
        .init();

    // Load environment variables
    dotenv::dotenv().ok();

    let port = env::var("BILLING_SERVICE_PORT")
        .unwrap_or_else(|_| "3011".to_string())
        .parse::<u16>()
        .unwrap_or(3011);

    // Database connection - opened once, injected everywhere
    tracing::info!("[Billing Service] Connecting to database...");
    let database = Database::new(&DatabaseConfig::from_env()).await?;
    database.migrate().await?;
    let pool = database.pool().clone();
    tracing::info!("[Billing Service] Database connection established");

    // Payment gateway boundary; the mock stands in for the real
    // processor.
    let gateway: Arc<dyn PaymentGateway> = Arc::new(MockGateway::new());

    // Daily expiry sweep, independent of request handling
    let sweeper = sweep::spawn_scheduler(pool.clone());

    tracing::info!("[Billing Service] Starting on port {}", port);
    HttpServer::new(move || {
        let cors = Cors::default()
            .allow_any_origin()
            .allow_any_method()
            .allow_any_header();

        // The /api/billing catch-all scope must be configured last so
        // the more specific credit/drawdown/plan scopes match first.
        App::new()
            .app_data(web::Data::new(pool.clone()))
            .app_data(web::Data::new(gateway.clone()))
            .wrap(cors)
            .wrap(TracingLogger::default())
            .route("/health", web::get().to(health_check))
            .configure(handlers::credits::configure_credit_routes)
            .configure(handlers::drawdown::configure_drawdown_routes)
            .configure(handlers::plans::configure_plan_routes)
            .configure(handlers::subscriptions::configure_subscription_routes)
    })
    .bind(("0.0.0.0", port))?
    .run()
    .await?;

    sweeper.abort();
    Ok(())
}

async fn health_check(pool: web::Data<PgPool>) -> actix_web::Result<web::Json<serde_json::Value>> {
    let db_status = match sqlx::query("SELECT 1 as test").fetch_one(pool.get_ref()).await {
        Ok(_) => "connected",
        Err(e) => {
            tracing::error!("[Billing Service] Database health check failed: {}", e);
            "disconnected"
        }
    };

    Ok(web::Json(serde_json::json!({
        "status": "healthy",
        "service": "billing-service",
        "database": db_status,
        "timestamp": chrono::Utc::now()
    })))
}
