use std::sync::Arc;

use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use worklane_models::billing::{AssignPlanRequest, PageQuery, PurchasePlanRequest};

use crate::errors::ServiceError;
use crate::services::gateway::PaymentGateway;
use crate::services::subscription::SubscriptionService;

fn service(
    pool: &web::Data<PgPool>,
    gateway: &web::Data<Arc<dyn PaymentGateway>>,
) -> SubscriptionService {
    SubscriptionService::new(pool.get_ref().clone(), gateway.get_ref().clone())
}

pub async fn purchase_plan(
    pool: web::Data<PgPool>,
    gateway: web::Data<Arc<dyn PaymentGateway>>,
    request: web::Json<PurchasePlanRequest>,
) -> Result<HttpResponse, ServiceError> {
    request.validate()?;
    let result = service(&pool, &gateway).purchase_plan(&request).await?;
    Ok(HttpResponse::Created().json(result))
}

pub async fn assign_plan(
    pool: web::Data<PgPool>,
    gateway: web::Data<Arc<dyn PaymentGateway>>,
    path: web::Path<Uuid>,
    request: web::Json<AssignPlanRequest>,
) -> Result<HttpResponse, ServiceError> {
    let subscription = service(&pool, &gateway)
        .assign_plan_to_company(path.into_inner(), &request)
        .await?;
    Ok(HttpResponse::Created().json(subscription))
}

pub async fn activate_subscription(
    pool: web::Data<PgPool>,
    gateway: web::Data<Arc<dyn PaymentGateway>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let subscription = service(&pool, &gateway)
        .activate_subscription(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(subscription))
}

pub async fn accept_company_request(
    pool: web::Data<PgPool>,
    gateway: web::Data<Arc<dyn PaymentGateway>>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let outcome = service(&pool, &gateway)
        .accept_company_request(path.into_inner())
        .await?;
    Ok(HttpResponse::Created().json(outcome))
}

pub async fn list_subscriptions(
    pool: web::Data<PgPool>,
    gateway: web::Data<Arc<dyn PaymentGateway>>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ServiceError> {
    let page = service(&pool, &gateway).list_subscriptions(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn list_invoices(
    pool: web::Data<PgPool>,
    gateway: web::Data<Arc<dyn PaymentGateway>>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ServiceError> {
    let page = service(&pool, &gateway).list_invoices(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn list_payments(
    pool: web::Data<PgPool>,
    gateway: web::Data<Arc<dyn PaymentGateway>>,
    query: web::Query<PageQuery>,
) -> Result<HttpResponse, ServiceError> {
    let page = service(&pool, &gateway).list_payments(&query).await?;
    Ok(HttpResponse::Ok().json(page))
}

pub fn configure_subscription_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/billing")
            .route("/purchase-plan", web::post().to(purchase_plan))
            .route("/companies/{employer_id}/assign-plan", web::post().to(assign_plan))
            .route(
                "/subscriptions/{subscription_id}/activate",
                web::post().to(activate_subscription),
            )
            .route(
                "/company-requests/{request_id}/accept",
                web::post().to(accept_company_request),
            )
            .route("/subscriptions", web::get().to(list_subscriptions))
            .route("/invoices", web::get().to(list_invoices))
            .route("/payments", web::get().to(list_payments)),
    );
}
