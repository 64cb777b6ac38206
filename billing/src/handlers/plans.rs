use actix_web::{web, HttpResponse};
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use worklane_models::billing::{CreatePlanRequest, UpdatePlanRequest};

use crate::errors::ServiceError;
use crate::services::plans::PlanService;

#[derive(Debug, Default, Deserialize)]
pub struct PlanListQuery {
    pub include_inactive: Option<bool>,
}

pub async fn create_plan(
    pool: web::Data<PgPool>,
    request: web::Json<CreatePlanRequest>,
) -> Result<HttpResponse, ServiceError> {
    request.validate()?;
    let plan = PlanService::new(pool.get_ref().clone())
        .create_plan(&request)
        .await?;
    Ok(HttpResponse::Created().json(plan))
}

pub async fn update_plan(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    request: web::Json<UpdatePlanRequest>,
) -> Result<HttpResponse, ServiceError> {
    request.validate()?;
    let plan = PlanService::new(pool.get_ref().clone())
        .update_plan(path.into_inner(), &request)
        .await?;
    Ok(HttpResponse::Ok().json(plan))
}

pub async fn delete_plan(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    PlanService::new(pool.get_ref().clone())
        .delete_plan(path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub async fn get_plan(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    let plan = PlanService::new(pool.get_ref().clone())
        .get_plan(path.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(plan))
}

pub async fn list_plans(
    pool: web::Data<PgPool>,
    query: web::Query<PlanListQuery>,
) -> Result<HttpResponse, ServiceError> {
    let only_active = !query.include_inactive.unwrap_or(false);
    let plans = PlanService::new(pool.get_ref().clone())
        .list_plans(only_active)
        .await?;
    Ok(HttpResponse::Ok().json(plans))
}

pub fn configure_plan_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/billing/plans")
            .route("", web::get().to(list_plans))
            .route("", web::post().to(create_plan))
            .route("/{plan_id}", web::get().to(get_plan))
            .route("/{plan_id}", web::put().to(update_plan))
            .route("/{plan_id}", web::delete().to(delete_plan)),
    );
}
