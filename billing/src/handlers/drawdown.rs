use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use worklane_models::wallet::{
    AssignCreditRequest, PayBillRequest, PaySalaryRequest, PayVendorRequest,
};

use crate::errors::ServiceError;
use crate::services::drawdown::DrawdownService;

pub async fn pay_salary(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    request: web::Json<PaySalaryRequest>,
) -> Result<HttpResponse, ServiceError> {
    request.validate()?;
    let result = DrawdownService::new(pool.get_ref().clone())
        .pay_salary(path.into_inner(), &request)
        .await?;
    Ok(HttpResponse::Created().json(result))
}

pub async fn pay_vendor(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    request: web::Json<PayVendorRequest>,
) -> Result<HttpResponse, ServiceError> {
    request.validate()?;
    let result = DrawdownService::new(pool.get_ref().clone())
        .pay_vendor(path.into_inner(), &request)
        .await?;
    Ok(HttpResponse::Created().json(result))
}

pub async fn assign_credit(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    request: web::Json<AssignCreditRequest>,
) -> Result<HttpResponse, ServiceError> {
    request.validate()?;
    let result = DrawdownService::new(pool.get_ref().clone())
        .assign_credit_to_employee(path.into_inner(), &request)
        .await?;
    Ok(HttpResponse::Created().json(result))
}

pub async fn pay_bill(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    request: web::Json<PayBillRequest>,
) -> Result<HttpResponse, ServiceError> {
    let result = DrawdownService::new(pool.get_ref().clone())
        .pay_bill(path.into_inner(), &request)
        .await?;
    Ok(HttpResponse::Created().json(result))
}

pub fn configure_drawdown_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/billing/employees/{employee_id}")
            .route("/pay-salary", web::post().to(pay_salary))
            .route("/credit", web::post().to(assign_credit))
            .route("/pay-bill", web::post().to(pay_bill)),
    );
    cfg.route(
        "/api/billing/vendors/{vendor_id}/pay",
        web::post().to(pay_vendor),
    );
}
