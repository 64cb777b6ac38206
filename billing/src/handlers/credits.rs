use actix_web::{web, HttpResponse};
use sqlx::PgPool;
use uuid::Uuid;
use validator::Validate;

use worklane_models::wallet::{
    AddCreditRequest, ApproveCreditRequest, BulkAddCreditRequest, LedgerQuery, RejectCreditRequest,
    RequestCreditRequest,
};

use crate::errors::ServiceError;
use crate::services::credit::CreditService;

pub async fn add_credit(
    pool: web::Data<PgPool>,
    request: web::Json<AddCreditRequest>,
) -> Result<HttpResponse, ServiceError> {
    request.validate()?;
    let result = CreditService::new(pool.get_ref().clone())
        .add_credit_single(&request)
        .await?;
    Ok(HttpResponse::Created().json(result))
}

pub async fn bulk_add_credit(
    pool: web::Data<PgPool>,
    request: web::Json<BulkAddCreditRequest>,
) -> Result<HttpResponse, ServiceError> {
    request.validate()?;
    let result = CreditService::new(pool.get_ref().clone())
        .add_credit_bulk(&request)
        .await?;
    Ok(HttpResponse::Created().json(result))
}

#[derive(serde::Deserialize, Validate)]
pub struct EmployerCreditBody {
    #[validate(custom(function = "worklane_models::wallet::amount_strictly_positive"))]
    pub amount: rust_decimal::Decimal,
    #[validate(length(max = 500))]
    pub reference_note: Option<String>,
    pub payment_mode: Option<String>,
    pub transaction_id: Option<String>,
    pub actor_id: Option<Uuid>,
}

/// Admin single top-up addressed by employer path id; same semantics as
/// `/credits/add` with the id taken from the path.
pub async fn add_credit_for_employer(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    request: web::Json<EmployerCreditBody>,
) -> Result<HttpResponse, ServiceError> {
    request.validate()?;
    let body = request.into_inner();
    let req = AddCreditRequest {
        employer_id: path.into_inner(),
        amount: body.amount,
        reference_note: body.reference_note,
        payment_mode: body.payment_mode,
        transaction_id: body.transaction_id,
        actor_id: body.actor_id,
    };
    let result = CreditService::new(pool.get_ref().clone())
        .add_credit_single(&req)
        .await?;
    Ok(HttpResponse::Created().json(result))
}

pub async fn request_credit(
    pool: web::Data<PgPool>,
    request: web::Json<RequestCreditRequest>,
) -> Result<HttpResponse, ServiceError> {
    request.validate()?;
    let entry = CreditService::new(pool.get_ref().clone())
        .request_credit(&request)
        .await?;
    Ok(HttpResponse::Created().json(entry))
}

pub async fn approve_credit_request(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    request: web::Json<ApproveCreditRequest>,
) -> Result<HttpResponse, ServiceError> {
    let result = CreditService::new(pool.get_ref().clone())
        .approve_credit_request(path.into_inner(), request.actor_id)
        .await?;
    Ok(HttpResponse::Ok().json(result))
}

pub async fn reject_credit_request(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
    request: web::Json<RejectCreditRequest>,
) -> Result<HttpResponse, ServiceError> {
    request.validate()?;
    let entry = CreditService::new(pool.get_ref().clone())
        .reject_credit_request(path.into_inner(), &request.reason, request.actor_id)
        .await?;
    Ok(HttpResponse::Ok().json(entry))
}

pub async fn list_ledger(
    pool: web::Data<PgPool>,
    query: web::Query<LedgerQuery>,
) -> Result<HttpResponse, ServiceError> {
    let page = CreditService::new(pool.get_ref().clone())
        .list_ledger(&query)
        .await?;
    Ok(HttpResponse::Ok().json(page))
}

pub async fn void_ledger_entry(
    pool: web::Data<PgPool>,
    path: web::Path<Uuid>,
) -> Result<HttpResponse, ServiceError> {
    CreditService::new(pool.get_ref().clone())
        .void_ledger_entry(path.into_inner())
        .await?;
    Ok(HttpResponse::NoContent().finish())
}

pub fn configure_credit_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/billing/credits")
            .route("/add", web::post().to(add_credit))
            .route("/bulk-add", web::post().to(bulk_add_credit))
            .route("/request", web::post().to(request_credit))
            .route("/requests/{entry_id}/approve", web::post().to(approve_credit_request))
            .route("/requests/{entry_id}/reject", web::post().to(reject_credit_request))
            .route("/{entry_id}", web::delete().to(void_ledger_entry))
            .route("", web::get().to(list_ledger)),
    );
    cfg.route(
        "/api/billing/employers/{employer_id}/credit",
        web::post().to(add_credit_for_employer),
    );
}
