use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use thiserror::Error;

/// Error taxonomy for the billing core. Every variant is caught at the
/// transaction boundary, triggers rollback, and maps to a structured HTTP
/// response with a machine-checkable kind.
#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    InsufficientFunds(String),
    #[error("{0}")]
    State(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    PaymentGateway(String),
    #[error("{0}")]
    Database(String),
    #[error("{0}")]
    Internal(String),
}

impl ServiceError {
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation_error",
            ServiceError::NotFound(_) => "not_found",
            ServiceError::InsufficientFunds(_) => "insufficient_funds",
            ServiceError::State(_) => "invalid_state",
            ServiceError::Conflict(_) => "conflict",
            ServiceError::PaymentGateway(_) => "payment_failed",
            ServiceError::Database(_) => "database_error",
            ServiceError::Internal(_) => "internal_error",
        }
    }

    /// Internal and database errors surface generically; the detail goes
    /// to the logs, not the caller.
    fn public_message(&self) -> String {
        match self {
            ServiceError::Database(_) => "A storage error occurred".to_string(),
            ServiceError::Internal(_) => "An internal error occurred".to_string(),
            other => other.to_string(),
        }
    }
}

impl ResponseError for ServiceError {
    fn status_code(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::InsufficientFunds(_) => StatusCode::UNPROCESSABLE_ENTITY,
            ServiceError::State(_) | ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::PaymentGateway(_) => StatusCode::PAYMENT_REQUIRED,
            ServiceError::Database(_) | ServiceError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn error_response(&self) -> HttpResponse {
        if matches!(self, ServiceError::Database(_) | ServiceError::Internal(_)) {
            tracing::error!("{}: {}", self.kind(), self);
        }
        HttpResponse::build(self.status_code()).json(serde_json::json!({
            "error": self.kind(),
            "message": self.public_message(),
        }))
    }
}

impl From<sqlx::Error> for ServiceError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => ServiceError::NotFound("record not found".to_string()),
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                ServiceError::Conflict(format!("duplicate record: {}", db.message()))
            }
            _ => ServiceError::Database(err.to_string()),
        }
    }
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::Validation(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_codes_follow_taxonomy() {
        assert_eq!(
            ServiceError::Validation("x".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ServiceError::NotFound("x".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            ServiceError::InsufficientFunds("x".into()).status_code(),
            StatusCode::UNPROCESSABLE_ENTITY
        );
        assert_eq!(
            ServiceError::State("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::Conflict("x".into()).status_code(),
            StatusCode::CONFLICT
        );
        assert_eq!(
            ServiceError::PaymentGateway("x".into()).status_code(),
            StatusCode::PAYMENT_REQUIRED
        );
    }

    #[test]
    fn internal_detail_stays_private() {
        let err = ServiceError::Database("connection refused on 10.0.0.3".into());
        assert_eq!(err.public_message(), "A storage error occurred");
        let err = ServiceError::InsufficientFunds("balance 200 below requested 250".into());
        assert_eq!(err.public_message(), "balance 200 below requested 250");
    }

    #[test]
    fn row_not_found_maps_to_not_found() {
        let err: ServiceError = sqlx::Error::RowNotFound.into();
        assert_eq!(err.kind(), "not_found");
    }
}
