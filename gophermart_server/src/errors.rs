use actix_web::{error::ResponseError, http::StatusCode, HttpResponse};
use gophermart_engine::traits::LedgerError;
use serde_json::json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("wrong request format")]
    InvalidRequestBody,
    #[error("wrong order number format")]
    InvalidOrderNumber,
    #[error("incorrect user credentials")]
    Unauthorized,
    #[error("login already in use")]
    LoginTaken,
    #[error("order already uploaded by different user")]
    OrderConflict,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error("could not hash the password")]
    PasswordHash,
    #[error("An I/O error happened in the server. {0}")]
    IOError(#[from] std::io::Error),
    #[error("Invalid server configuration. {0}")]
    ConfigurationError(String),
    #[error("internal storage fault: {0}")]
    StorageFault(String),
}

impl ResponseError for ServerError {
    fn status_code(&self) -> StatusCode {
        match *self {
            Self::InvalidRequestBody => StatusCode::BAD_REQUEST,
            Self::InvalidOrderNumber => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::LoginTaken | Self::OrderConflict => StatusCode::CONFLICT,
            Self::InsufficientFunds => StatusCode::PAYMENT_REQUIRED,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        HttpResponse::build(status).json(json!({ "message": self.to_string(), "status": status.as_u16() }))
    }
}

/// Carries the ledger's typed errors to their HTTP status codes. The two "empty listing" signals and the
/// idempotent re-upload are not errors at the HTTP level; handlers intercept those before converting.
impl From<LedgerError> for ServerError {
    fn from(e: LedgerError) -> Self {
        match e {
            LedgerError::LoginTaken => Self::LoginTaken,
            LedgerError::NoSuchUser => Self::Unauthorized,
            LedgerError::OrderOwnedByDifferentUser => Self::OrderConflict,
            LedgerError::InsufficientFunds => Self::InsufficientFunds,
            LedgerError::NonPositiveWithdrawal => Self::InvalidRequestBody,
            e => Self::StorageFault(e.to_string()),
        }
    }
}
