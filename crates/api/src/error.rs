//! JSON error responses.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use invoicer_core::invoice::InvoiceError;
use invoicer_core::tax::ClassificationError;
use invoicer_db::InvoiceRepoError;
use invoicer_shared::AppError;
use sea_orm::DbErr;
use serde::Serialize;
use tracing::error;

/// Error returned by route handlers.
///
/// Serializes as `{"error": "<CODE>", "message": "..."}` with the status code
/// of the wrapped [`AppError`]. Domain errors keep their specific code, such
/// as `INVOICE_NOT_FOUND`.
#[derive(Debug)]
pub struct ApiError {
    inner: AppError,
    code: &'static str,
}

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

impl ApiError {
    /// Shorthand for a validation failure.
    pub fn validation(message: impl Into<String>) -> Self {
        AppError::Validation(message.into()).into()
    }

    /// The wrapped application error.
    #[must_use]
    pub const fn inner(&self) -> &AppError {
        &self.inner
    }

    /// Error code sent to the client.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        self.code
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.inner.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        // Storage details stay in the logs.
        let message = match &self.inner {
            AppError::Database(detail) | AppError::Internal(detail) => {
                error!(error = %detail, code = self.code, "Request failed");
                "An error occurred".to_string()
            }
            AppError::NotFound(msg)
            | AppError::Validation(msg)
            | AppError::InsufficientStock(msg)
            | AppError::BusinessRule(msg)
            | AppError::Conflict(msg) => msg.clone(),
        };

        let body = ErrorBody {
            error: self.code,
            message,
        };
        (status, Json(body)).into_response()
    }
}

impl From<AppError> for ApiError {
    fn from(inner: AppError) -> Self {
        let code = inner.error_code();
        Self { inner, code }
    }
}

impl From<InvoiceError> for ApiError {
    fn from(err: InvoiceError) -> Self {
        let code = err.error_code();
        Self {
            inner: err.into(),
            code,
        }
    }
}

impl From<InvoiceRepoError> for ApiError {
    fn from(err: InvoiceRepoError) -> Self {
        match err {
            InvoiceRepoError::Invoice(err) => err.into(),
            InvoiceRepoError::Database(err) => err.into(),
        }
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        AppError::Database(err.to_string()).into()
    }
}

impl From<ClassificationError> for ApiError {
    fn from(err: ClassificationError) -> Self {
        AppError::Validation(err.to_string()).into()
    }
}
