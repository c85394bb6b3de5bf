//! Error type shared by the invoicing repositories.

use invoicer_core::invoice::{ErrorKind, InvoiceError};
use invoicer_shared::AppError;
use sea_orm::{DbErr, SqlErr};

/// Errors returned by invoicing repositories.
#[derive(Debug, thiserror::Error)]
pub enum InvoiceRepoError {
    /// Domain rule or lookup failure.
    #[error(transparent)]
    Invoice(#[from] InvoiceError),

    /// Database error.
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
}

impl InvoiceRepoError {
    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Invoice(err) => err.kind(),
            Self::Database(_) => ErrorKind::StorageFailure,
        }
    }

    /// Maps a failed write, turning unique violations into conflicts.
    pub(crate) fn from_write(err: DbErr) -> Self {
        match err.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(detail)) => {
                Self::Invoice(InvoiceError::Conflict(detail))
            }
            _ => Self::Database(err),
        }
    }
}

impl From<InvoiceRepoError> for AppError {
    fn from(err: InvoiceRepoError) -> Self {
        match err {
            InvoiceRepoError::Invoice(err) => err.into(),
            InvoiceRepoError::Database(err) => Self::Database(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind() {
        let err = InvoiceRepoError::from(DbErr::Custom("boom".into()));
        assert_eq!(err.kind(), ErrorKind::StorageFailure);

        let err = InvoiceRepoError::from(InvoiceError::validation("bad"));
        assert_eq!(err.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_non_unique_write_error_is_storage_failure() {
        let err = InvoiceRepoError::from_write(DbErr::Custom("boom".into()));
        assert!(matches!(err, InvoiceRepoError::Database(_)));
    }

    #[test]
    fn test_into_app_error() {
        let err: AppError = InvoiceRepoError::from(DbErr::Custom("boom".into())).into();
        assert_eq!(err.status_code(), 503);
        assert!(err.is_retryable());

        let err: AppError = InvoiceRepoError::from(InvoiceError::Conflict("dup".into())).into();
        assert_eq!(err.status_code(), 409);
    }
}
