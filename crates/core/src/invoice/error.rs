//! Invoice error types.

use invoicer_shared::AppError;
use invoicer_shared::types::{CustomerId, InvoiceId, OrganizationId, ProductId};
use thiserror::Error;

/// Broad category of an invoice failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Input failed validation; nothing was written.
    Validation,
    /// A referenced entity does not exist.
    NotFound,
    /// A product lacks stock for a line.
    InsufficientStock,
    /// The operation clashes with current state.
    Conflict,
    /// The store failed; the whole operation may be retried.
    StorageFailure,
}

/// Errors that can occur during invoice operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceError {
    // ========== Validation Errors ==========
    /// Input failed validation.
    #[error("{0}")]
    Validation(String),

    // ========== Lookup Errors ==========
    /// Organization not found.
    #[error("Organization not found: {0}")]
    OrganizationNotFound(OrganizationId),

    /// Customer not found.
    #[error("Customer not found: {0}")]
    CustomerNotFound(CustomerId),

    /// Product not found.
    #[error("Product not found: {0}")]
    ProductNotFound(ProductId),

    /// Invoice not found.
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(InvoiceId),

    /// No registration with the supplied value under the organization.
    #[error("Tax registration {registration} not found for organization {organization_id}")]
    TaxRegistrationNotFound {
        /// The organization searched.
        organization_id: OrganizationId,
        /// The registration value supplied.
        registration: String,
    },

    // ========== Stock Errors ==========
    /// Product stock is lower than the requested quantity.
    #[error("Insufficient stock for product {product_id}: requested {requested}")]
    InsufficientStock {
        /// The product that ran short.
        product_id: ProductId,
        /// Quantity requested by the line.
        requested: i32,
    },

    // ========== State Errors ==========
    /// The invoice was already cancelled.
    #[error("Invoice {0} is already cancelled")]
    AlreadyCancelled(InvoiceId),

    /// Uniqueness or state conflict.
    #[error("Conflict: {0}")]
    Conflict(String),
}

impl InvoiceError {
    /// Shorthand for a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Returns the category of this error.
    #[must_use]
    pub const fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(_) => ErrorKind::Validation,
            Self::OrganizationNotFound(_)
            | Self::CustomerNotFound(_)
            | Self::ProductNotFound(_)
            | Self::InvoiceNotFound(_)
            | Self::TaxRegistrationNotFound { .. } => ErrorKind::NotFound,
            Self::InsufficientStock { .. } => ErrorKind::InsufficientStock,
            Self::AlreadyCancelled(_) | Self::Conflict(_) => ErrorKind::Conflict,
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::OrganizationNotFound(_) => "ORGANIZATION_NOT_FOUND",
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::ProductNotFound(_) => "PRODUCT_NOT_FOUND",
            Self::InvoiceNotFound(_) => "INVOICE_NOT_FOUND",
            Self::TaxRegistrationNotFound { .. } => "TAX_REGISTRATION_NOT_FOUND",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::AlreadyCancelled(_) => "ALREADY_CANCELLED",
            Self::Conflict(_) => "CONFLICT",
        }
    }
}

impl From<InvoiceError> for AppError {
    fn from(err: InvoiceError) -> Self {
        let message = err.to_string();
        match err.kind() {
            ErrorKind::Validation => Self::Validation(message),
            ErrorKind::NotFound => Self::NotFound(message),
            ErrorKind::InsufficientStock => Self::InsufficientStock(message),
            ErrorKind::Conflict => Self::Conflict(message),
            ErrorKind::StorageFailure => Self::Database(message),
        }
    }
}
