//! Invoice issuance and lifecycle rules.
//!
//! This module holds the storage-free half of invoicing:
//! - Domain types for issuance, reads, and counts
//! - Error taxonomy shared with the persistence layer
//! - Input validation that runs before any write
//! - Initial status and cancel/delete rules
//! - Allow-listed partial updates
//! - Search query tokenization

pub mod error;
pub mod search;
pub mod service;
pub mod types;
pub mod update;
pub mod validation;

#[cfg(test)]
mod validation_props;

pub use error::{ErrorKind, InvoiceError};
pub use search::SearchTerms;
pub use service::InvoiceService;
pub use types::{
    InvoiceAmounts, InvoiceCounts, InvoiceStatus, InvoiceTerms, IssueInvoiceInput, IssuedInvoice,
    LineItemInput, ShippingAddress, StockDemand, ValidatedIssue, ValidatedLineItem,
};
pub use update::{InvoiceField, InvoiceUpdate, PROTECTED_FIELDS};
