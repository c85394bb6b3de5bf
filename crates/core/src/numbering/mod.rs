//! Invoice number formatting.
//!
//! Invoice numbers follow `PREFIX/JJ/MON/YYYY/NNNN` where the sequence is
//! scoped to one tax registration of one organization.

pub mod invoice_number;

#[cfg(test)]
mod props;

pub use invoice_number::{InvoiceNumber, InvoiceNumberError, MIN_SEQUENCE_WIDTH, resolve_org_prefix};
