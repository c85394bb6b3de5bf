//! Invoice service for issuance preparation and lifecycle rules.

use invoicer_shared::types::InvoiceId;
use rust_decimal::Decimal;

use super::error::InvoiceError;
use super::types::{InvoiceAmounts, InvoiceStatus, InvoiceTerms, IssueInvoiceInput, ValidatedIssue};
use super::validation::{
    merge_stock_demand, validate_amounts, validate_dates, validate_line_items,
    validate_registration, validate_shipping_address,
};

/// Invoice service for business logic.
///
/// Pure: callers load state from storage, ask the service what is allowed,
/// and persist the result.
pub struct InvoiceService;

impl InvoiceService {
    /// Validates an issuance request and resolves everything that does not
    /// need storage.
    ///
    /// Checks run in order: line items, amounts, dates, registration value,
    /// shipping address, per-product stock demand. The first failure is
    /// returned.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Validation` describing the first rule broken.
    pub fn prepare_issue(input: &IssueInvoiceInput) -> Result<ValidatedIssue, InvoiceError> {
        let line_items = validate_line_items(&input.line_items)?;
        validate_amounts(&input.amounts)?;
        validate_dates(input.invoice_date, input.due_date)?;
        let (tax_registration, jurisdiction_prefix) =
            validate_registration(&input.tax_registration)?;
        validate_shipping_address(&input.shipping_address)?;
        let stock_demand =
            merge_stock_demand(line_items.iter().map(|line| (line.product_id, line.quantity)))?;

        Ok(ValidatedIssue {
            organization_id: input.organization_id,
            customer_id: input.customer_id,
            tax_registration,
            jurisdiction_prefix,
            tax_type: input.tax_type,
            terms: InvoiceTerms {
                invoice_date: input.invoice_date,
                due_date: input.due_date,
                amounts: input.amounts,
                status: Self::initial_status(&input.amounts),
                notes: normalize_notes(input.notes.as_deref()),
            },
            shipping_address: input.shipping_address.clone(),
            line_items,
            stock_demand,
        })
    }

    /// Status of a freshly issued invoice.
    ///
    /// - advance covers the total (including a zero total): `Paid`
    /// - some advance: `PartiallyPaid`
    /// - otherwise: `Pending`
    #[must_use]
    pub fn initial_status(amounts: &InvoiceAmounts) -> InvoiceStatus {
        if amounts.advance_amount >= amounts.total_amount {
            InvoiceStatus::Paid
        } else if amounts.advance_amount > Decimal::ZERO {
            InvoiceStatus::PartiallyPaid
        } else {
            InvoiceStatus::Pending
        }
    }

    /// Rejects updates to a cancelled invoice.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::AlreadyCancelled` for cancelled invoices.
    pub fn ensure_can_update(id: InvoiceId, status: InvoiceStatus) -> Result<(), InvoiceError> {
        if status.is_terminal() {
            return Err(InvoiceError::AlreadyCancelled(id));
        }
        Ok(())
    }

    /// Rejects a second cancellation.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::AlreadyCancelled` for cancelled invoices.
    pub fn ensure_can_cancel(id: InvoiceId, status: InvoiceStatus) -> Result<(), InvoiceError> {
        Self::ensure_can_update(id, status)
    }

    /// Whether deleting an invoice in `status` must return its stock.
    ///
    /// Cancellation already restocked, so a cancelled invoice is not
    /// restocked again.
    #[must_use]
    pub fn restock_on_delete(status: InvoiceStatus) -> bool {
        !status.is_terminal()
    }
}

fn normalize_notes(notes: Option<&str>) -> Option<String> {
    notes
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(ToString::to_string)
}
