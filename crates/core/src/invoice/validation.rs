//! Business rule validation for invoice input.
//!
//! Everything here runs before any storage access, so a rejected request
//! never writes anything.

use std::collections::BTreeMap;

use chrono::NaiveDate;
use invoicer_shared::types::ProductId;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use super::error::InvoiceError;
use super::types::{InvoiceAmounts, LineItemInput, ShippingAddress, StockDemand, ValidatedLineItem};
use crate::tax::jurisdiction_prefix;

/// Largest amount a `NUMERIC(19, 4)` column holds: 999,999,999,999,999.9999.
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(0x89E7_FFFF, 0x8AC7_2304, 0, false, 4);

/// Character separating the segments of an invoice number.
const NUMBER_SEPARATOR: char = '/';

/// Validates line items and computes their totals, preserving request order.
///
/// # Errors
///
/// Returns `InvoiceError::Validation` if the list is empty, a quantity is not a
/// positive whole number that fits in 32 bits, or a unit price or line total
/// is negative or above [`MAX_AMOUNT`].
pub fn validate_line_items(lines: &[LineItemInput]) -> Result<Vec<ValidatedLineItem>, InvoiceError> {
    if lines.is_empty() {
        return Err(InvoiceError::validation("line_items must not be empty"));
    }

    lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            let quantity = whole_quantity(line.quantity).ok_or_else(|| {
                InvoiceError::validation(format!(
                    "line_items[{index}].quantity must be a positive whole number, got {}",
                    line.quantity
                ))
            })?;

            check_amount(&format!("line_items[{index}].unit_price"), line.unit_price)?;

            let line_total = Decimal::from(quantity)
                .checked_mul(line.unit_price)
                .filter(|total| *total <= MAX_AMOUNT)
                .ok_or_else(|| {
                    InvoiceError::validation(format!(
                        "line_items[{index}] total must not exceed {MAX_AMOUNT}"
                    ))
                })?;

            let position = i32::try_from(index)
                .map_err(|_| InvoiceError::validation("too many line items"))?;

            Ok(ValidatedLineItem {
                position,
                product_id: line.product_id,
                quantity,
                unit_price: line.unit_price,
                line_total,
            })
        })
        .collect()
}

fn whole_quantity(quantity: Decimal) -> Option<i32> {
    if quantity <= Decimal::ZERO || !quantity.fract().is_zero() {
        return None;
    }
    quantity.to_i32()
}

fn check_amount(name: &str, value: Decimal) -> Result<(), InvoiceError> {
    if value < Decimal::ZERO {
        return Err(InvoiceError::validation(format!("{name} must not be negative")));
    }
    if value > MAX_AMOUNT {
        return Err(InvoiceError::validation(format!(
            "{name} must not exceed {MAX_AMOUNT}"
        )));
    }
    Ok(())
}

/// Sums the quantity requested per product, ordered by product id.
///
/// Stock rows are locked in this order by every writer.
///
/// # Errors
///
/// Returns `InvoiceError::Validation` if a product's total quantity does not
/// fit in 32 bits.
pub fn merge_stock_demand(
    lines: impl IntoIterator<Item = (ProductId, i32)>,
) -> Result<Vec<StockDemand>, InvoiceError> {
    let mut merged: BTreeMap<ProductId, i32> = BTreeMap::new();
    for (product_id, quantity) in lines {
        let total = merged.entry(product_id).or_insert(0);
        *total = total.checked_add(quantity).ok_or_else(|| {
            InvoiceError::validation(format!("total quantity of product {product_id} is too large"))
        })?;
    }

    Ok(merged
        .into_iter()
        .map(|(product_id, quantity)| StockDemand {
            product_id,
            quantity,
        })
        .collect())
}

/// Validates header amounts.
///
/// # Errors
///
/// Returns `InvoiceError::Validation` if any amount is negative or above
/// [`MAX_AMOUNT`], or the advance exceeds the total.
pub fn validate_amounts(amounts: &InvoiceAmounts) -> Result<(), InvoiceError> {
    let fields = [
        ("total_amount", amounts.total_amount),
        ("discount_amount", amounts.discount_amount),
        ("tax_amount", amounts.tax_amount),
        ("advance_amount", amounts.advance_amount),
        ("due_amount", amounts.due_amount),
    ];

    for (name, value) in fields {
        check_amount(name, value)?;
    }

    if amounts.advance_amount > amounts.total_amount {
        return Err(InvoiceError::validation(
            "advance_amount must not exceed total_amount",
        ));
    }

    Ok(())
}

/// Validates that the due date is not before the invoice date.
///
/// # Errors
///
/// Returns `InvoiceError::Validation` when `due_date < invoice_date`.
pub fn validate_dates(invoice_date: NaiveDate, due_date: Option<NaiveDate>) -> Result<(), InvoiceError> {
    match due_date {
        Some(due) if due < invoice_date => Err(InvoiceError::validation(format!(
            "due_date {due} is before invoice_date {invoice_date}"
        ))),
        _ => Ok(()),
    }
}

/// Validates the registration value and returns it trimmed with its
/// jurisdiction prefix.
///
/// # Errors
///
/// Returns `InvoiceError::Validation` if the value has fewer than two
/// characters or contains the invoice number separator `/`.
pub fn validate_registration(registration: &str) -> Result<(String, String), InvoiceError> {
    let registration = registration.trim();
    if registration.contains(NUMBER_SEPARATOR) {
        return Err(InvoiceError::validation(format!(
            "tax_registration must not contain '{NUMBER_SEPARATOR}'"
        )));
    }
    let prefix = jurisdiction_prefix(registration).ok_or_else(|| {
        InvoiceError::validation("tax_registration must have at least two characters")
    })?;
    Ok((registration.to_string(), prefix))
}

/// Validates the shipping address snapshot.
///
/// # Errors
///
/// Returns `InvoiceError::Validation` if the first address line is blank.
pub fn validate_shipping_address(address: &ShippingAddress) -> Result<(), InvoiceError> {
    if address.line1.trim().is_empty() {
        return Err(InvoiceError::validation(
            "shipping_address.line1 must not be blank",
        ));
    }
    Ok(())
}
