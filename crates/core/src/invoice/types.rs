//! Invoice domain types for issuance, reads, and updates.

use chrono::NaiveDate;
use invoicer_shared::types::{CustomerId, InvoiceId, OrganizationId, ProductId};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::tax::TaxType;

/// Invoice lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// Nothing paid yet.
    Pending,
    /// Some amount paid, balance outstanding.
    PartiallyPaid,
    /// Fully paid.
    Paid,
    /// Past the due date with a balance outstanding.
    Overdue,
    /// Cancelled; the invoice number stays consumed.
    Cancelled,
}

impl InvoiceStatus {
    /// All statuses, in display order.
    pub const ALL: [Self; 5] = [
        Self::Pending,
        Self::PartiallyPaid,
        Self::Paid,
        Self::Overdue,
        Self::Cancelled,
    ];

    /// Stable string form used in storage and query strings.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::PartiallyPaid => "partially_paid",
            Self::Paid => "paid",
            Self::Overdue => "overdue",
            Self::Cancelled => "cancelled",
        }
    }

    /// Returns true once the invoice can no longer change.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

impl std::fmt::Display for InvoiceStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for InvoiceStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown invoice status: {s}"))
    }
}

/// Shipping address captured on the invoice and written back to the customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    /// Recipient name.
    #[serde(default)]
    pub name: Option<String>,
    /// First address line.
    pub line1: String,
    /// Second address line.
    #[serde(default)]
    pub line2: Option<String>,
    /// City.
    #[serde(default)]
    pub city: Option<String>,
    /// State or territory.
    #[serde(default)]
    pub state: Option<String>,
    /// Postal code.
    #[serde(default)]
    pub postal_code: Option<String>,
    /// Country.
    #[serde(default)]
    pub country: Option<String>,
    /// Contact phone.
    #[serde(default)]
    pub phone: Option<String>,
}

/// Monetary amounts carried on an invoice header.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceAmounts {
    /// Invoice total.
    pub total_amount: Decimal,
    /// Discount applied.
    #[serde(default)]
    pub discount_amount: Decimal,
    /// Tax charged.
    #[serde(default)]
    pub tax_amount: Decimal,
    /// Amount paid in advance.
    #[serde(default)]
    pub advance_amount: Decimal,
    /// Amount still due.
    #[serde(default)]
    pub due_amount: Decimal,
}

/// One requested line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItemInput {
    /// Product being sold.
    pub product_id: ProductId,
    /// Units sold. Must be a positive whole number.
    pub quantity: Decimal,
    /// Unit price at the time of sale.
    pub unit_price: Decimal,
}

/// Input for issuing a new invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueInvoiceInput {
    /// Issuing organization.
    pub organization_id: OrganizationId,
    /// Billed customer.
    pub customer_id: CustomerId,
    /// Invoice date chosen by the caller.
    pub invoice_date: NaiveDate,
    /// Payment due date.
    pub due_date: Option<NaiveDate>,
    /// Header amounts.
    pub amounts: InvoiceAmounts,
    /// Registration value the invoice is issued under.
    pub tax_registration: String,
    /// Tax treatment.
    pub tax_type: TaxType,
    /// Shipping address snapshot.
    pub shipping_address: ShippingAddress,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Ordered line items.
    pub line_items: Vec<LineItemInput>,
}

/// A line item that passed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedLineItem {
    /// Zero-based position in the request.
    pub position: i32,
    /// Product being sold.
    pub product_id: ProductId,
    /// Units sold.
    pub quantity: i32,
    /// Unit price snapshot.
    pub unit_price: Decimal,
    /// `quantity * unit_price`.
    pub line_total: Decimal,
}

/// Total units of one product taken by an issuance or returned by a reversal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockDemand {
    /// Product whose stock moves.
    pub product_id: ProductId,
    /// Units, summed over every line of the product.
    pub quantity: i32,
}

/// Issuance input that passed validation, ready to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedIssue {
    /// Issuing organization.
    pub organization_id: OrganizationId,
    /// Billed customer.
    pub customer_id: CustomerId,
    /// Registration value, trimmed.
    pub tax_registration: String,
    /// First two characters of the registration value.
    pub jurisdiction_prefix: String,
    /// Tax treatment.
    pub tax_type: TaxType,
    /// Dates, amounts, status, and notes.
    pub terms: InvoiceTerms,
    /// Shipping address snapshot.
    pub shipping_address: ShippingAddress,
    /// Line items in request order.
    pub line_items: Vec<ValidatedLineItem>,
    /// Stock to take, one entry per product, ordered by product id.
    pub stock_demand: Vec<StockDemand>,
}

/// The mutable part of an invoice header.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceTerms {
    /// Invoice date.
    pub invoice_date: NaiveDate,
    /// Payment due date.
    pub due_date: Option<NaiveDate>,
    /// Header amounts.
    #[serde(flatten)]
    pub amounts: InvoiceAmounts,
    /// Lifecycle status.
    pub status: InvoiceStatus,
    /// Free-form notes.
    pub notes: Option<String>,
}

/// Result of a successful issuance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssuedInvoice {
    /// The new invoice.
    pub invoice_id: InvoiceId,
    /// The number minted for it.
    pub invoice_number: String,
}

/// Invoice totals per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvoiceCounts {
    /// All invoices.
    pub total: u64,
    /// Pending invoices.
    pub pending: u64,
    /// Partially paid invoices.
    pub partially_paid: u64,
    /// Paid invoices.
    pub paid: u64,
    /// Overdue invoices.
    pub overdue: u64,
    /// Cancelled invoices.
    pub cancelled: u64,
}

impl InvoiceCounts {
    /// Records `count` invoices with `status`.
    pub fn record(&mut self, status: InvoiceStatus, count: u64) {
        let slot = match status {
            InvoiceStatus::Pending => &mut self.pending,
            InvoiceStatus::PartiallyPaid => &mut self.partially_paid,
            InvoiceStatus::Paid => &mut self.paid,
            InvoiceStatus::Overdue => &mut self.overdue,
            InvoiceStatus::Cancelled => &mut self.cancelled,
        };
        *slot += count;
        self.total += count;
    }
}
