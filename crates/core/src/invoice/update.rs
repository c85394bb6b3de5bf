//! Partial invoice updates over a closed set of fields.
//!
//! Updates arrive as a JSON object of field name to value. Only the fields in
//! [`InvoiceField`] can change; identity, numbering, and line items are
//! immutable after issuance.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::error::InvoiceError;
use super::types::{InvoiceStatus, InvoiceTerms};
use super::validation::{validate_amounts, validate_dates};

/// Fields that may never be changed through an update.
pub const PROTECTED_FIELDS: [&str; 8] = [
    "invoice_number",
    "line_items",
    "id",
    "organization_id",
    "customer_id",
    "tax_registration_number",
    "sequence_number",
    "created_at",
];

/// An updatable invoice field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InvoiceField {
    /// `invoice_date`
    InvoiceDate,
    /// `due_date`
    DueDate,
    /// `total_amount`
    TotalAmount,
    /// `discount_amount`
    DiscountAmount,
    /// `tax_amount`
    TaxAmount,
    /// `advance_amount`
    AdvanceAmount,
    /// `due_amount`
    DueAmount,
    /// `status`
    Status,
    /// `notes`
    Notes,
}

impl InvoiceField {
    /// Every updatable field.
    pub const ALL: [Self; 9] = [
        Self::InvoiceDate,
        Self::DueDate,
        Self::TotalAmount,
        Self::DiscountAmount,
        Self::TaxAmount,
        Self::AdvanceAmount,
        Self::DueAmount,
        Self::Status,
        Self::Notes,
    ];

    /// Field name as it appears in requests and storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::InvoiceDate => "invoice_date",
            Self::DueDate => "due_date",
            Self::TotalAmount => "total_amount",
            Self::DiscountAmount => "discount_amount",
            Self::TaxAmount => "tax_amount",
            Self::AdvanceAmount => "advance_amount",
            Self::DueAmount => "due_amount",
            Self::Status => "status",
            Self::Notes => "notes",
        }
    }

    fn lookup(name: &str) -> Result<Self, InvoiceError> {
        if PROTECTED_FIELDS.contains(&name) {
            return Err(InvoiceError::validation(format!(
                "field '{name}' cannot be updated"
            )));
        }
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == name)
            .ok_or_else(|| InvoiceError::validation(format!("unknown field '{name}'")))
    }
}

impl std::fmt::Display for InvoiceField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A validated set of field changes.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InvoiceUpdate {
    invoice_date: Option<NaiveDate>,
    due_date: Option<Option<NaiveDate>>,
    total_amount: Option<Decimal>,
    discount_amount: Option<Decimal>,
    tax_amount: Option<Decimal>,
    advance_amount: Option<Decimal>,
    due_amount: Option<Decimal>,
    status: Option<InvoiceStatus>,
    notes: Option<Option<String>>,
}

impl InvoiceUpdate {
    /// Parses an update from a JSON value, which must be a non-empty object.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Validation` for non-objects, empty objects,
    /// unknown or protected keys, mistyped values, and `status: "cancelled"`.
    pub fn from_value(value: &Value) -> Result<Self, InvoiceError> {
        let map = value
            .as_object()
            .ok_or_else(|| InvoiceError::validation("update body must be a JSON object"))?;
        Self::from_map(map)
    }

    /// Parses an update from a JSON object.
    ///
    /// # Errors
    ///
    /// See [`InvoiceUpdate::from_value`].
    pub fn from_map(map: &Map<String, Value>) -> Result<Self, InvoiceError> {
        if map.is_empty() {
            return Err(InvoiceError::validation("update must change at least one field"));
        }

        let mut update = Self::default();
        for (name, value) in map {
            let field = InvoiceField::lookup(name)?;
            match field {
                InvoiceField::InvoiceDate => update.invoice_date = Some(parse(field, value)?),
                InvoiceField::DueDate => update.due_date = Some(parse_nullable(field, value)?),
                InvoiceField::TotalAmount => update.total_amount = Some(parse(field, value)?),
                InvoiceField::DiscountAmount => update.discount_amount = Some(parse(field, value)?),
                InvoiceField::TaxAmount => update.tax_amount = Some(parse(field, value)?),
                InvoiceField::AdvanceAmount => update.advance_amount = Some(parse(field, value)?),
                InvoiceField::DueAmount => update.due_amount = Some(parse(field, value)?),
                InvoiceField::Status => {
                    let status: InvoiceStatus = parse(field, value)?;
                    if status == InvoiceStatus::Cancelled {
                        return Err(InvoiceError::validation(
                            "status cannot be set to cancelled by update; cancel the invoice instead",
                        ));
                    }
                    update.status = Some(status);
                }
                InvoiceField::Notes => update.notes = Some(parse_nullable(field, value)?),
            }
        }
        Ok(update)
    }

    /// Fields this update touches, in declaration order.
    #[must_use]
    pub fn fields(&self) -> Vec<InvoiceField> {
        let touched = [
            self.invoice_date.is_some(),
            self.due_date.is_some(),
            self.total_amount.is_some(),
            self.discount_amount.is_some(),
            self.tax_amount.is_some(),
            self.advance_amount.is_some(),
            self.due_amount.is_some(),
            self.status.is_some(),
            self.notes.is_some(),
        ];
        InvoiceField::ALL
            .into_iter()
            .zip(touched)
            .filter_map(|(field, set)| set.then_some(field))
            .collect()
    }

    /// Applies the update to the current terms and re-validates the result.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceError::Validation` if the merged terms break an amount
    /// or date rule.
    pub fn apply(&self, current: &InvoiceTerms) -> Result<InvoiceTerms, InvoiceError> {
        let mut next = current.clone();

        if let Some(date) = self.invoice_date {
            next.invoice_date = date;
        }
        if let Some(due) = self.due_date {
            next.due_date = due;
        }
        if let Some(amount) = self.total_amount {
            next.amounts.total_amount = amount;
        }
        if let Some(amount) = self.discount_amount {
            next.amounts.discount_amount = amount;
        }
        if let Some(amount) = self.tax_amount {
            next.amounts.tax_amount = amount;
        }
        if let Some(amount) = self.advance_amount {
            next.amounts.advance_amount = amount;
        }
        if let Some(amount) = self.due_amount {
            next.amounts.due_amount = amount;
        }
        if let Some(status) = self.status {
            next.status = status;
        }
        if let Some(notes) = &self.notes {
            next.notes.clone_from(notes);
        }

        validate_amounts(&next.amounts)?;
        validate_dates(next.invoice_date, next.due_date)?;
        Ok(next)
    }
}

fn parse<T: DeserializeOwned>(field: InvoiceField, value: &Value) -> Result<T, InvoiceError> {
    serde_json::from_value(value.clone())
        .map_err(|e| InvoiceError::validation(format!("invalid value for '{field}': {e}")))
}

fn parse_nullable<T: DeserializeOwned>(
    field: InvoiceField,
    value: &Value,
) -> Result<Option<T>, InvoiceError> {
    if value.is_null() {
        return Ok(None);
    }
    parse(field, value).map(Some)
}
