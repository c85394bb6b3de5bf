//! `SeaORM` active enums mapped to Postgres enum types.

use invoicer_core::invoice::InvoiceStatus as CoreInvoiceStatus;
use invoicer_core::tax::TaxType as CoreTaxType;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// `invoice_status` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "invoice_status")]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    /// `pending`
    #[sea_orm(string_value = "pending")]
    Pending,
    /// `partially_paid`
    #[sea_orm(string_value = "partially_paid")]
    PartiallyPaid,
    /// `paid`
    #[sea_orm(string_value = "paid")]
    Paid,
    /// `overdue`
    #[sea_orm(string_value = "overdue")]
    Overdue,
    /// `cancelled`
    #[sea_orm(string_value = "cancelled")]
    Cancelled,
}

impl From<CoreInvoiceStatus> for InvoiceStatus {
    fn from(status: CoreInvoiceStatus) -> Self {
        match status {
            CoreInvoiceStatus::Pending => Self::Pending,
            CoreInvoiceStatus::PartiallyPaid => Self::PartiallyPaid,
            CoreInvoiceStatus::Paid => Self::Paid,
            CoreInvoiceStatus::Overdue => Self::Overdue,
            CoreInvoiceStatus::Cancelled => Self::Cancelled,
        }
    }
}

impl From<InvoiceStatus> for CoreInvoiceStatus {
    fn from(status: InvoiceStatus) -> Self {
        match status {
            InvoiceStatus::Pending => Self::Pending,
            InvoiceStatus::PartiallyPaid => Self::PartiallyPaid,
            InvoiceStatus::Paid => Self::Paid,
            InvoiceStatus::Overdue => Self::Overdue,
            InvoiceStatus::Cancelled => Self::Cancelled,
        }
    }
}

/// `tax_type` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Enum", enum_name = "tax_type")]
#[serde(rename_all = "snake_case")]
pub enum TaxType {
    /// `intra_state`
    #[sea_orm(string_value = "intra_state")]
    IntraState,
    /// `inter_state`
    #[sea_orm(string_value = "inter_state")]
    InterState,
}

impl From<CoreTaxType> for TaxType {
    fn from(tax_type: CoreTaxType) -> Self {
        match tax_type {
            CoreTaxType::IntraState => Self::IntraState,
            CoreTaxType::InterState => Self::InterState,
        }
    }
}

impl From<TaxType> for CoreTaxType {
    fn from(tax_type: TaxType) -> Self {
        match tax_type {
            TaxType::IntraState => Self::IntraState,
            TaxType::InterState => Self::InterState,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_round_trip() {
        for status in CoreInvoiceStatus::ALL {
            let db: InvoiceStatus = status.into();
            assert_eq!(db.to_value(), status.as_str());
            assert_eq!(CoreInvoiceStatus::from(db), status);
        }
    }

    #[test]
    fn test_tax_type_round_trip() {
        for tax_type in [CoreTaxType::IntraState, CoreTaxType::InterState] {
            let db: TaxType = tax_type.into();
            assert_eq!(db.to_value(), tax_type.as_str());
            assert_eq!(CoreTaxType::from(db), tax_type);
        }
    }
}
