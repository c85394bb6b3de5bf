//! GST supply classification.
//!
//! A GSTIN starts with the two-digit code of the state it was issued in.
//! Supplies between registrations in the same state are intra-state (CGST +
//! SGST); everything else is inter-state (IGST).

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;

const GSTIN_LENGTH: usize = 15;

/// Tax treatment of an invoice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaxType {
    /// Seller and buyer in the same state.
    IntraState,
    /// Seller and buyer in different states.
    InterState,
}

impl TaxType {
    /// Stable string form used in storage and responses.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::IntraState => "intra_state",
            Self::InterState => "inter_state",
        }
    }

    /// Splits a tax amount into its GST components.
    #[must_use]
    pub fn split(&self, tax_amount: Decimal) -> TaxBreakdown {
        match self {
            Self::IntraState => {
                let cgst = (tax_amount / Decimal::TWO).round_dp(4);
                TaxBreakdown {
                    cgst,
                    sgst: tax_amount - cgst,
                    igst: Decimal::ZERO,
                }
            }
            Self::InterState => TaxBreakdown {
                cgst: Decimal::ZERO,
                sgst: Decimal::ZERO,
                igst: tax_amount,
            },
        }
    }
}

impl std::fmt::Display for TaxType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for TaxType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "intra_state" => Ok(Self::IntraState),
            "inter_state" => Ok(Self::InterState),
            _ => Err(format!("Unknown tax type: {s}")),
        }
    }
}

/// GST components of a tax amount.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxBreakdown {
    /// Central GST.
    pub cgst: Decimal,
    /// State GST.
    pub sgst: Decimal,
    /// Integrated GST.
    pub igst: Decimal,
}

/// Errors raised while classifying a supply.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ClassificationError {
    /// The value is not shaped like a GSTIN.
    #[error("Malformed GSTIN: {0}")]
    MalformedGstin(String),

    /// The leading digits are not a known state code.
    #[error("Unknown state code {code} in GSTIN {gstin}")]
    UnknownStateCode {
        /// The GSTIN that was inspected.
        gstin: String,
        /// The parsed code.
        code: u8,
    },
}

/// Result of classifying a supply between two registrations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SupplyClassification {
    /// State code of the seller.
    pub seller_state_code: u8,
    /// State code of the buyer.
    pub buyer_state_code: u8,
    /// Resulting tax treatment.
    pub tax_type: TaxType,
}

/// Extracts the state code from a GSTIN.
///
/// # Errors
///
/// Returns an error if the value is not a 15 character alphanumeric GSTIN or
/// its state code is outside the allotted ranges.
pub fn state_code(gstin: &str) -> Result<u8, ClassificationError> {
    let gstin = gstin.trim();
    if gstin.len() != GSTIN_LENGTH || !gstin.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(ClassificationError::MalformedGstin(gstin.to_string()));
    }

    let code: u8 = gstin[..2]
        .parse()
        .map_err(|_| ClassificationError::MalformedGstin(gstin.to_string()))?;

    // 01-38 are states and union territories, 97 is "other territory",
    // 99 is the centre jurisdiction.
    if matches!(code, 1..=38 | 97 | 99) {
        Ok(code)
    } else {
        Err(ClassificationError::UnknownStateCode {
            gstin: gstin.to_string(),
            code,
        })
    }
}

/// Classifies a supply from `seller_gstin` to `buyer_gstin`.
///
/// # Errors
///
/// Returns an error if either GSTIN is malformed.
pub fn classify_supply(
    seller_gstin: &str,
    buyer_gstin: &str,
) -> Result<SupplyClassification, ClassificationError> {
    let seller_state_code = state_code(seller_gstin)?;
    let buyer_state_code = state_code(buyer_gstin)?;

    let tax_type = if seller_state_code == buyer_state_code {
        TaxType::IntraState
    } else {
        TaxType::InterState
    };

    Ok(SupplyClassification {
        seller_state_code,
        buyer_state_code,
        tax_type,
    })
}
