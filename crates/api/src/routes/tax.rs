//! GST supply classification routes.

use axum::{Json, Router, routing::post};
use invoicer_core::tax::{SupplyClassification, TaxBreakdown, classify_supply};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::{AppState, error::ApiError};

/// Creates the tax routes.
pub fn routes() -> Router<AppState> {
    Router::new().route("/tax/classify", post(classify))
}

/// Request body for classifying a supply.
#[derive(Debug, Deserialize)]
pub struct ClassifyRequest {
    /// Seller GSTIN.
    pub seller_gstin: String,
    /// Buyer GSTIN.
    pub buyer_gstin: String,
    /// Tax to split into CGST/SGST or IGST.
    pub tax_amount: Option<Decimal>,
}

/// Classification result with an optional tax split.
#[derive(Debug, Serialize)]
pub struct ClassifyResponse {
    /// State codes and tax type.
    #[serde(flatten)]
    pub classification: SupplyClassification,
    /// Split of `tax_amount`, when one was given.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub breakdown: Option<TaxBreakdown>,
}

/// POST `/tax/classify` - Intra- or inter-state supply for two GSTINs.
async fn classify(Json(payload): Json<ClassifyRequest>) -> Result<Json<ClassifyResponse>, ApiError> {
    let classification = classify_supply(&payload.seller_gstin, &payload.buyer_gstin)?;
    let breakdown = payload
        .tax_amount
        .map(|tax| classification.tax_type.split(tax));

    Ok(Json(ClassifyResponse {
        classification,
        breakdown,
    }))
}
