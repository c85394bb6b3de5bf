//! Invoice routes: issuance, reads, search, counts, updates, cancel, delete.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::NaiveDate;
use invoicer_core::invoice::{
    InvoiceAmounts, InvoiceStatus, InvoiceUpdate, IssueInvoiceInput, LineItemInput, SearchTerms,
    ShippingAddress,
};
use invoicer_core::tax::TaxType;
use invoicer_db::{InvoiceRepository, repositories::InvoiceFilter};
use invoicer_shared::types::{CustomerId, InvoiceId, OrganizationId, PageRequest};
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;
use uuid::Uuid;

use crate::{AppState, error::ApiError};

/// Creates the invoice routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/organizations/{org_id}/invoices", post(issue_invoice))
        .route("/invoices", get(list_invoices))
        .route("/invoices/search", get(search_invoices))
        .route("/invoices/counts", get(count_invoices))
        .route(
            "/invoices/{invoice_id}",
            get(get_invoice).patch(update_invoice).delete(delete_invoice),
        )
        .route("/invoices/{invoice_id}/cancel", post(cancel_invoice))
}

// ============================================================================
// Request Types
// ============================================================================

/// Request body for issuing an invoice.
#[derive(Debug, Deserialize)]
pub struct IssueInvoiceRequest {
    /// Billed customer.
    pub customer_id: Uuid,
    /// Invoice date (YYYY-MM-DD).
    pub invoice_date: NaiveDate,
    /// Optional due date (YYYY-MM-DD).
    pub due_date: Option<NaiveDate>,
    /// Header amounts.
    #[serde(flatten)]
    pub amounts: InvoiceAmounts,
    /// Registration value the invoice is issued under.
    pub tax_registration: String,
    /// `intra_state` or `inter_state`.
    pub tax_type: TaxType,
    /// Shipping address snapshot.
    pub shipping_address: ShippingAddress,
    /// Free-form notes.
    pub notes: Option<String>,
    /// Line items in display order.
    pub line_items: Vec<LineItemInput>,
}

impl IssueInvoiceRequest {
    fn into_input(self, organization_id: OrganizationId) -> IssueInvoiceInput {
        IssueInvoiceInput {
            organization_id,
            customer_id: CustomerId::from_uuid(self.customer_id),
            invoice_date: self.invoice_date,
            due_date: self.due_date,
            amounts: self.amounts,
            tax_registration: self.tax_registration,
            tax_type: self.tax_type,
            shipping_address: self.shipping_address,
            notes: self.notes,
            line_items: self.line_items,
        }
    }
}

/// Query parameters for listing invoices.
///
/// Page and limit stay strings so malformed values fall back to defaults
/// instead of rejecting the request.
#[derive(Debug, Deserialize)]
pub struct ListInvoicesQuery {
    /// Page number (1-indexed).
    pub page: Option<String>,
    /// Page size.
    pub limit: Option<String>,
    /// Filter by status.
    pub status: Option<String>,
    /// Filter by organization.
    pub organization_id: Option<Uuid>,
}

/// Query parameters for searching invoices.
#[derive(Debug, Deserialize)]
pub struct SearchInvoicesQuery {
    /// Free-text query.
    pub q: Option<String>,
    /// Restrict to one organization.
    pub organization_id: Option<Uuid>,
    /// Page number (1-indexed).
    pub page: Option<String>,
    /// Page size.
    pub limit: Option<String>,
}

/// Query parameters for invoice counts.
#[derive(Debug, Deserialize)]
pub struct CountInvoicesQuery {
    /// Restrict to one organization.
    pub organization_id: Option<Uuid>,
}

// ============================================================================
// Route Handlers
// ============================================================================

fn repository(state: &AppState) -> InvoiceRepository {
    InvoiceRepository::new((*state.db).clone())
        .with_fallback_prefix(state.invoicing.fallback_prefix.clone())
}

fn page_request(state: &AppState, page: Option<&str>, limit: Option<&str>) -> PageRequest {
    PageRequest::sanitize(page, limit, state.invoicing.max_page_size)
}

/// POST `/organizations/{org_id}/invoices` - Issue an invoice.
async fn issue_invoice(
    State(state): State<AppState>,
    Path(org_id): Path<Uuid>,
    Json(payload): Json<IssueInvoiceRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let input = payload.into_input(OrganizationId::from_uuid(org_id));
    let issued = repository(&state).issue_invoice(input).await?;

    Ok((StatusCode::CREATED, Json(issued)))
}

/// GET `/invoices` - List invoices in issuance order.
async fn list_invoices(
    State(state): State<AppState>,
    Query(query): Query<ListInvoicesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let status = query
        .status
        .as_deref()
        .map(str::parse::<InvoiceStatus>)
        .transpose()
        .map_err(ApiError::validation)?;

    let filter = InvoiceFilter {
        organization_id: query.organization_id.map(OrganizationId::from_uuid),
        status,
    };
    let page = page_request(&state, query.page.as_deref(), query.limit.as_deref());

    let invoices = repository(&state).list_invoices(filter, page).await?;
    Ok(Json(invoices))
}

/// GET `/invoices/search` - Search by number or customer.
async fn search_invoices(
    State(state): State<AppState>,
    Query(query): Query<SearchInvoicesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let terms = SearchTerms::parse(query.q.as_deref().unwrap_or_default())?;
    let page = page_request(&state, query.page.as_deref(), query.limit.as_deref());

    debug!(pattern = %terms.pattern, two_words = terms.name_pair.is_some(), "Searching invoices");

    let invoices = repository(&state)
        .search_invoices(&terms, query.organization_id.map(OrganizationId::from_uuid), page)
        .await?;
    Ok(Json(invoices))
}

/// GET `/invoices/counts` - Total and per-status counts.
async fn count_invoices(
    State(state): State<AppState>,
    Query(query): Query<CountInvoicesQuery>,
) -> Result<impl IntoResponse, ApiError> {
    let counts = repository(&state)
        .count_invoices(query.organization_id.map(OrganizationId::from_uuid))
        .await?;
    Ok(Json(counts))
}

/// GET `/invoices/{invoice_id}` - Invoice with customer, lines, and registration.
async fn get_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let details = repository(&state)
        .get_invoice(InvoiceId::from_uuid(invoice_id))
        .await?;
    Ok(Json(details))
}

/// PATCH `/invoices/{invoice_id}` - Update allow-listed fields.
async fn update_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
    Json(body): Json<Value>,
) -> Result<impl IntoResponse, ApiError> {
    let update = InvoiceUpdate::from_value(&body)?;
    let updated = repository(&state)
        .update_invoice(InvoiceId::from_uuid(invoice_id), &update)
        .await?;
    Ok(Json(updated))
}

/// POST `/invoices/{invoice_id}/cancel` - Cancel and restock.
async fn cancel_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let cancelled = repository(&state)
        .cancel_invoice(InvoiceId::from_uuid(invoice_id))
        .await?;
    Ok(Json(cancelled))
}

/// DELETE `/invoices/{invoice_id}` - Delete with line items.
async fn delete_invoice(
    State(state): State<AppState>,
    Path(invoice_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    repository(&state)
        .delete_invoice(InvoiceId::from_uuid(invoice_id))
        .await?;
    Ok(StatusCode::NO_CONTENT)
}
