//! Invoice repository: atomic issuance plus read, update, cancel, and delete.
//!
//! Every write path runs in one database transaction. A transaction dropped
//! without commit rolls back, so an early `?` return undoes the sequence
//! reservation, line items, stock movements, and shipping snapshot together.

use chrono::{DateTime, Utc};
use invoicer_core::invoice::{
    InvoiceAmounts, InvoiceCounts, InvoiceError, InvoiceService, InvoiceStatus, InvoiceTerms,
    InvoiceUpdate, IssueInvoiceInput, IssuedInvoice, SearchTerms, ValidatedIssue,
};
use invoicer_core::invoice::validation::merge_stock_demand;
use invoicer_core::numbering::{InvoiceNumber, resolve_org_prefix};
use invoicer_core::tax::TaxRegistration;
use invoicer_shared::config::DEFAULT_FALLBACK_PREFIX;
use invoicer_shared::types::{InvoiceId, OrganizationId, PageRequest, PageResponse, ProductId};
use sea_orm::sea_query::{Condition, Expr, Func};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DatabaseTransaction, DbErr, EntityTrait,
    IntoActiveModel, JoinType, PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait,
    Select, Set, TransactionTrait,
};
use serde::Serialize;
use tracing::{debug, info, warn};
use uuid::Uuid;

use super::customer::CustomerRepository;
use super::error::InvoiceRepoError;
use super::stock::StockLedger;
use super::tax_registration::{TaxRegistrationRepository, to_domain};
use crate::entities::{
    customers, invoice_line_items, invoices, organizations, products,
    sea_orm_active_enums::{InvoiceStatus as DbInvoiceStatus, TaxType as DbTaxType},
};

/// Filter options for listing invoices.
#[derive(Debug, Clone, Copy, Default)]
pub struct InvoiceFilter {
    /// Only invoices of this organization.
    pub organization_id: Option<OrganizationId>,
    /// Only invoices with this status.
    pub status: Option<InvoiceStatus>,
}

/// A line item joined with its product.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LineItemDetails {
    /// The stored line.
    #[serde(flatten)]
    pub line: invoice_line_items::Model,
    /// The product, if it still exists.
    pub product: Option<products::Model>,
}

/// Denormalized view of one invoice.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InvoiceDetails {
    /// Invoice header.
    pub invoice: invoices::Model,
    /// Billed customer.
    pub customer: Option<customers::Model>,
    /// Issuing organization.
    pub organization: Option<organizations::Model>,
    /// Line items in issuance order.
    pub line_items: Vec<LineItemDetails>,
    /// Registration the invoice was issued under, when present and readable.
    pub tax_registration: Option<TaxRegistration>,
}

/// Invoice repository.
#[derive(Debug, Clone)]
pub struct InvoiceRepository {
    db: DatabaseConnection,
    registrations: TaxRegistrationRepository,
    fallback_prefix: String,
}

impl InvoiceRepository {
    /// Creates a new invoice repository using the default fallback prefix.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            registrations: TaxRegistrationRepository::new(db.clone()),
            db,
            fallback_prefix: DEFAULT_FALLBACK_PREFIX.to_string(),
        }
    }

    /// Sets the prefix used for organizations without their own.
    #[must_use]
    pub fn with_fallback_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.fallback_prefix = prefix.into();
        self
    }

    // ========================================================================
    // Issuance
    // ========================================================================

    /// Issues an invoice now.
    ///
    /// # Errors
    ///
    /// See [`InvoiceRepository::issue_invoice_at`].
    pub async fn issue_invoice(&self, input: IssueInvoiceInput) -> Result<IssuedInvoice, InvoiceRepoError> {
        self.issue_invoice_at(input, Utc::now()).await
    }

    /// Issues an invoice as of `issued_at`.
    ///
    /// Validates the input, then in one transaction: loads the organization
    /// and customer, reserves the registration sequence, inserts the header
    /// and line items, overwrites the customer's shipping address, and
    /// decrements the organization's stock once per product. Month and year
    /// of the number come from `issued_at`.
    ///
    /// # Errors
    ///
    /// Returns a validation error before touching storage, a not-found error
    /// for a missing organization, customer, or registration, or for a
    /// product the organization does not own, `InsufficientStock` for the
    /// first product that cannot be covered, `Conflict` on a duplicate
    /// number, or a database error. Nothing is
    /// persisted on any error.
    pub async fn issue_invoice_at(
        &self,
        input: IssueInvoiceInput,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedInvoice, InvoiceRepoError> {
        let issue = InvoiceService::prepare_issue(&input)?;

        let txn = self.db.begin().await?;
        let issued = self.issue_in(&txn, &issue, issued_at).await?;
        txn.commit().await?;

        info!(
            invoice_id = %issued.invoice_id,
            invoice_number = %issued.invoice_number,
            organization_id = %issue.organization_id,
            line_count = issue.line_items.len(),
            "Invoice issued"
        );

        Ok(issued)
    }

    async fn issue_in(
        &self,
        txn: &DatabaseTransaction,
        issue: &ValidatedIssue,
        issued_at: DateTime<Utc>,
    ) -> Result<IssuedInvoice, InvoiceRepoError> {
        let organization = organizations::Entity::find_by_id(issue.organization_id.into_inner())
            .one(txn)
            .await?
            .ok_or(InvoiceError::OrganizationNotFound(issue.organization_id))?;

        customers::Entity::find_by_id(issue.customer_id.into_inner())
            .one(txn)
            .await?
            .ok_or(InvoiceError::CustomerNotFound(issue.customer_id))?;

        let reserved = self
            .registrations
            .reserve(txn, issue.organization_id, &issue.tax_registration)
            .await?;

        let prefix = resolve_org_prefix(organization.invoice_prefix.as_deref(), &self.fallback_prefix);
        let invoice_number =
            InvoiceNumber::new(prefix, &issue.jurisdiction_prefix, issued_at, reserved.sequence)
                .to_string();
        let sequence_number = i64::try_from(reserved.sequence)
            .map_err(|_| DbErr::Custom(format!("sequence {} out of range", reserved.sequence)))?;

        let invoice_id = InvoiceId::new();
        let created_at = issued_at.into();
        let shipping_address = serde_json::to_value(&issue.shipping_address)
            .map_err(|e| DbErr::Json(e.to_string()))?;
        let terms = &issue.terms;

        invoices::ActiveModel {
            id: Set(invoice_id.into_inner()),
            invoice_number: Set(invoice_number.clone()),
            organization_id: Set(issue.organization_id.into_inner()),
            customer_id: Set(issue.customer_id.into_inner()),
            tax_registration_number: Set(issue.tax_registration.clone()),
            tax_type: Set(DbTaxType::from(issue.tax_type)),
            sequence_number: Set(sequence_number),
            invoice_date: Set(terms.invoice_date),
            due_date: Set(terms.due_date),
            total_amount: Set(terms.amounts.total_amount),
            discount_amount: Set(terms.amounts.discount_amount),
            tax_amount: Set(terms.amounts.tax_amount),
            advance_amount: Set(terms.amounts.advance_amount),
            due_amount: Set(terms.amounts.due_amount),
            status: Set(DbInvoiceStatus::from(terms.status)),
            shipping_address: Set(shipping_address),
            notes: Set(terms.notes.clone()),
            created_at: Set(created_at),
            updated_at: Set(created_at),
            cancelled_at: Set(None),
        }
        .insert(txn)
        .await
        .map_err(InvoiceRepoError::from_write)?;

        for line in &issue.line_items {
            invoice_line_items::ActiveModel {
                id: Set(Uuid::now_v7()),
                invoice_id: Set(invoice_id.into_inner()),
                product_id: Set(line.product_id.into_inner()),
                position: Set(line.position),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                line_total: Set(line.line_total),
                created_at: Set(created_at),
            }
            .insert(txn)
            .await
            .map_err(|e| product_fk_error(e, line.product_id))?;
        }

        CustomerRepository::set_shipping_snapshot(txn, issue.customer_id, &issue.shipping_address)
            .await?;

        // One decrement per product, in product id order.
        for demand in &issue.stock_demand {
            StockLedger::try_decrement(
                txn,
                issue.organization_id,
                demand.product_id,
                demand.quantity,
            )
            .await?;
        }

        Ok(IssuedInvoice {
            invoice_id,
            invoice_number,
        })
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Loads an invoice with its customer, organization, line items, and
    /// registration.
    ///
    /// A missing registration, or one whose details cannot be parsed, yields
    /// `tax_registration: None` and a warning; the read still succeeds.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` or a database error.
    pub async fn get_invoice(&self, id: InvoiceId) -> Result<InvoiceDetails, InvoiceRepoError> {
        let invoice = invoices::Entity::find_by_id(id.into_inner())
            .one(&self.db)
            .await?
            .ok_or(InvoiceError::InvoiceNotFound(id))?;

        let customer = customers::Entity::find_by_id(invoice.customer_id)
            .one(&self.db)
            .await?;
        let organization = organizations::Entity::find_by_id(invoice.organization_id)
            .one(&self.db)
            .await?;

        let line_items = invoice_line_items::Entity::find()
            .filter(invoice_line_items::Column::InvoiceId.eq(invoice.id))
            .order_by_asc(invoice_line_items::Column::Position)
            .find_also_related(products::Entity)
            .all(&self.db)
            .await?
            .into_iter()
            .map(|(line, product)| LineItemDetails { line, product })
            .collect();

        let organization_id = OrganizationId::from_uuid(invoice.organization_id);
        let tax_registration = TaxRegistrationRepository::find(
            &self.db,
            organization_id,
            &invoice.tax_registration_number,
        )
        .await?
        .map(to_domain);

        if tax_registration.is_none() {
            warn!(
                invoice_id = %id,
                registration = %invoice.tax_registration_number,
                "Tax registration for invoice not found"
            );
        }

        Ok(InvoiceDetails {
            invoice,
            customer,
            organization,
            line_items,
            tax_registration,
        })
    }

    /// Lists invoices in issuance order.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn list_invoices(
        &self,
        filter: InvoiceFilter,
        page: PageRequest,
    ) -> Result<PageResponse<invoices::Model>, DbErr> {
        let mut query = invoices::Entity::find();

        if let Some(organization_id) = filter.organization_id {
            query = query.filter(invoices::Column::OrganizationId.eq(organization_id.into_inner()));
        }
        if let Some(status) = filter.status {
            query = query.filter(invoices::Column::Status.eq(DbInvoiceStatus::from(status)));
        }

        self.paginate(query, page).await
    }

    /// Searches invoices by number and customer name, email, or phone.
    ///
    /// Matching is case-insensitive and by substring. A two-word query also
    /// matches customers whose first and last names equal the two words.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn search_invoices(
        &self,
        terms: &SearchTerms,
        organization_id: Option<OrganizationId>,
        page: PageRequest,
    ) -> Result<PageResponse<invoices::Model>, DbErr> {
        let pattern = terms.pattern.as_str();
        let mut condition = Condition::any()
            .add(lower((invoices::Entity, invoices::Column::InvoiceNumber)).like(pattern))
            .add(lower((customers::Entity, customers::Column::FirstName)).like(pattern))
            .add(lower((customers::Entity, customers::Column::LastName)).like(pattern))
            .add(lower((customers::Entity, customers::Column::Email)).like(pattern))
            .add(lower((customers::Entity, customers::Column::Phone)).like(pattern));

        if let Some((first, last)) = &terms.name_pair {
            condition = condition.add(
                Condition::all()
                    .add(lower((customers::Entity, customers::Column::FirstName)).eq(first.as_str()))
                    .add(lower((customers::Entity, customers::Column::LastName)).eq(last.as_str())),
            );
        }

        let mut query = invoices::Entity::find()
            .join(JoinType::InnerJoin, invoices::Relation::Customers.def())
            .filter(condition);

        if let Some(organization_id) = organization_id {
            query = query.filter(invoices::Column::OrganizationId.eq(organization_id.into_inner()));
        }

        self.paginate(query, page).await
    }

    /// Counts invoices in total and per status.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn count_invoices(
        &self,
        organization_id: Option<OrganizationId>,
    ) -> Result<InvoiceCounts, DbErr> {
        let mut counts = InvoiceCounts::default();

        for status in InvoiceStatus::ALL {
            let mut query =
                invoices::Entity::find().filter(invoices::Column::Status.eq(DbInvoiceStatus::from(status)));
            if let Some(organization_id) = organization_id {
                query = query.filter(invoices::Column::OrganizationId.eq(organization_id.into_inner()));
            }
            counts.record(status, query.count(&self.db).await?);
        }

        Ok(counts)
    }

    async fn paginate(
        &self,
        query: Select<invoices::Entity>,
        page: PageRequest,
    ) -> Result<PageResponse<invoices::Model>, DbErr> {
        let total = query.clone().count(&self.db).await?;

        let data = query
            .order_by_asc(invoices::Column::Id)
            .offset(page.offset())
            .limit(page.limit())
            .all(&self.db)
            .await?;

        Ok(PageResponse::new(data, page, total))
    }

    // ========================================================================
    // Updates
    // ========================================================================

    /// Applies an allow-listed partial update.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound`, `AlreadyCancelled` for cancelled invoices, a
    /// validation error if the merged terms break a rule, or a database error.
    pub async fn update_invoice(
        &self,
        id: InvoiceId,
        update: &InvoiceUpdate,
    ) -> Result<invoices::Model, InvoiceRepoError> {
        let txn = self.db.begin().await?;

        let invoice = lock_invoice(&txn, id).await?;
        InvoiceService::ensure_can_update(id, invoice.status.into())?;

        let next = update.apply(&terms_of(&invoice))?;

        let mut active = invoice.into_active_model();
        active.invoice_date = Set(next.invoice_date);
        active.due_date = Set(next.due_date);
        active.total_amount = Set(next.amounts.total_amount);
        active.discount_amount = Set(next.amounts.discount_amount);
        active.tax_amount = Set(next.amounts.tax_amount);
        active.advance_amount = Set(next.amounts.advance_amount);
        active.due_amount = Set(next.amounts.due_amount);
        active.status = Set(next.status.into());
        active.notes = Set(next.notes);
        let updated = active.update(&txn).await?;

        txn.commit().await?;

        debug!(
            invoice_id = %id,
            fields = ?update.fields(),
            "Invoice updated"
        );

        Ok(updated)
    }

    /// Cancels an invoice and returns its stock.
    ///
    /// The invoice number stays consumed.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound`, `AlreadyCancelled`, or a database error.
    pub async fn cancel_invoice(&self, id: InvoiceId) -> Result<invoices::Model, InvoiceRepoError> {
        let txn = self.db.begin().await?;

        let invoice = lock_invoice(&txn, id).await?;
        InvoiceService::ensure_can_cancel(id, invoice.status.into())?;

        let restocked = restock_lines(&txn, invoice.id).await?;

        let mut active = invoice.into_active_model();
        active.status = Set(DbInvoiceStatus::Cancelled);
        active.cancelled_at = Set(Some(Utc::now().into()));
        let cancelled = active.update(&txn).await?;

        txn.commit().await?;

        info!(
            invoice_id = %id,
            invoice_number = %cancelled.invoice_number,
            restocked_lines = restocked,
            "Invoice cancelled"
        );

        Ok(cancelled)
    }

    /// Deletes an invoice and its line items.
    ///
    /// Stock is returned unless the invoice was already cancelled.
    ///
    /// # Errors
    ///
    /// Returns `InvoiceNotFound` or a database error.
    pub async fn delete_invoice(&self, id: InvoiceId) -> Result<(), InvoiceRepoError> {
        let txn = self.db.begin().await?;

        let invoice = lock_invoice(&txn, id).await?;
        let status: InvoiceStatus = invoice.status.into();

        let restocked = if InvoiceService::restock_on_delete(status) {
            restock_lines(&txn, invoice.id).await?
        } else {
            0
        };

        invoices::Entity::delete_by_id(invoice.id).exec(&txn).await?;
        txn.commit().await?;

        info!(
            invoice_id = %id,
            invoice_number = %invoice.invoice_number,
            restocked_lines = restocked,
            "Invoice deleted"
        );

        Ok(())
    }
}

fn lower<T: sea_orm::sea_query::IntoColumnRef>(column: T) -> Expr {
    Expr::expr(Func::lower(Expr::col(column)))
}

async fn lock_invoice(txn: &DatabaseTransaction, id: InvoiceId) -> Result<invoices::Model, InvoiceRepoError> {
    let invoice = invoices::Entity::find_by_id(id.into_inner())
        .lock_exclusive()
        .one(txn)
        .await?
        .ok_or(InvoiceError::InvoiceNotFound(id))?;
    Ok(invoice)
}

async fn restock_lines(txn: &DatabaseTransaction, invoice_id: Uuid) -> Result<usize, InvoiceRepoError> {
    let lines = invoice_line_items::Entity::find()
        .filter(invoice_line_items::Column::InvoiceId.eq(invoice_id))
        .all(txn)
        .await?;

    // Same lock order as issuance.
    let returns = merge_stock_demand(
        lines
            .iter()
            .map(|line| (ProductId::from_uuid(line.product_id), line.quantity)),
    )?;
    for demand in &returns {
        StockLedger::restock(txn, demand.product_id, demand.quantity).await?;
    }
    Ok(lines.len())
}

fn terms_of(invoice: &invoices::Model) -> InvoiceTerms {
    InvoiceTerms {
        invoice_date: invoice.invoice_date,
        due_date: invoice.due_date,
        amounts: InvoiceAmounts {
            total_amount: invoice.total_amount,
            discount_amount: invoice.discount_amount,
            tax_amount: invoice.tax_amount,
            advance_amount: invoice.advance_amount,
            due_amount: invoice.due_amount,
        },
        status: invoice.status.into(),
        notes: invoice.notes.clone(),
    }
}

fn product_fk_error(err: DbErr, product_id: ProductId) -> InvoiceRepoError {
    match err.sql_err() {
        Some(sea_orm::SqlErr::ForeignKeyConstraintViolation(_)) => {
            InvoiceError::ProductNotFound(product_id).into()
        }
        _ => InvoiceRepoError::from_write(err),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use invoicer_core::invoice::{LineItemInput, ShippingAddress};
    use invoicer_core::tax::TaxType;
    use invoicer_shared::types::CustomerId;
    use rust_decimal_macros::dec;

    fn input(line_items: Vec<LineItemInput>) -> IssueInvoiceInput {
        IssueInvoiceInput {
            organization_id: OrganizationId::new(),
            customer_id: CustomerId::new(),
            invoice_date: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            due_date: None,
            amounts: InvoiceAmounts {
                total_amount: dec!(100),
                ..InvoiceAmounts::default()
            },
            tax_registration: "29ABCDE1234F1Z5".into(),
            tax_type: TaxType::IntraState,
            shipping_address: ShippingAddress {
                line1: "12 MG Road".into(),
                ..ShippingAddress::default()
            },
            notes: None,
            line_items,
        }
    }

    // A disconnected handle fails every statement, so a validation error
    // proves the request was rejected before storage was reached.
    fn offline() -> InvoiceRepository {
        InvoiceRepository::new(DatabaseConnection::Disconnected)
    }

    #[tokio::test]
    async fn test_empty_line_items_never_touch_storage() {
        let err = offline().issue_invoice(input(vec![])).await.unwrap_err();

        assert!(matches!(
            err,
            InvoiceRepoError::Invoice(InvoiceError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_fractional_quantity_never_touches_storage() {
        let err = offline()
            .issue_invoice(input(vec![LineItemInput {
                product_id: ProductId::new(),
                quantity: dec!(1.5),
                unit_price: dec!(10),
            }]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), invoicer_core::invoice::ErrorKind::Validation);
    }

    #[tokio::test]
    async fn test_offline_issuance_is_storage_failure() {
        let err = offline()
            .issue_invoice(input(vec![LineItemInput {
                product_id: ProductId::new(),
                quantity: dec!(1),
                unit_price: dec!(100),
            }]))
            .await
            .unwrap_err();

        assert_eq!(err.kind(), invoicer_core::invoice::ErrorKind::StorageFailure);
    }

    #[test]
    fn test_terms_of_reads_header() {
        let now = Utc::now().into();
        let invoice = invoices::Model {
            id: Uuid::now_v7(),
            invoice_number: "ACME/29/MAR/2024/0001".into(),
            organization_id: Uuid::nil(),
            customer_id: Uuid::nil(),
            tax_registration_number: "29ABCDE1234F1Z5".into(),
            tax_type: DbTaxType::IntraState,
            sequence_number: 1,
            invoice_date: NaiveDate::from_ymd_opt(2024, 3, 14).unwrap(),
            due_date: None,
            total_amount: dec!(118),
            discount_amount: dec!(0),
            tax_amount: dec!(18),
            advance_amount: dec!(18),
            due_amount: dec!(100),
            status: DbInvoiceStatus::PartiallyPaid,
            shipping_address: serde_json::json!({ "line1": "12 MG Road" }),
            notes: Some("net 30".into()),
            created_at: now,
            updated_at: now,
            cancelled_at: None,
        };

        let terms = terms_of(&invoice);
        assert_eq!(terms.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(terms.amounts.due_amount, dec!(100));
        assert_eq!(terms.notes.as_deref(), Some("net 30"));
    }
}
