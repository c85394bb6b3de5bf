//! Integration tests for the stock ledger and the stock effects of
//! cancellation and deletion.

mod common;

use invoicer_core::invoice::{InvoiceError, InvoiceStatus};
use invoicer_db::entities::{invoice_line_items, invoices, sea_orm_active_enums};
use invoicer_db::{InvoiceRepoError, InvoiceRepository, StockLedger, TaxRegistrationRepository};
use invoicer_shared::types::{InvoiceId, OrganizationId, ProductId};
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter};

use common::{Fixture, REGISTRATION, connect, domain_error, seed};

async fn stock_of(fx: &Fixture, product_id: ProductId) -> i32 {
    StockLedger::new(fx.db.clone())
        .current_stock(product_id)
        .await
        .unwrap()
        .unwrap()
}

// ============================================================================
// Ledger
// ============================================================================

#[tokio::test]
async fn test_decrement_and_restock() {
    let Some(db) = connect().await else { return };
    let fx = seed(&db, None, &[10]).await;
    let product = fx.product_ids[0];

    StockLedger::try_decrement(&db, fx.organization_id, product, 4).await.unwrap();
    assert_eq!(stock_of(&fx, product).await, 6);

    StockLedger::try_decrement(&db, fx.organization_id, product, 6).await.unwrap();
    assert_eq!(stock_of(&fx, product).await, 0);

    StockLedger::restock(&db, product, 3).await.unwrap();
    assert_eq!(stock_of(&fx, product).await, 3);
}

#[tokio::test]
async fn test_decrement_beyond_stock_leaves_stock_unchanged() {
    let Some(db) = connect().await else { return };
    let fx = seed(&db, None, &[2]).await;
    let product = fx.product_ids[0];

    let err = StockLedger::try_decrement(&db, fx.organization_id, product, 3).await.unwrap_err();

    assert!(matches!(
        err,
        InvoiceRepoError::Invoice(InvoiceError::InsufficientStock { product_id, requested: 3 })
            if product_id == product
    ));
    assert_eq!(stock_of(&fx, product).await, 2);
}

#[tokio::test]
async fn test_decrement_unknown_product() {
    let Some(db) = connect().await else { return };
    let missing = ProductId::new();

    let err = StockLedger::try_decrement(&db, OrganizationId::new(), missing, 1).await.unwrap_err();
    assert_eq!(domain_error(err), InvoiceError::ProductNotFound(missing));

    let err = StockLedger::restock(&db, missing, 1).await.unwrap_err();
    assert_eq!(domain_error(err), InvoiceError::ProductNotFound(missing));

    let stock = StockLedger::new(db.clone()).current_stock(missing).await.unwrap();
    assert_eq!(stock, None);
}

#[tokio::test]
async fn test_decrement_rejects_non_positive_quantity() {
    let Some(db) = connect().await else { return };
    let fx = seed(&db, None, &[5]).await;

    for quantity in [0, -1] {
        let err = StockLedger::try_decrement(&db, fx.organization_id, fx.product_ids[0], quantity)
            .await
            .unwrap_err();
        assert!(matches!(err, InvoiceRepoError::Invoice(InvoiceError::Validation(_))));
    }
    assert_eq!(stock_of(&fx, fx.product_ids[0]).await, 5);
}

// ============================================================================
// Cancellation
// ============================================================================

#[tokio::test]
async fn test_cancel_restores_stock_once() {
    let Some(db) = connect().await else { return };
    let fx = seed(&db, Some("CNCL"), &[10, 10]).await;
    let repo = InvoiceRepository::new(db.clone());

    let issued = repo.issue_invoice(fx.input(&[(0, 3), (1, 2)])).await.unwrap();
    assert_eq!(stock_of(&fx, fx.product_ids[0]).await, 7);
    assert_eq!(stock_of(&fx, fx.product_ids[1]).await, 8);

    let cancelled = repo.cancel_invoice(issued.invoice_id).await.unwrap();
    assert_eq!(cancelled.status, sea_orm_active_enums::InvoiceStatus::Cancelled);
    assert!(cancelled.cancelled_at.is_some());
    assert_eq!(cancelled.invoice_number, issued.invoice_number);
    assert_eq!(stock_of(&fx, fx.product_ids[0]).await, 10);
    assert_eq!(stock_of(&fx, fx.product_ids[1]).await, 10);

    let err = repo.cancel_invoice(issued.invoice_id).await.unwrap_err();
    assert_eq!(
        domain_error(err),
        InvoiceError::AlreadyCancelled(issued.invoice_id)
    );
    assert_eq!(stock_of(&fx, fx.product_ids[0]).await, 10);
}

#[tokio::test]
async fn test_cancel_returns_repeated_product_lines() {
    let Some(db) = connect().await else { return };
    let fx = seed(&db, Some("RPT"), &[10]).await;
    let repo = InvoiceRepository::new(db.clone());

    let issued = repo.issue_invoice(fx.input(&[(0, 2), (0, 1)])).await.unwrap();
    assert_eq!(stock_of(&fx, fx.product_ids[0]).await, 7);

    repo.cancel_invoice(issued.invoice_id).await.unwrap();
    assert_eq!(stock_of(&fx, fx.product_ids[0]).await, 10);
}

#[tokio::test]
async fn test_cancelled_number_is_not_reused() {
    let Some(db) = connect().await else { return };
    let fx = seed(&db, Some("KEEP"), &[10]).await;
    let repo = InvoiceRepository::new(db.clone());

    let first = repo.issue_invoice(fx.input(&[(0, 1)])).await.unwrap();
    repo.cancel_invoice(first.invoice_id).await.unwrap();
    let second = repo.issue_invoice(fx.input(&[(0, 1)])).await.unwrap();

    assert!(first.invoice_number.ends_with("/0001"));
    assert!(second.invoice_number.ends_with("/0002"));

    let registration = TaxRegistrationRepository::new(db.clone())
        .resolve(fx.organization_id, REGISTRATION)
        .await
        .unwrap();
    assert_eq!(registration.next_sequence, 3);
}

#[tokio::test]
async fn test_cancel_unknown_invoice() {
    let Some(db) = connect().await else { return };
    let repo = InvoiceRepository::new(db.clone());
    let id = InvoiceId::new();

    let err = repo.cancel_invoice(id).await.unwrap_err();
    assert_eq!(domain_error(err), InvoiceError::InvoiceNotFound(id));
}

// ============================================================================
// Deletion
// ============================================================================

#[tokio::test]
async fn test_delete_restocks_and_cascades_lines() {
    let Some(db) = connect().await else { return };
    let fx = seed(&db, Some("DEL"), &[10, 10]).await;
    let repo = InvoiceRepository::new(db.clone());

    let issued = repo.issue_invoice(fx.input(&[(0, 4), (1, 1)])).await.unwrap();
    repo.delete_invoice(issued.invoice_id).await.unwrap();

    assert_eq!(stock_of(&fx, fx.product_ids[0]).await, 10);
    assert_eq!(stock_of(&fx, fx.product_ids[1]).await, 10);

    let header = invoices::Entity::find_by_id(issued.invoice_id.into_inner())
        .one(&db)
        .await
        .unwrap();
    assert!(header.is_none());

    let lines = invoice_line_items::Entity::find()
        .filter(invoice_line_items::Column::InvoiceId.eq(issued.invoice_id.into_inner()))
        .count(&db)
        .await
        .unwrap();
    assert_eq!(lines, 0);

    let err = repo.get_invoice(issued.invoice_id).await.unwrap_err();
    assert_eq!(
        domain_error(err),
        InvoiceError::InvoiceNotFound(issued.invoice_id)
    );
}

#[tokio::test]
async fn test_delete_cancelled_invoice_does_not_restock_twice() {
    let Some(db) = connect().await else { return };
    let fx = seed(&db, Some("DEL"), &[10]).await;
    let repo = InvoiceRepository::new(db.clone());

    let issued = repo.issue_invoice(fx.input(&[(0, 4)])).await.unwrap();
    repo.cancel_invoice(issued.invoice_id).await.unwrap();
    assert_eq!(stock_of(&fx, fx.product_ids[0]).await, 10);

    repo.delete_invoice(issued.invoice_id).await.unwrap();
    assert_eq!(stock_of(&fx, fx.product_ids[0]).await, 10);
}

#[tokio::test]
async fn test_delete_unknown_invoice() {
    let Some(db) = connect().await else { return };
    let repo = InvoiceRepository::new(db.clone());
    let id = InvoiceId::new();

    let err = repo.delete_invoice(id).await.unwrap_err();
    assert_eq!(domain_error(err), InvoiceError::InvoiceNotFound(id));
}

#[tokio::test]
async fn test_paid_invoice_can_still_be_cancelled() {
    let Some(db) = connect().await else { return };
    let fx = seed(&db, None, &[5]).await;
    let repo = InvoiceRepository::new(db.clone());

    let mut input = fx.input(&[(0, 2)]);
    input.amounts.advance_amount = input.amounts.total_amount;
    input.amounts.due_amount = rust_decimal::Decimal::ZERO;
    let issued = repo.issue_invoice(input).await.unwrap();

    let details = repo.get_invoice(issued.invoice_id).await.unwrap();
    assert_eq!(
        InvoiceStatus::from(details.invoice.status),
        InvoiceStatus::Paid
    );

    repo.cancel_invoice(issued.invoice_id).await.unwrap();
    assert_eq!(stock_of(&fx, fx.product_ids[0]).await, 5);
}
