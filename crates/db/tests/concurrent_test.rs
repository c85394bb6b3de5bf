//! Concurrent issuance stress tests.
//!
//! These tests verify that:
//! - Concurrent issuances on one registration receive distinct, gapless sequences
//! - Stock never goes negative when issuances race for the last units
//! - Issuances listing the same products in opposite orders do not deadlock

#![allow(clippy::cast_possible_wrap)]
#![allow(clippy::cast_sign_loss)]

mod common;

use std::collections::BTreeSet;
use std::sync::Arc;

use futures::future::join_all;
use invoicer_core::invoice::InvoiceError;
use invoicer_core::numbering::InvoiceNumber;
use invoicer_db::repositories::RegisterInput;
use invoicer_db::{InvoiceRepoError, InvoiceRepository, StockLedger, TaxRegistrationRepository};
use tokio::sync::Barrier;

use common::{REGISTRATION, connect, seed};

const NUM_ISSUANCES: usize = 20;

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issuances_get_distinct_sequences() {
    let Some(db) = connect().await else { return };
    let fx = Arc::new(seed(&db, Some("CONC"), &[1_000]).await);
    let repo = InvoiceRepository::new(db.clone());
    let barrier = Arc::new(Barrier::new(NUM_ISSUANCES));

    let mut handles = Vec::with_capacity(NUM_ISSUANCES);
    for _ in 0..NUM_ISSUANCES {
        let repo = repo.clone();
        let fx = Arc::clone(&fx);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            repo.issue_invoice(fx.input(&[(0, 1)])).await
        }));
    }

    let results = join_all(handles).await;

    let mut sequences = BTreeSet::new();
    for result in results {
        let issued = result.expect("task panicked").expect("issuance failed");
        let number: InvoiceNumber = issued.invoice_number.parse().unwrap();
        assert_eq!(number.org_prefix(), fx.prefix);
        assert!(sequences.insert(number.sequence()), "duplicate sequence {}", number.sequence());
    }

    let expected: BTreeSet<u64> = (1..=NUM_ISSUANCES as u64).collect();
    assert_eq!(sequences, expected);

    let registration = TaxRegistrationRepository::new(db.clone())
        .resolve(fx.organization_id, REGISTRATION)
        .await
        .unwrap();
    assert_eq!(registration.next_sequence, NUM_ISSUANCES as i64 + 1);

    let stock = StockLedger::new(db.clone())
        .current_stock(fx.product_ids[0])
        .await
        .unwrap();
    assert_eq!(stock, Some(1_000 - NUM_ISSUANCES as i32));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_issuances_never_oversell() {
    const STOCK: i32 = 5;

    let Some(db) = connect().await else { return };
    let fx = Arc::new(seed(&db, Some("OVER"), &[STOCK]).await);
    let repo = InvoiceRepository::new(db.clone());
    let barrier = Arc::new(Barrier::new(NUM_ISSUANCES));

    let mut handles = Vec::with_capacity(NUM_ISSUANCES);
    for _ in 0..NUM_ISSUANCES {
        let repo = repo.clone();
        let fx = Arc::clone(&fx);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            barrier.wait().await;
            repo.issue_invoice(fx.input(&[(0, 1)])).await
        }));
    }

    let mut succeeded = 0;
    let mut insufficient = 0;
    let mut issued_sequences = BTreeSet::new();
    for result in join_all(handles).await {
        match result.expect("task panicked") {
            Ok(issued) => {
                succeeded += 1;
                let number: InvoiceNumber = issued.invoice_number.parse().unwrap();
                issued_sequences.insert(number.sequence());
            }
            Err(InvoiceRepoError::Invoice(InvoiceError::InsufficientStock { .. })) => {
                insufficient += 1;
            }
            Err(other) => panic!("unexpected error: {other}"),
        }
    }

    assert_eq!(succeeded, STOCK as usize);
    assert_eq!(insufficient, NUM_ISSUANCES - STOCK as usize);

    // Failed issuances released their sequences, so the committed ones are gapless.
    let expected: BTreeSet<u64> = (1..=STOCK as u64).collect();
    assert_eq!(issued_sequences, expected);

    let stock = StockLedger::new(db.clone())
        .current_stock(fx.product_ids[0])
        .await
        .unwrap();
    assert_eq!(stock, Some(0));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_opposite_line_orders_do_not_deadlock() {
    const STOCK: i32 = 1_000;
    const SECOND_REGISTRATION: &str = "07ZZZZZ9999Z1Z9";

    let Some(db) = connect().await else { return };
    let fx = Arc::new(seed(&db, Some("LOCK"), &[STOCK, STOCK]).await);
    // A second registration, so issuances do not queue on one sequence row.
    TaxRegistrationRepository::new(db.clone())
        .register(RegisterInput {
            organization_id: fx.organization_id,
            registration_number: SECOND_REGISTRATION.to_string(),
            details: None,
            start_sequence: None,
        })
        .await
        .unwrap();

    let repo = InvoiceRepository::new(db.clone());
    let total = NUM_ISSUANCES * 2;
    let barrier = Arc::new(Barrier::new(total));

    let mut handles = Vec::with_capacity(total);
    for i in 0..total {
        let repo = repo.clone();
        let fx = Arc::clone(&fx);
        let barrier = Arc::clone(&barrier);
        handles.push(tokio::spawn(async move {
            let mut input = if i % 2 == 0 {
                fx.input(&[(0, 1), (1, 1)])
            } else {
                fx.input(&[(1, 1), (0, 1)])
            };
            if i % 4 >= 2 {
                input.tax_registration = SECOND_REGISTRATION.to_string();
            }
            barrier.wait().await;
            repo.issue_invoice(input).await
        }));
    }

    for result in join_all(handles).await {
        result.expect("task panicked").expect("issuance failed");
    }

    let ledger = StockLedger::new(db.clone());
    for product_id in &fx.product_ids {
        let stock = ledger.current_stock(*product_id).await.unwrap();
        assert_eq!(stock, Some(STOCK - total as i32));
    }
}
