//! Property-based tests for issuance validation.

use proptest::prelude::*;
use invoicer_shared::types::ProductId;
use rust_decimal::Decimal;

use super::service::InvoiceService;
use super::types::{InvoiceAmounts, InvoiceStatus, LineItemInput};
use super::validation::{validate_amounts, validate_line_items};

/// Strategy for a non-negative money amount with two decimal places.
fn money() -> impl Strategy<Value = Decimal> {
    (0i64..100_000_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

fn valid_line() -> impl Strategy<Value = LineItemInput> {
    (1i32..10_000i32, money()).prop_map(|(quantity, unit_price)| LineItemInput {
        product_id: ProductId::new(),
        quantity: Decimal::from(quantity),
        unit_price,
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Valid lines keep their order and each total is quantity times price.
    #[test]
    fn prop_valid_lines_preserve_order(lines in prop::collection::vec(valid_line(), 1..20)) {
        let validated = validate_line_items(&lines).unwrap();

        prop_assert_eq!(validated.len(), lines.len());
        for (index, (input, line)) in lines.iter().zip(&validated).enumerate() {
            prop_assert_eq!(line.position, i32::try_from(index).unwrap());
            prop_assert_eq!(line.product_id, input.product_id);
            prop_assert_eq!(Decimal::from(line.quantity), input.quantity);
            prop_assert_eq!(line.line_total, input.quantity * input.unit_price);
        }
    }

    /// A single fractional quantity anywhere in the list rejects the whole request.
    #[test]
    fn prop_fractional_quantity_rejected(
        mut lines in prop::collection::vec(valid_line(), 1..10),
        index in any::<prop::sample::Index>(),
        whole in 0i64..1000i64,
        tenths in 1i64..10i64,
    ) {
        let slot = index.index(lines.len());
        lines[slot].quantity = Decimal::new(whole * 10 + tenths, 1);
        prop_assert!(validate_line_items(&lines).is_err());
    }

    /// Non-positive quantities are rejected.
    #[test]
    fn prop_non_positive_quantity_rejected(quantity in -10_000i64..=0i64, price in money()) {
        let lines = vec![LineItemInput {
            product_id: ProductId::new(),
            quantity: Decimal::from(quantity),
            unit_price: price,
        }];
        prop_assert!(validate_line_items(&lines).is_err());
    }

    /// Advance above total is always rejected; at or below is accepted.
    #[test]
    fn prop_advance_bounded_by_total(total in money(), advance in money()) {
        let amounts = InvoiceAmounts {
            total_amount: total,
            advance_amount: advance,
            ..InvoiceAmounts::default()
        };
        prop_assert_eq!(validate_amounts(&amounts).is_ok(), advance <= total);
    }

    /// Initial status is consistent with the advance paid.
    #[test]
    fn prop_initial_status_matches_advance(total in money(), advance in money()) {
        prop_assume!(advance <= total);
        let amounts = InvoiceAmounts {
            total_amount: total,
            advance_amount: advance,
            ..InvoiceAmounts::default()
        };

        let status = InvoiceService::initial_status(&amounts);
        if advance == total {
            prop_assert_eq!(status, InvoiceStatus::Paid);
        } else if advance.is_zero() {
            prop_assert_eq!(status, InvoiceStatus::Pending);
        } else {
            prop_assert_eq!(status, InvoiceStatus::PartiallyPaid);
        }
    }
}
