//! Property-based tests for invoice number formatting.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;
use std::str::FromStr;

use crate::numbering::{InvoiceNumber, MIN_SEQUENCE_WIDTH};

fn arb_prefix() -> impl Strategy<Value = String> {
    "[A-Z]{1,6}"
}

fn arb_jurisdiction() -> impl Strategy<Value = String> {
    "[0-9]{2}"
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// The sequence segment is at least four digits and carries the exact value.
    #[test]
    fn prop_sequence_segment_is_padded(sequence in 1u64..10_000_000u64) {
        let issued_at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let number = InvoiceNumber::new("ACME", "29", issued_at, sequence).to_string();
        let segment = number.rsplit('/').next().unwrap();

        prop_assert!(segment.len() >= MIN_SEQUENCE_WIDTH);
        prop_assert_eq!(segment.parse::<u64>().unwrap(), sequence);
    }

    /// Distinct sequences never produce the same number.
    #[test]
    fn prop_distinct_sequences_distinct_numbers(a in 1u64..1_000_000u64, b in 1u64..1_000_000u64) {
        prop_assume!(a != b);
        let issued_at = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        let left = InvoiceNumber::new("ACME", "29", issued_at, a).to_string();
        let right = InvoiceNumber::new("ACME", "29", issued_at, b).to_string();
        prop_assert_ne!(left, right);
    }

    /// Every formatted number parses back to the same parts.
    #[test]
    fn prop_formatted_numbers_parse(
        prefix in arb_prefix(),
        jurisdiction in arb_jurisdiction(),
        year in 2000i32..2100i32,
        month in 1u32..=12u32,
        sequence in 1u64..1_000_000u64,
    ) {
        let issued_at = Utc.with_ymd_and_hms(year, month, 1, 12, 0, 0).unwrap();
        let number = InvoiceNumber::new(&prefix, &jurisdiction, issued_at, sequence);
        let parsed = InvoiceNumber::from_str(&number.to_string()).unwrap();

        prop_assert_eq!(parsed, number);
    }

    /// The month segment is always a three-letter uppercase abbreviation.
    #[test]
    fn prop_month_segment_uppercase(month in 1u32..=12u32) {
        let issued_at = Utc.with_ymd_and_hms(2030, month, 1, 0, 0, 0).unwrap();
        let number = InvoiceNumber::new("ACME", "29", issued_at, 1);
        let abbrev = number.month_abbrev();

        prop_assert_eq!(abbrev.len(), 3);
        prop_assert!(abbrev.chars().all(|c| c.is_ascii_uppercase()));
    }
}
