//! Invoice number value type.

use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Minimum width of the zero-padded sequence segment.
pub const MIN_SEQUENCE_WIDTH: usize = 4;

const MONTHS: [&str; 12] = [
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];

const SEPARATOR: char = '/';

/// Errors returned when parsing an invoice number.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvoiceNumberError {
    /// The number does not have exactly five segments.
    #[error("Invoice number must have 5 segments, found {0}")]
    WrongSegmentCount(usize),

    /// The organization prefix is empty.
    #[error("Invoice number has an empty organization prefix")]
    EmptyPrefix,

    /// The jurisdiction segment is not exactly two characters.
    #[error("Invalid jurisdiction segment: {0}")]
    InvalidJurisdiction(String),

    /// The month segment is not a known abbreviation.
    #[error("Invalid month segment: {0}")]
    InvalidMonth(String),

    /// The year segment is not a four-digit year.
    #[error("Invalid year segment: {0}")]
    InvalidYear(String),

    /// The sequence segment is not a zero-padded number.
    #[error("Invalid sequence segment: {0}")]
    InvalidSequence(String),
}

/// A formatted, parseable invoice number.
///
/// ```
/// use chrono::{TimeZone, Utc};
/// use invoicer_core::numbering::InvoiceNumber;
///
/// let issued_at = Utc.with_ymd_and_hms(2024, 3, 14, 10, 0, 0).unwrap();
/// let number = InvoiceNumber::new("ACME", "29", issued_at, 7);
/// assert_eq!(number.to_string(), "ACME/29/MAR/2024/0007");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct InvoiceNumber {
    org_prefix: String,
    jurisdiction_prefix: String,
    month: u32,
    year: i32,
    sequence: u64,
}

impl InvoiceNumber {
    /// Builds the number for a sequence reserved at `issued_at`.
    ///
    /// Month and year come from the issuance instant in UTC, never from the
    /// invoice date chosen by the caller.
    #[must_use]
    pub fn new(
        org_prefix: &str,
        jurisdiction_prefix: &str,
        issued_at: DateTime<Utc>,
        sequence: u64,
    ) -> Self {
        Self {
            org_prefix: org_prefix.to_string(),
            jurisdiction_prefix: jurisdiction_prefix.to_string(),
            month: issued_at.month(),
            year: issued_at.year(),
            sequence,
        }
    }

    /// Organization prefix segment.
    #[must_use]
    pub fn org_prefix(&self) -> &str {
        &self.org_prefix
    }

    /// Jurisdiction segment.
    #[must_use]
    pub fn jurisdiction_prefix(&self) -> &str {
        &self.jurisdiction_prefix
    }

    /// Month of issuance (1-12).
    #[must_use]
    pub const fn month(&self) -> u32 {
        self.month
    }

    /// Uppercase three-letter month abbreviation.
    #[must_use]
    pub fn month_abbrev(&self) -> &'static str {
        MONTHS[(self.month as usize).saturating_sub(1) % MONTHS.len()]
    }

    /// Year of issuance.
    #[must_use]
    pub const fn year(&self) -> i32 {
        self.year
    }

    /// Registration sequence embedded in the number.
    #[must_use]
    pub const fn sequence(&self) -> u64 {
        self.sequence
    }
}

impl std::fmt::Display for InvoiceNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{prefix}{SEPARATOR}{jurisdiction}{SEPARATOR}{month}{SEPARATOR}{year:04}{SEPARATOR}{sequence:0width$}",
            prefix = self.org_prefix,
            jurisdiction = self.jurisdiction_prefix,
            month = self.month_abbrev(),
            year = self.year,
            sequence = self.sequence,
            width = MIN_SEQUENCE_WIDTH,
        )
    }
}

impl std::str::FromStr for InvoiceNumber {
    type Err = InvoiceNumberError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let segments: Vec<&str> = s.split(SEPARATOR).collect();
        let [prefix, jurisdiction, month, year, sequence] = segments[..] else {
            return Err(InvoiceNumberError::WrongSegmentCount(segments.len()));
        };

        if prefix.is_empty() {
            return Err(InvoiceNumberError::EmptyPrefix);
        }

        if jurisdiction.chars().count() != 2 {
            return Err(InvoiceNumberError::InvalidJurisdiction(jurisdiction.to_string()));
        }

        let month_index = MONTHS
            .iter()
            .position(|m| *m == month)
            .ok_or_else(|| InvoiceNumberError::InvalidMonth(month.to_string()))?;

        if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvoiceNumberError::InvalidYear(year.to_string()));
        }
        let year: i32 = year
            .parse()
            .map_err(|_| InvoiceNumberError::InvalidYear(year.to_string()))?;

        if sequence.len() < MIN_SEQUENCE_WIDTH || !sequence.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvoiceNumberError::InvalidSequence(sequence.to_string()));
        }
        let sequence: u64 = sequence
            .parse()
            .map_err(|_| InvoiceNumberError::InvalidSequence(sequence.to_string()))?;

        Ok(Self {
            org_prefix: prefix.to_string(),
            jurisdiction_prefix: jurisdiction.to_string(),
            #[allow(clippy::cast_possible_truncation)]
            month: month_index as u32 + 1,
            year,
            sequence,
        })
    }
}

/// Picks the organization's configured prefix, or the fallback when it is
/// missing or blank.
#[must_use]
pub fn resolve_org_prefix<'a>(configured: Option<&'a str>, fallback: &'a str) -> &'a str {
    configured
        .map(str::trim)
        .filter(|prefix| !prefix.is_empty())
        .unwrap_or(fallback)
}
