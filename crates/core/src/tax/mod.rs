//! Tax registrations and GST supply classification.
//!
//! - `registration` - Registration records, display details, and jurisdiction prefixes
//! - `classification` - State codes and intra/inter-state supply rules

pub mod classification;
pub mod registration;

pub use classification::{
    ClassificationError, SupplyClassification, TaxBreakdown, TaxType, classify_supply, state_code,
};
pub use registration::{RegistrationDetails, ReservedSequence, TaxRegistration, jurisdiction_prefix};
