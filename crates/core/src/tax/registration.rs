//! Tax registration records.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A tax registration owned by an organization.
///
/// Each registration carries its own invoice sequence. `next_sequence` is the
/// value the next issued invoice under this registration will receive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaxRegistration {
    /// Registration ID.
    pub id: Uuid,
    /// Owning organization.
    pub organization_id: Uuid,
    /// Identifying value (e.g. a GSTIN), matched by exact equality.
    pub registration_number: String,
    /// Jurisdiction code of the registration.
    pub jurisdiction_code: String,
    /// Display details, when present and well-formed.
    pub details: Option<RegistrationDetails>,
    /// Next sequence to hand out.
    pub next_sequence: i64,
}

/// Display fields stored alongside a registration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RegistrationDetails {
    /// Registered legal name.
    pub legal_name: Option<String>,
    /// Trade name printed on invoices.
    pub trade_name: Option<String>,
    /// Registered address.
    pub address: Option<String>,
    /// State or territory name.
    pub state: Option<String>,
}

impl RegistrationDetails {
    /// Parses the stored JSON blob.
    ///
    /// # Errors
    ///
    /// Returns an error if the blob is not an object with the expected field types.
    pub fn from_json(value: &serde_json::Value) -> Result<Self, serde_json::Error> {
        if !value.is_object() {
            return Err(serde::de::Error::custom(
                "registration details must be a JSON object",
            ));
        }
        serde_json::from_value(value.clone())
    }
}

/// A sequence slot reserved for one invoice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReservedSequence {
    /// Registration the slot belongs to.
    pub registration_id: Uuid,
    /// Jurisdiction code stored on the registration.
    pub jurisdiction_code: String,
    /// The reserved sequence value.
    pub sequence: u64,
}

/// Returns the jurisdiction prefix for a registration value: its first two
/// characters.
///
/// Returns `None` for values shorter than two characters.
#[must_use]
pub fn jurisdiction_prefix(registration: &str) -> Option<String> {
    let prefix: String = registration.chars().take(2).collect();
    (prefix.chars().count() == 2).then_some(prefix)
}
