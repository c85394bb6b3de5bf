//! Tax registration directory and per-registration invoice sequences.

use invoicer_core::invoice::InvoiceError;
use invoicer_core::invoice::validation::validate_registration;
use invoicer_core::tax::{RegistrationDetails, ReservedSequence, TaxRegistration};
use invoicer_shared::types::OrganizationId;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DatabaseTransaction,
    DbBackend, DbErr, EntityTrait, FromQueryResult, QueryFilter, Set, Statement, Value,
};
use tracing::{debug, warn};
use uuid::Uuid;

use super::error::InvoiceRepoError;
use crate::entities::tax_registrations;

/// Increments the counter and hands back the value it held, under the row lock.
const RESERVE_SQL: &str = r"
UPDATE tax_registrations
SET next_sequence = next_sequence + 1
WHERE organization_id = $1 AND registration_number = $2
RETURNING id, jurisdiction_code, next_sequence - 1 AS sequence
";

#[derive(Debug, FromQueryResult)]
struct ReservedRow {
    id: Uuid,
    jurisdiction_code: String,
    sequence: i64,
}

/// Input for registering a tax registration.
#[derive(Debug, Clone)]
pub struct RegisterInput {
    /// Owning organization.
    pub organization_id: OrganizationId,
    /// Identifying value, e.g. a GSTIN.
    pub registration_number: String,
    /// Display details.
    pub details: Option<RegistrationDetails>,
    /// First sequence to hand out. Defaults to 1.
    pub start_sequence: Option<i64>,
}

/// Tax registration repository.
#[derive(Debug, Clone)]
pub struct TaxRegistrationRepository {
    db: DatabaseConnection,
}

impl TaxRegistrationRepository {
    /// Creates a new tax registration repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Creates a registration with its own sequence.
    ///
    /// # Errors
    ///
    /// Returns a validation error for a value shorter than two characters or
    /// containing `/`, or a start sequence below 1. Returns a conflict if the
    /// organization already has the value or another registration in the same
    /// jurisdiction.
    pub async fn register(&self, input: RegisterInput) -> Result<tax_registrations::Model, InvoiceRepoError> {
        let (registration_number, jurisdiction_code) =
            validate_registration(&input.registration_number)?;
        let next_sequence = input.start_sequence.unwrap_or(1);
        if next_sequence < 1 {
            return Err(InvoiceError::validation("start_sequence must be at least 1").into());
        }

        let details = input
            .details
            .map(|d| serde_json::to_value(d).map_err(|e| DbErr::Json(e.to_string())))
            .transpose()?;

        let now = chrono::Utc::now().into();
        let registration = tax_registrations::ActiveModel {
            id: Set(Uuid::now_v7()),
            organization_id: Set(input.organization_id.into_inner()),
            registration_number: Set(registration_number),
            jurisdiction_code: Set(jurisdiction_code),
            details: Set(details),
            next_sequence: Set(next_sequence),
            created_at: Set(now),
            updated_at: Set(now),
        };

        registration
            .insert(&self.db)
            .await
            .map_err(InvoiceRepoError::from_write)
    }

    /// Finds the registration whose stored value equals `registration`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find<C: ConnectionTrait>(
        conn: &C,
        organization_id: OrganizationId,
        registration: &str,
    ) -> Result<Option<tax_registrations::Model>, DbErr> {
        tax_registrations::Entity::find()
            .filter(tax_registrations::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(tax_registrations::Column::RegistrationNumber.eq(registration))
            .one(conn)
            .await
    }

    /// Resolves a registration by exact value.
    ///
    /// # Errors
    ///
    /// Returns `TaxRegistrationNotFound` if the organization has no such
    /// registration.
    pub async fn resolve(
        &self,
        organization_id: OrganizationId,
        registration: &str,
    ) -> Result<TaxRegistration, InvoiceRepoError> {
        Self::find(&self.db, organization_id, registration)
            .await?
            .map(to_domain)
            .ok_or_else(|| {
                InvoiceError::TaxRegistrationNotFound {
                    organization_id,
                    registration: registration.to_string(),
                }
                .into()
            })
    }

    /// Reserves the next sequence of a registration inside `txn`.
    ///
    /// The row stays locked until `txn` ends, so concurrent reservations on
    /// the same registration queue behind it. Rolling back releases the value.
    ///
    /// # Errors
    ///
    /// Returns `TaxRegistrationNotFound` if no row matched.
    pub async fn reserve(
        &self,
        txn: &DatabaseTransaction,
        organization_id: OrganizationId,
        registration: &str,
    ) -> Result<ReservedSequence, InvoiceRepoError> {
        let row = ReservedRow::find_by_statement(Statement::from_sql_and_values(
            DbBackend::Postgres,
            RESERVE_SQL,
            [Value::from(organization_id.into_inner()), Value::from(registration)],
        ))
        .one(txn)
        .await?
        .ok_or_else(|| InvoiceError::TaxRegistrationNotFound {
            organization_id,
            registration: registration.to_string(),
        })?;

        let sequence = u64::try_from(row.sequence)
            .map_err(|_| DbErr::Custom(format!("negative sequence on registration {}", row.id)))?;

        debug!(
            registration_id = %row.id,
            sequence,
            "Reserved invoice sequence"
        );

        Ok(ReservedSequence {
            registration_id: row.id,
            jurisdiction_code: row.jurisdiction_code,
            sequence,
        })
    }
}

/// Converts a stored row, dropping display details that fail to parse.
pub(crate) fn to_domain(model: tax_registrations::Model) -> TaxRegistration {
    let details = match model.details.as_ref().map(RegistrationDetails::from_json) {
        Some(Ok(details)) => Some(details),
        Some(Err(e)) => {
            warn!(
                registration_id = %model.id,
                error = %e,
                "Malformed tax registration details"
            );
            None
        }
        None => None,
    };

    TaxRegistration {
        id: model.id,
        organization_id: model.organization_id,
        registration_number: model.registration_number,
        jurisdiction_code: model.jurisdiction_code,
        details,
        next_sequence: model.next_sequence,
    }
}
