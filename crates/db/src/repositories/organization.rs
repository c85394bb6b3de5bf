//! Organization repository for database operations.

use invoicer_shared::types::OrganizationId;
use sea_orm::{ActiveModelTrait, DatabaseConnection, DbErr, EntityTrait, Set};
use uuid::Uuid;

use crate::entities::organizations;

/// Input for creating an organization.
#[derive(Debug, Clone, Default)]
pub struct CreateOrganizationInput {
    /// Display name.
    pub name: String,
    /// Registered legal name.
    pub legal_name: Option<String>,
    /// Invoice number prefix.
    pub invoice_prefix: Option<String>,
    /// Contact email.
    pub email: Option<String>,
    /// Contact phone.
    pub phone: Option<String>,
    /// Postal address.
    pub address: Option<String>,
}

/// Organization repository for CRUD operations.
#[derive(Debug, Clone)]
pub struct OrganizationRepository {
    db: DatabaseConnection,
}

impl OrganizationRepository {
    /// Creates a new organization repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds an organization by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: OrganizationId) -> Result<Option<organizations::Model>, DbErr> {
        organizations::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Creates an organization.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, input: CreateOrganizationInput) -> Result<organizations::Model, DbErr> {
        let now = chrono::Utc::now().into();
        organizations::ActiveModel {
            id: Set(Uuid::now_v7()),
            name: Set(input.name),
            legal_name: Set(input.legal_name),
            invoice_prefix: Set(input.invoice_prefix),
            email: Set(input.email),
            phone: Set(input.phone),
            address: Set(input.address),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Sets or clears the invoice number prefix.
    ///
    /// # Errors
    ///
    /// Returns `DbErr::RecordNotFound` if the organization does not exist.
    pub async fn set_invoice_prefix(
        &self,
        id: OrganizationId,
        prefix: Option<&str>,
    ) -> Result<organizations::Model, DbErr> {
        let org = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| DbErr::RecordNotFound(format!("organization {id}")))?;

        let mut active: organizations::ActiveModel = org.into();
        active.invoice_prefix = Set(prefix.map(ToString::to_string));
        active.update(&self.db).await
    }
}
