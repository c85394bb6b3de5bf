//! Customer reads and shipping address snapshots.

use invoicer_core::invoice::{InvoiceError, ShippingAddress};
use invoicer_shared::types::CustomerId;
use sea_orm::sea_query::Expr;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait,
    QueryFilter, Set,
};
use uuid::Uuid;

use super::error::InvoiceRepoError;
use crate::entities::customers;

/// Input for creating a customer.
#[derive(Debug, Clone, Default)]
pub struct CreateCustomerInput {
    /// First name.
    pub first_name: String,
    /// Last name.
    pub last_name: String,
    /// Email address.
    pub email: Option<String>,
    /// Phone number.
    pub phone: Option<String>,
    /// Free-form tax details.
    pub tax_details: Option<serde_json::Value>,
}

/// Customer repository.
#[derive(Debug, Clone)]
pub struct CustomerRepository {
    db: DatabaseConnection,
}

impl CustomerRepository {
    /// Creates a new customer repository.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Finds a customer by ID.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn find_by_id(&self, id: CustomerId) -> Result<Option<customers::Model>, DbErr> {
        customers::Entity::find_by_id(id.into_inner()).one(&self.db).await
    }

    /// Creates a customer.
    ///
    /// # Errors
    ///
    /// Returns an error if the database insert fails.
    pub async fn create(&self, input: CreateCustomerInput) -> Result<customers::Model, DbErr> {
        let now = chrono::Utc::now().into();
        customers::ActiveModel {
            id: Set(Uuid::now_v7()),
            first_name: Set(input.first_name),
            last_name: Set(input.last_name),
            email: Set(input.email),
            phone: Set(input.phone),
            tax_details: Set(input.tax_details),
            shipping_address: Set(None),
            created_at: Set(now),
            updated_at: Set(now),
        }
        .insert(&self.db)
        .await
    }

    /// Overwrites the customer's stored shipping address.
    ///
    /// # Errors
    ///
    /// Returns `CustomerNotFound` if no row was updated.
    pub async fn set_shipping_snapshot<C: ConnectionTrait>(
        conn: &C,
        customer_id: CustomerId,
        address: &ShippingAddress,
    ) -> Result<(), InvoiceRepoError> {
        let snapshot = serde_json::to_value(address).map_err(|e| DbErr::Json(e.to_string()))?;

        let result = customers::Entity::update_many()
            .col_expr(customers::Column::ShippingAddress, Expr::value(snapshot))
            .filter(customers::Column::Id.eq(customer_id.into_inner()))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(InvoiceError::CustomerNotFound(customer_id).into());
        }
        Ok(())
    }
}
