//! Stock ledger: conditional decrements and compensating restocks.

use invoicer_core::invoice::InvoiceError;
use invoicer_shared::types::{OrganizationId, ProductId};
use sea_orm::sea_query::Expr;
use sea_orm::{
    ColumnTrait, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QuerySelect,
};

use super::error::InvoiceRepoError;
use crate::entities::products;

/// Stock ledger over `products.current_stock`.
#[derive(Debug, Clone)]
pub struct StockLedger {
    db: DatabaseConnection,
}

impl StockLedger {
    /// Creates a new stock ledger.
    #[must_use]
    pub const fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    /// Removes `quantity` units from a product of `organization_id`, only if
    /// that many are on hand.
    ///
    /// A single conditional `UPDATE` does the check and the write, so stock
    /// can never go negative no matter how many issuances race.
    ///
    /// # Errors
    ///
    /// Returns `InsufficientStock` when fewer than `quantity` units remain and
    /// `ProductNotFound` when the organization has no such product.
    pub async fn try_decrement<C: ConnectionTrait>(
        conn: &C,
        organization_id: OrganizationId,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), InvoiceRepoError> {
        if quantity <= 0 {
            return Err(InvoiceError::validation("quantity must be positive").into());
        }

        let result = products::Entity::update_many()
            .col_expr(
                products::Column::CurrentStock,
                Expr::col(products::Column::CurrentStock).sub(quantity),
            )
            .filter(products::Column::Id.eq(product_id.into_inner()))
            .filter(products::Column::OrganizationId.eq(organization_id.into_inner()))
            .filter(products::Column::CurrentStock.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            let exists = products::Entity::find_by_id(product_id.into_inner())
                .filter(products::Column::OrganizationId.eq(organization_id.into_inner()))
                .one(conn)
                .await?
                .is_some();
            let err = if exists {
                InvoiceError::InsufficientStock {
                    product_id,
                    requested: quantity,
                }
            } else {
                InvoiceError::ProductNotFound(product_id)
            };
            return Err(err.into());
        }

        Ok(())
    }

    /// Returns `quantity` units to a product.
    ///
    /// # Errors
    ///
    /// Returns `ProductNotFound` when the product does not exist.
    pub async fn restock<C: ConnectionTrait>(
        conn: &C,
        product_id: ProductId,
        quantity: i32,
    ) -> Result<(), InvoiceRepoError> {
        let result = products::Entity::update_many()
            .col_expr(
                products::Column::CurrentStock,
                Expr::col(products::Column::CurrentStock).add(quantity),
            )
            .filter(products::Column::Id.eq(product_id.into_inner()))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(InvoiceError::ProductNotFound(product_id).into());
        }
        Ok(())
    }

    /// Reads the stock on hand for a product.
    ///
    /// # Errors
    ///
    /// Returns an error if the database query fails.
    pub async fn current_stock(&self, product_id: ProductId) -> Result<Option<i32>, DbErr> {
        products::Entity::find_by_id(product_id.into_inner())
            .select_only()
            .column(products::Column::CurrentStock)
            .into_tuple::<i32>()
            .one(&self.db)
            .await
    }
}
