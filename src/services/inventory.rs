use crate::{
    entities::{product, Product},
    errors::ServiceError,
    events::{Event, EventSender},
    services::cart::CartLineSnapshot,
};
use chrono::Utc;
use sea_orm::{
    sea_query::Expr, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Guards and mutates product stock.
///
/// Stock is only ever consumed through [`InventoryService::decrement_stock`],
/// a single conditioned UPDATE, so two concurrent checkouts can never both
/// take the last unit. [`InventoryService::validate_stock`] gives the early,
/// user-friendly rejection; the conditioned decrement is the authoritative
/// check at write time.
#[derive(Clone)]
pub struct InventoryService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl InventoryService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    /// Checks every requested line against the product's live
    /// `available_quantity`, using the caller's transaction so the read is
    /// not stale cart data. Any shortfall fails the whole set.
    pub async fn validate_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        lines: &[CartLineSnapshot],
    ) -> Result<(), ServiceError> {
        for line in lines {
            let product = Product::find_by_id(line.product_id)
                .one(conn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", line.product_id))
                })?;

            if line.quantity > product.available_quantity {
                return Err(ServiceError::InsufficientStock {
                    product_name: product.name,
                    available: product.available_quantity,
                    requested: line.quantity,
                });
            }
        }
        Ok(())
    }

    /// Subtracts `quantity` from the product's stock, conditioned on
    /// sufficient stock at write time:
    ///
    /// `UPDATE products SET available_quantity = available_quantity - q
    ///  WHERE id = ? AND available_quantity >= q`
    ///
    /// Zero affected rows means a concurrent checkout consumed the stock
    /// after validation; the caller must abort its transaction.
    pub async fn decrement_stock<C: ConnectionTrait>(
        &self,
        conn: &C,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<(), ServiceError> {
        let result = Product::update_many()
            .col_expr(
                product::Column::AvailableQuantity,
                Expr::col(product::Column::AvailableQuantity).sub(quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product_id))
            .filter(product::Column::AvailableQuantity.gte(quantity))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            // Lost a race after validation; re-read in the same transaction
            // so the error reports the quantity that actually remains.
            let product = Product::find_by_id(product_id)
                .one(conn)
                .await?
                .ok_or_else(|| {
                    ServiceError::NotFound(format!("Product {} not found", product_id))
                })?;

            warn!(
                %product_id,
                available = product.available_quantity,
                requested = quantity,
                "conditioned decrement affected no rows"
            );
            return Err(ServiceError::InsufficientStock {
                product_name: product.name,
                available: product.available_quantity,
                requested: quantity,
            });
        }

        Ok(())
    }

    /// The explicit stock-increase path.
    #[instrument(skip(self))]
    pub async fn restock(
        &self,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<product::Model, ServiceError> {
        if quantity <= 0 {
            return Err(ServiceError::InvalidOperation(
                "restock quantity must be positive".to_string(),
            ));
        }

        let result = Product::update_many()
            .col_expr(
                product::Column::AvailableQuantity,
                Expr::col(product::Column::AvailableQuantity).add(quantity),
            )
            .col_expr(product::Column::UpdatedAt, Expr::value(Utc::now()))
            .filter(product::Column::Id.eq(product_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} not found",
                product_id
            )));
        }

        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;

        self.event_sender
            .send_or_log(Event::ProductRestocked {
                product_id,
                quantity,
            })
            .await;

        info!(
            "Restocked product {}: +{} (now {})",
            product_id, quantity, product.available_quantity
        );
        Ok(product)
    }

    pub async fn available_quantity(&self, product_id: Uuid) -> Result<i32, ServiceError> {
        let product = Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))?;
        Ok(product.available_quantity)
    }
}
