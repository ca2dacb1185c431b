use crate::{
    config::CheckoutConfig,
    entities::{cart_item, CartItem, Product},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        payments::{lookup_method, PaymentMethodType},
        pricing::{self, OrderSummary},
    },
};
use chrono::Utc;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;

/// Immutable view of one cart line for the duration of a checkout attempt.
/// Carries the denormalized product data captured when the line was added.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartLineSnapshot {
    pub product_id: Uuid,
    pub product_name: String,
    pub unit_price: i64,
    pub discount_percent: i32,
    pub quantity: i32,
}

impl From<&cart_item::Model> for CartLineSnapshot {
    fn from(item: &cart_item::Model) -> Self {
        Self {
            product_id: item.product_id,
            product_name: item.product_name.clone(),
            unit_price: item.unit_price,
            discount_percent: item.discount_percent,
            quantity: item.quantity,
        }
    }
}

/// Input for adding a product to a cart
#[derive(Debug, Deserialize)]
pub struct AddToCartInput {
    pub product_id: Uuid,
    pub quantity: i32,
}

/// Cart-line data access for the storefront.
///
/// Each customer owns exactly one open cart, keyed by user id. Adding a line
/// snapshots the product's name, price and discount so later price edits do
/// not change what the customer was shown.
#[derive(Clone)]
pub struct CartService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    checkout_config: CheckoutConfig,
}

impl CartService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        checkout_config: CheckoutConfig,
    ) -> Self {
        Self {
            db,
            event_sender,
            checkout_config,
        }
    }

    /// Adds a product to the cart, merging quantities when the product is
    /// already present. Merging also refreshes the denormalized price data
    /// to the product's current values.
    #[instrument(skip(self))]
    pub async fn add_line(
        &self,
        user_id: Uuid,
        input: AddToCartInput,
    ) -> Result<cart_item::Model, ServiceError> {
        if input.quantity <= 0 {
            return Err(ServiceError::ValidationError(
                "quantity must be positive".to_string(),
            ));
        }

        let txn = self.db.begin().await?;

        let product = Product::find_by_id(input.product_id)
            .one(&txn)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} not found", input.product_id))
            })?;

        let existing = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(input.product_id))
            .one(&txn)
            .await?;

        let line = if let Some(item) = existing {
            let quantity = item.quantity + input.quantity;
            let mut item: cart_item::ActiveModel = item.into();
            item.quantity = Set(quantity);
            item.product_name = Set(product.name.clone());
            item.unit_price = Set(product.price);
            item.discount_percent = Set(product.discount_percent);
            item.updated_at = Set(Utc::now());
            item.update(&txn).await?
        } else {
            let item = cart_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                user_id: Set(user_id),
                product_id: Set(input.product_id),
                quantity: Set(input.quantity),
                product_name: Set(product.name.clone()),
                unit_price: Set(product.price),
                discount_percent: Set(product.discount_percent),
                created_at: Set(Utc::now()),
                updated_at: Set(Utc::now()),
            };
            item.insert(&txn).await?
        };

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::CartLineAdded {
                user_id,
                product_id: input.product_id,
            })
            .await;

        info!(
            "Added to cart for {}: product {} x{}",
            user_id, input.product_id, input.quantity
        );
        Ok(line)
    }

    /// Sets a line's quantity; zero or less removes the line.
    #[instrument(skip(self))]
    pub async fn set_line_quantity(
        &self,
        user_id: Uuid,
        product_id: Uuid,
        quantity: i32,
    ) -> Result<Option<cart_item::Model>, ServiceError> {
        if quantity <= 0 {
            self.remove_line(user_id, product_id).await?;
            return Ok(None);
        }

        let item = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .one(&*self.db)
            .await?
            .ok_or_else(|| {
                ServiceError::NotFound(format!("Product {} is not in the cart", product_id))
            })?;

        let mut item: cart_item::ActiveModel = item.into();
        item.quantity = Set(quantity);
        item.updated_at = Set(Utc::now());
        let updated = item.update(&*self.db).await?;

        Ok(Some(updated))
    }

    #[instrument(skip(self))]
    pub async fn remove_line(&self, user_id: Uuid, product_id: Uuid) -> Result<(), ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .filter(cart_item::Column::ProductId.eq(product_id))
            .exec(&*self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(ServiceError::NotFound(format!(
                "Product {} is not in the cart",
                product_id
            )));
        }

        self.event_sender
            .send_or_log(Event::CartLineRemoved {
                user_id,
                product_id,
            })
            .await;

        Ok(())
    }

    /// The customer's current cart lines, oldest first.
    pub async fn snapshot_for_user(
        &self,
        user_id: Uuid,
    ) -> Result<Vec<cart_item::Model>, ServiceError> {
        let items = CartItem::find()
            .filter(cart_item::Column::UserId.eq(user_id))
            .order_by_asc(cart_item::Column::CreatedAt)
            .all(&*self.db)
            .await?;
        Ok(items)
    }

    /// Deletes every cart line the customer owns, on the caller's
    /// connection. During checkout this runs as the last write inside the
    /// order transaction so the cart can never outlive its order, nor
    /// vanish without one.
    pub async fn clear_for_user<C: ConnectionTrait>(
        &self,
        conn: &C,
        user_id: Uuid,
    ) -> Result<u64, ServiceError> {
        let result = CartItem::delete_many()
            .filter(cart_item::Column::UserId.eq(user_id))
            .exec(conn)
            .await?;
        Ok(result.rows_affected)
    }

    /// Recomputes the pricing breakdown for the customer's cart. Safe to
    /// call on every mutation; this is what the storefront polls for live
    /// totals.
    pub async fn live_summary(
        &self,
        user_id: Uuid,
        method: Option<PaymentMethodType>,
    ) -> Result<OrderSummary, ServiceError> {
        let items = self.snapshot_for_user(user_id).await?;
        let lines: Vec<CartLineSnapshot> = items.iter().map(CartLineSnapshot::from).collect();
        let method = method.map(lookup_method);
        Ok(pricing::calculate_summary(
            &lines,
            method,
            &self.checkout_config,
            Utc::now(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_copies_denormalized_fields() {
        let item = cart_item::Model {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            product_id: Uuid::new_v4(),
            quantity: 3,
            product_name: "Hydrating Shampoo".to_string(),
            unit_price: 1_450,
            discount_percent: 15,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };

        let snapshot = CartLineSnapshot::from(&item);
        assert_eq!(snapshot.product_id, item.product_id);
        assert_eq!(snapshot.product_name, "Hydrating Shampoo");
        assert_eq!(snapshot.unit_price, 1_450);
        assert_eq!(snapshot.discount_percent, 15);
        assert_eq!(snapshot.quantity, 3);
    }

    #[test]
    fn add_to_cart_input_deserializes() {
        let json = r#"{
            "product_id": "550e8400-e29b-41d4-a716-446655440000",
            "quantity": 2
        }"#;
        let input: AddToCartInput = serde_json::from_str(json).expect("valid payload");
        assert_eq!(input.quantity, 2);
    }
}
