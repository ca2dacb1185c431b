use crate::{
    config::CheckoutConfig,
    entities::{order, order_item, Order, OrderItem},
    errors::ServiceError,
    services::checkout::{order_number, tracking_reference},
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{DatabaseConnection, EntityTrait, ModelTrait};
use serde::Serialize;
use std::sync::Arc;
use uuid::Uuid;

/// Read-only projections over committed orders. Consumes what the checkout
/// transaction wrote; never mutates.
#[derive(Clone)]
pub struct OrderQueryService {
    db: Arc<DatabaseConnection>,
    checkout_config: CheckoutConfig,
}

#[derive(Debug, Serialize)]
pub struct InvoiceLine {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

/// Data behind a rendered invoice. Rendering itself (PDF/HTML) lives with
/// the presentation layer.
#[derive(Debug, Serialize)]
pub struct Invoice {
    pub order_id: Uuid,
    pub order_number: String,
    pub issued_at: DateTime<Utc>,
    pub customer_id: Uuid,
    pub payment_type: String,
    pub is_paid: bool,
    pub payment_reference: String,
    pub currency: String,
    pub amount: i64,
    pub lines: Vec<InvoiceLine>,
}

#[derive(Debug, Serialize)]
pub struct TrackingStep {
    pub status: String,
    pub at: DateTime<Utc>,
    pub reached: bool,
}

/// Synthetic status timeline derived from the order's commit time.
#[derive(Debug, Serialize)]
pub struct TrackingProjection {
    pub order_id: Uuid,
    pub order_number: String,
    pub tracking_reference: String,
    pub estimated_delivery: DateTime<Utc>,
    pub timeline: Vec<TrackingStep>,
}

impl OrderQueryService {
    pub fn new(db: Arc<DatabaseConnection>, checkout_config: CheckoutConfig) -> Self {
        Self {
            db,
            checkout_config,
        }
    }

    pub async fn get_order_with_items(
        &self,
        order_id: Uuid,
    ) -> Result<(order::Model, Vec<order_item::Model>), ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;
        let items = order.find_related(OrderItem).all(&*self.db).await?;
        Ok((order, items))
    }

    pub async fn invoice(&self, order_id: Uuid) -> Result<Invoice, ServiceError> {
        let (order, items) = self.get_order_with_items(order_id).await?;

        let lines = items
            .into_iter()
            .map(|item| InvoiceLine {
                product_id: item.product_id,
                product_name: item.product_name,
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.unit_price * i64::from(item.quantity),
            })
            .collect();

        Ok(Invoice {
            order_id: order.id,
            order_number: order_number(order.id),
            issued_at: order.created_at,
            customer_id: order.user_id,
            payment_type: order.payment_type,
            is_paid: order.is_paid,
            payment_reference: order.payment_reference,
            currency: self.checkout_config.currency.clone(),
            amount: order.amount,
            lines,
        })
    }

    pub async fn tracking(&self, order_id: Uuid) -> Result<TrackingProjection, ServiceError> {
        let order = Order::find_by_id(order_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Order {} not found", order_id)))?;

        let estimated_delivery =
            order.created_at + Duration::days(self.checkout_config.delivery_estimate_days);
        let now = Utc::now();

        let steps = [
            ("confirmed", order.created_at),
            ("processing", order.created_at + Duration::hours(12)),
            ("shipped", order.created_at + Duration::days(1)),
            ("out_for_delivery", estimated_delivery - Duration::hours(6)),
            ("delivered", estimated_delivery),
        ];

        let timeline = steps
            .into_iter()
            .map(|(status, at)| TrackingStep {
                status: status.to_string(),
                at,
                reached: at <= now,
            })
            .collect();

        Ok(TrackingProjection {
            order_id: order.id,
            order_number: order_number(order.id),
            tracking_reference: tracking_reference(order.id),
            estimated_delivery,
            timeline,
        })
    }
}
