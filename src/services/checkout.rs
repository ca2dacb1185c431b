use crate::{
    config::{CheckoutConfig, PaymentConfig},
    entities::{order, order_item, Order, OrderItem},
    errors::ServiceError,
    events::{Event, EventSender},
    services::{
        cart::{CartLineSnapshot, CartService},
        inventory::InventoryService,
        payments::{lookup_method, PaymentAuthorizer, PaymentDetails, PaymentMethod},
        pricing,
    },
};
use chrono::{DateTime, Duration, Utc};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait, ModelTrait, QueryFilter, Set,
    TransactionTrait,
};
use serde::{Deserialize, Serialize};
use std::{sync::Arc, time::Duration as StdDuration};
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

/// Customer identity and contact data for one checkout attempt.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CustomerDetails {
    #[validate(length(min = 1))]
    pub first_name: String,
    #[validate(length(min = 1))]
    pub last_name: String,
    #[validate(email)]
    pub email: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct DeliveryAddress {
    #[validate(length(min = 1))]
    pub street: String,
    #[validate(length(min = 1))]
    pub city: String,
    #[validate(length(min = 1))]
    pub postal_code: String,
    #[validate(length(min = 2))]
    pub country: String,
}

/// The client's own pricing computation, sent along for cross-checking.
#[derive(Debug, Clone, Deserialize)]
pub struct ClientSummary {
    pub total: i64,
}

/// Everything one checkout attempt needs. The acting customer arrives
/// explicitly with the request; nothing about the customer is ambient state.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CheckoutInput {
    pub user_id: Uuid,
    #[validate]
    pub customer: CustomerDetails,
    #[validate]
    pub delivery_address: DeliveryAddress,
    pub payment: PaymentDetails,
    /// Result of the external OTP verification, required by card methods
    #[serde(default)]
    pub otp_verified: bool,
    pub lines: Vec<CartLineSnapshot>,
    pub client_summary: Option<ClientSummary>,
    pub delivery_notes: Option<String>,
    pub preferred_delivery_time: Option<String>,
    /// Client-supplied retry token; replays return the original order
    pub idempotency_key: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfirmationItem {
    pub product_id: Uuid,
    pub product_name: String,
    pub quantity: i32,
    pub unit_price: i64,
    pub line_total: i64,
}

/// Response-only projection of a committed order.
#[derive(Debug, Clone, Serialize)]
pub struct OrderConfirmation {
    pub order_id: Uuid,
    pub order_number: String,
    pub status: String,
    pub payment_status: String,
    pub payment_type: String,
    pub amount: i64,
    pub currency: String,
    pub payment_reference: String,
    pub estimated_delivery: DateTime<Utc>,
    pub tracking_reference: String,
    pub items: Vec<ConfirmationItem>,
}

/// Orchestrates one checkout: validate, open a transaction, re-check
/// inventory, authorize payment, persist the order and its items, decrement
/// stock, clear the cart, commit. Every failure before commit rolls the
/// whole attempt back, so no partial state is ever observable.
#[derive(Clone)]
pub struct CheckoutService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
    authorizer: Arc<dyn PaymentAuthorizer>,
    cart_service: Arc<CartService>,
    inventory_service: Arc<InventoryService>,
    checkout_config: CheckoutConfig,
    payment_timeout: StdDuration,
}

impl CheckoutService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        authorizer: Arc<dyn PaymentAuthorizer>,
        cart_service: Arc<CartService>,
        inventory_service: Arc<InventoryService>,
        checkout_config: CheckoutConfig,
        payment_config: &PaymentConfig,
    ) -> Self {
        Self {
            db,
            event_sender,
            authorizer,
            cart_service,
            inventory_service,
            checkout_config,
            payment_timeout: StdDuration::from_secs(payment_config.timeout_secs),
        }
    }

    /// Runs one checkout attempt to a committed order or a clean abort.
    #[instrument(skip(self, input), fields(user_id = %input.user_id))]
    pub async fn process_checkout(
        &self,
        input: CheckoutInput,
    ) -> Result<OrderConfirmation, ServiceError> {
        // Pure validation; no transaction has been opened yet.
        let method = self.validate_input(&input)?;

        let now = Utc::now();
        let summary = pricing::calculate_summary(&input.lines, Some(method), &self.checkout_config, now);
        if let Some(client) = &input.client_summary {
            if client.total != summary.total {
                return Err(ServiceError::ValidationError(format!(
                    "order total mismatch: client computed {}, server computed {}",
                    client.total, summary.total
                )));
            }
        }

        let txn = self.db.begin().await?;

        // A replayed attempt finds the original order and charges nothing.
        if let Some(key) = &input.idempotency_key {
            if let Some(existing) = Order::find()
                .filter(order::Column::IdempotencyKey.eq(key.clone()))
                .one(&txn)
                .await?
            {
                let items = existing.find_related(OrderItem).all(&txn).await?;
                txn.commit().await?;
                info!(order_id = %existing.id, "idempotent replay, returning original order");
                return Ok(self.confirmation_for(&existing, &items));
            }
        }

        // Re-validate against live rows inside the transaction; the cart
        // snapshot may be stale by now.
        self.inventory_service
            .validate_stock(&txn, &input.lines)
            .await?;

        // Authorize before any write, so a decline never has anything to
        // undo and no order row ever exists without a successful payment.
        let authorization = match tokio::time::timeout(
            self.payment_timeout,
            self.authorizer.authorize(&input.payment, summary.total),
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => {
                warn!("payment authorization timed out");
                return Err(ServiceError::PaymentNetworkError(
                    "payment authorization timed out".to_string(),
                ));
            }
        };

        let order_id = Uuid::new_v4();
        let order = order::ActiveModel {
            id: Set(order_id),
            user_id: Set(input.user_id),
            description: Set(format!(
                "{} beauty product(s) for {} {}",
                summary.item_count, input.customer.first_name, input.customer.last_name
            )),
            payment_type: Set(method.method_type.as_str().to_string()),
            amount: Set(summary.total),
            is_paid: Set(!method.method_type.defers_payment()),
            payment_reference: Set(authorization.reference.clone()),
            idempotency_key: Set(input.idempotency_key.clone()),
            delivery_notes: Set(input.delivery_notes.clone()),
            created_at: Set(now),
            updated_at: Set(now),
        };
        let order = order.insert(&txn).await?;

        let mut items = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let item = order_item::ActiveModel {
                id: Set(Uuid::new_v4()),
                order_id: Set(order_id),
                product_id: Set(line.product_id),
                product_name: Set(line.product_name.clone()),
                quantity: Set(line.quantity),
                unit_price: Set(line.unit_price),
                created_at: Set(now),
            };
            items.push(item.insert(&txn).await?);

            // Defense in depth: the validator passed above, but another
            // checkout may have committed in between. Zero affected rows
            // here aborts the whole attempt.
            self.inventory_service
                .decrement_stock(&txn, line.product_id, line.quantity)
                .await?;
        }

        // Last write of the transaction: the cart disappears together with
        // the order becoming real, or not at all.
        self.cart_service.clear_for_user(&txn, input.user_id).await?;

        txn.commit().await?;

        self.event_sender
            .send_or_log(Event::PaymentAuthorized {
                reference: authorization.reference,
                amount: summary.total,
            })
            .await;
        for line in &input.lines {
            self.event_sender
                .send_or_log(Event::InventoryDecremented {
                    product_id: line.product_id,
                    quantity: line.quantity,
                })
                .await;
        }
        self.event_sender
            .send_or_log(Event::CartCleared(input.user_id))
            .await;
        self.event_sender
            .send_or_log(Event::OrderCreated(order_id))
            .await;
        self.event_sender
            .send_or_log(Event::CheckoutCompleted {
                order_id,
                user_id: input.user_id,
            })
            .await;

        info!(%order_id, amount = summary.total, "checkout committed");
        Ok(self.confirmation_for(&order, &items))
    }

    /// Step-one validation: reject before opening a transaction. Returns the
    /// catalog entry for the chosen method so later steps price against it.
    fn validate_input(&self, input: &CheckoutInput) -> Result<&'static PaymentMethod, ServiceError> {
        input.validate()?;

        if input.lines.is_empty() {
            return Err(ServiceError::ValidationError(
                "cart is empty".to_string(),
            ));
        }
        for line in &input.lines {
            if line.quantity <= 0 {
                return Err(ServiceError::ValidationError(format!(
                    "invalid quantity {} for product {}",
                    line.quantity, line.product_id
                )));
            }
            if line.unit_price < 0 {
                return Err(ServiceError::ValidationError(format!(
                    "invalid unit price for product {}",
                    line.product_id
                )));
            }
        }

        let method = lookup_method(input.payment.method);
        if !method.enabled {
            return Err(ServiceError::ValidationError(format!(
                "payment method {} is not available",
                method.method_type
            )));
        }
        if method.method_type.is_card() && input.payment.card.is_none() {
            return Err(ServiceError::ValidationError(
                "card details are required for card payments".to_string(),
            ));
        }
        if method.requires_verification && !input.otp_verified {
            return Err(ServiceError::ValidationError(format!(
                "payment method {} requires verification",
                method.method_type
            )));
        }
        if let Some(key) = &input.idempotency_key {
            if key.is_empty() {
                return Err(ServiceError::ValidationError(
                    "idempotency key must not be empty".to_string(),
                ));
            }
        }

        Ok(method)
    }

    fn confirmation_for(
        &self,
        order: &order::Model,
        items: &[order_item::Model],
    ) -> OrderConfirmation {
        let items = items
            .iter()
            .map(|item| ConfirmationItem {
                product_id: item.product_id,
                product_name: item.product_name.clone(),
                quantity: item.quantity,
                unit_price: item.unit_price,
                line_total: item.unit_price * i64::from(item.quantity),
            })
            .collect();

        OrderConfirmation {
            order_id: order.id,
            order_number: order_number(order.id),
            status: "confirmed".to_string(),
            payment_status: if order.is_paid {
                "paid".to_string()
            } else {
                "pay_on_delivery".to_string()
            },
            payment_type: order.payment_type.clone(),
            amount: order.amount,
            currency: self.checkout_config.currency.clone(),
            payment_reference: order.payment_reference.clone(),
            estimated_delivery: order.created_at
                + Duration::days(self.checkout_config.delivery_estimate_days),
            tracking_reference: tracking_reference(order.id),
            items,
        }
    }
}

/// Customer-facing order number, derived from the order id.
pub fn order_number(order_id: Uuid) -> String {
    let simple = order_id.simple().to_string();
    format!("SM-{}", simple[..8].to_uppercase())
}

/// Synthetic tracking reference, stable for a given order.
pub fn tracking_reference(order_id: Uuid) -> String {
    let simple = order_id.simple().to_string();
    format!("TRK-{}", simple[24..].to_uppercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_number_is_stable_and_prefixed() {
        let id = Uuid::new_v4();
        let a = order_number(id);
        let b = order_number(id);
        assert_eq!(a, b);
        assert!(a.starts_with("SM-"));
        assert_eq!(a.len(), 11);
    }

    #[test]
    fn tracking_reference_differs_from_order_number() {
        let id = Uuid::new_v4();
        assert_ne!(order_number(id), tracking_reference(id));
        assert!(tracking_reference(id).starts_with("TRK-"));
    }

    #[test]
    fn checkout_input_deserializes_with_defaults() {
        let json = r#"{
            "user_id": "550e8400-e29b-41d4-a716-446655440000",
            "customer": {
                "first_name": "Amira",
                "last_name": "Haddad",
                "email": "amira@example.com"
            },
            "delivery_address": {
                "street": "12 Rosewater Lane",
                "city": "Portview",
                "postal_code": "41100",
                "country": "US"
            },
            "payment": { "method": "cash_on_delivery" },
            "lines": [{
                "product_id": "6f9619ff-8b86-4d01-b42d-00cf4fc964ff",
                "product_name": "Argan Oil 100ml",
                "unit_price": 1000,
                "discount_percent": 0,
                "quantity": 2
            }]
        }"#;

        let input: CheckoutInput = serde_json::from_str(json).expect("valid payload");
        assert!(!input.otp_verified);
        assert!(input.idempotency_key.is_none());
        assert!(input.client_summary.is_none());
        assert_eq!(input.lines.len(), 1);
    }
}
