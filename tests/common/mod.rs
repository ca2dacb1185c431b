//! Shared harness for integration tests: in-memory SQLite, migrated schema,
//! the full service graph, and seed/builder helpers.
#![allow(dead_code)]

use salonmart_api::{
    config::AppConfig,
    db,
    entities::product,
    events::{self, EventSender},
    handlers::AppServices,
    services::{
        cart::CartLineSnapshot,
        checkout::{CheckoutInput, CustomerDetails, DeliveryAddress},
        payments::{
            CardDetails, PaymentAuthorizer, PaymentDetails, PaymentMethodType, SimulatedGateway,
        },
    },
    AppState,
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, Set};
use std::{sync::Arc, time::Duration};
use tokio::sync::mpsc;
use uuid::Uuid;

pub struct TestContext {
    pub db: Arc<DatabaseConnection>,
    pub services: AppServices,
    pub config: AppConfig,
    pub event_sender: EventSender,
}

impl TestContext {
    /// Context with a gateway that always authorizes.
    pub async fn new() -> Self {
        Self::with_authorizer(Arc::new(SimulatedGateway::with_rates(
            0.0,
            0.0,
            Duration::ZERO,
        )))
        .await
    }

    /// Context with a caller-chosen authorizer, for injecting declines and
    /// network failures at exact points in the flow.
    pub async fn with_authorizer(authorizer: Arc<dyn PaymentAuthorizer>) -> Self {
        let mut config = AppConfig::new("sqlite::memory:", "test");
        // A single pooled connection keeps every session on the same
        // in-memory database.
        config.db_max_connections = 1;
        config.db_min_connections = 1;

        let pool = db::establish_connection_from_app_config(&config)
            .await
            .expect("connect to in-memory sqlite");
        db::run_migrations(&pool).await.expect("run migrations");
        let db = Arc::new(pool);

        let (tx, rx) = mpsc::channel(256);
        let event_sender = EventSender::new(tx);
        tokio::spawn(events::process_events(rx));

        let services = AppServices::new(db.clone(), event_sender.clone(), &config, authorizer);

        Self {
            db,
            services,
            config,
            event_sender,
        }
    }

    /// Full application state + router, for driving the HTTP surface.
    pub fn app_state(&self) -> Arc<AppState> {
        Arc::new(AppState {
            db: self.db.clone(),
            config: self.config.clone(),
            event_sender: self.event_sender.clone(),
            services: self.services.clone(),
        })
    }

    pub async fn seed_product(
        &self,
        name: &str,
        price: i64,
        discount_percent: i32,
        available_quantity: i32,
    ) -> product::Model {
        let model = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            salon_id: Set(Uuid::new_v4()),
            name: Set(name.to_string()),
            price: Set(price),
            discount_percent: Set(discount_percent),
            available_quantity: Set(available_quantity),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };
        model
            .insert(self.db.as_ref())
            .await
            .expect("seed product")
    }
}

pub fn snapshot_line(product: &product::Model, quantity: i32) -> CartLineSnapshot {
    CartLineSnapshot {
        product_id: product.id,
        product_name: product.name.clone(),
        unit_price: product.price,
        discount_percent: product.discount_percent,
        quantity,
    }
}

pub fn customer() -> CustomerDetails {
    CustomerDetails {
        first_name: "Amira".to_string(),
        last_name: "Haddad".to_string(),
        email: "amira@example.com".to_string(),
        phone: Some("+15550100".to_string()),
    }
}

pub fn delivery_address() -> DeliveryAddress {
    DeliveryAddress {
        street: "12 Rosewater Lane".to_string(),
        city: "Portview".to_string(),
        postal_code: "41100".to_string(),
        country: "US".to_string(),
    }
}

pub fn card_payment() -> PaymentDetails {
    PaymentDetails {
        method: PaymentMethodType::CreditCard,
        card: Some(CardDetails {
            number: "4111111111111111".to_string(),
            holder: "Amira Haddad".to_string(),
            expiry: "12/27".to_string(),
            cvv: "123".to_string(),
        }),
    }
}

pub fn cod_payment() -> PaymentDetails {
    PaymentDetails {
        method: PaymentMethodType::CashOnDelivery,
        card: None,
    }
}

/// A complete, valid checkout input for the given user and lines.
pub fn checkout_input(
    user_id: Uuid,
    lines: Vec<CartLineSnapshot>,
    payment: PaymentDetails,
) -> CheckoutInput {
    let otp_verified = payment.method.is_card();
    CheckoutInput {
        user_id,
        customer: customer(),
        delivery_address: delivery_address(),
        payment,
        otp_verified,
        lines,
        client_summary: None,
        delivery_notes: None,
        preferred_delivery_time: None,
        idempotency_key: None,
    }
}
