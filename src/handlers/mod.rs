pub mod cart;
pub mod checkout;
pub mod common;
pub mod orders;
pub mod products;

use crate::{
    config::AppConfig,
    events::EventSender,
    services::{
        payments::PaymentAuthorizer, CartService, CheckoutService, InventoryService,
        OrderQueryService, ProductService,
    },
};
use sea_orm::DatabaseConnection;
use std::sync::Arc;

/// Services layer that encapsulates business logic used by HTTP handlers
#[derive(Clone)]
pub struct AppServices {
    pub cart: Arc<CartService>,
    pub checkout: Arc<CheckoutService>,
    pub inventory: Arc<InventoryService>,
    pub orders: Arc<OrderQueryService>,
    pub products: Arc<ProductService>,
}

impl AppServices {
    /// Wires every service onto the shared pool and event channel. The
    /// payment authorizer arrives pre-built so callers (and tests) choose
    /// the gateway implementation.
    pub fn new(
        db: Arc<DatabaseConnection>,
        event_sender: EventSender,
        config: &AppConfig,
        authorizer: Arc<dyn PaymentAuthorizer>,
    ) -> Self {
        let cart = Arc::new(CartService::new(
            db.clone(),
            event_sender.clone(),
            config.checkout.clone(),
        ));
        let inventory = Arc::new(InventoryService::new(db.clone(), event_sender.clone()));
        let checkout = Arc::new(CheckoutService::new(
            db.clone(),
            event_sender.clone(),
            authorizer,
            cart.clone(),
            inventory.clone(),
            config.checkout.clone(),
            &config.payment,
        ));
        let orders = Arc::new(OrderQueryService::new(db.clone(), config.checkout.clone()));
        let products = Arc::new(ProductService::new(db, event_sender));

        Self {
            cart,
            checkout,
            inventory,
            orders,
            products,
        }
    }
}
