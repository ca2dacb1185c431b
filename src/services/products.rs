use crate::{
    entities::{product, Product},
    errors::ServiceError,
    events::{Event, EventSender},
};
use chrono::Utc;
use sea_orm::{ActiveModelTrait, DatabaseConnection, EntityTrait, Set};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{info, instrument};
use uuid::Uuid;
use validator::Validate;

/// Input for adding a product to a salon's storefront
#[derive(Debug, Deserialize, Validate)]
pub struct CreateProductInput {
    pub salon_id: Uuid,
    #[validate(length(min = 1, max = 200))]
    pub name: String,
    #[validate(range(min = 0))]
    pub price: i64,
    #[validate(range(min = 0, max = 100))]
    pub discount_percent: i32,
    #[validate(range(min = 0))]
    pub available_quantity: i32,
}

/// Product persistence glue for the storefront. Catalog search and
/// filtering live elsewhere; checkout only needs products to exist and to
/// carry a price, a discount and a stock level.
#[derive(Clone)]
pub struct ProductService {
    db: Arc<DatabaseConnection>,
    event_sender: EventSender,
}

impl ProductService {
    pub fn new(db: Arc<DatabaseConnection>, event_sender: EventSender) -> Self {
        Self { db, event_sender }
    }

    #[instrument(skip(self))]
    pub async fn create_product(
        &self,
        input: CreateProductInput,
    ) -> Result<product::Model, ServiceError> {
        input.validate()?;

        let product = product::ActiveModel {
            id: Set(Uuid::new_v4()),
            salon_id: Set(input.salon_id),
            name: Set(input.name),
            price: Set(input.price),
            discount_percent: Set(input.discount_percent),
            available_quantity: Set(input.available_quantity),
            created_at: Set(Utc::now()),
            updated_at: Set(Utc::now()),
        };

        let product = product.insert(&*self.db).await?;

        self.event_sender
            .send_or_log(Event::ProductCreated(product.id))
            .await;

        info!("Created product {}: {}", product.id, product.name);
        Ok(product)
    }

    pub async fn get_product(&self, product_id: Uuid) -> Result<product::Model, ServiceError> {
        Product::find_by_id(product_id)
            .one(&*self.db)
            .await?
            .ok_or_else(|| ServiceError::NotFound(format!("Product {} not found", product_id)))
    }
}
