use crate::{
    handlers::common::{created_response, map_service_error, success_response, validate_input},
    services::products::CreateProductInput,
    AppState,
};
use axum::{
    extract::{Json, Path, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Creates the router for product persistence endpoints. Catalog search and
/// filtering are a separate surface; this is just enough to stock a salon.
pub fn product_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", post(create_product))
        .route("/:product_id", get(get_product))
        .route("/:product_id/restock", post(restock_product))
}

#[derive(Debug, Deserialize)]
struct RestockRequest {
    quantity: i32,
}

async fn create_product(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CreateProductInput>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    validate_input(&payload)?;

    let product = state
        .services
        .products
        .create_product(payload)
        .await
        .map_err(map_service_error)?;

    Ok(created_response(product))
}

async fn get_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    let product = state
        .services
        .products
        .get_product(product_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}

async fn restock_product(
    State(state): State<Arc<AppState>>,
    Path(product_id): Path<Uuid>,
    Json(payload): Json<RestockRequest>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    let product = state
        .services
        .inventory
        .restock(product_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(product))
}
