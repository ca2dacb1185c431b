use crate::{
    handlers::common::{map_service_error, success_response},
    AppState,
};
use axum::{
    extract::{Path, State},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use uuid::Uuid;

/// Creates the router for order read endpoints. Everything here consumes
/// committed state only; the checkout transaction is the sole writer.
pub fn order_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:order_id", get(get_order))
        .route("/:order_id/invoice", get(get_invoice))
        .route("/:order_id/tracking", get(get_tracking))
}

async fn get_order(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    let (order, items) = state
        .services
        .orders
        .get_order_with_items(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(serde_json::json!({
        "order": order,
        "items": items,
    })))
}

async fn get_invoice(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    let invoice = state
        .services
        .orders
        .invoice(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(invoice))
}

async fn get_tracking(
    State(state): State<Arc<AppState>>,
    Path(order_id): Path<Uuid>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    let tracking = state
        .services
        .orders
        .tracking(order_id)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(tracking))
}
