use crate::{
    handlers::common::{map_service_error, no_content_response, success_response},
    services::{
        cart::{AddToCartInput, CartLineSnapshot},
        payments::PaymentMethodType,
    },
    AppState,
};
use axum::{
    extract::{Json, Path, Query, State},
    response::IntoResponse,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;
use std::sync::Arc;
use uuid::Uuid;

/// Creates the router for cart endpoints
pub fn cart_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/:user_id", get(get_cart).delete(clear_cart))
        .route("/:user_id/summary", get(get_cart_summary))
        .route("/:user_id/items", post(add_item))
        .route(
            "/:user_id/items/:product_id",
            put(update_item).delete(remove_item),
        )
}

#[derive(Debug, Deserialize)]
struct SummaryQuery {
    payment_method: Option<PaymentMethodType>,
}

#[derive(Debug, Deserialize)]
struct UpdateQuantityRequest {
    quantity: i32,
}

/// Cart lines plus the current pricing breakdown.
async fn get_cart(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    let items = state
        .services
        .cart
        .snapshot_for_user(user_id)
        .await
        .map_err(map_service_error)?;
    let summary = state
        .services
        .cart
        .live_summary(user_id, None)
        .await
        .map_err(map_service_error)?;

    let lines: Vec<CartLineSnapshot> = items.iter().map(CartLineSnapshot::from).collect();
    Ok(success_response(serde_json::json!({
        "user_id": user_id,
        "lines": lines,
        "summary": summary,
    })))
}

/// Live totals; recomputed on every call so the UI can poll after each
/// mutation. An optional payment method refines the processing fee.
async fn get_cart_summary(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Query(query): Query<SummaryQuery>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    let summary = state
        .services
        .cart
        .live_summary(user_id, query.payment_method)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(summary))
}

async fn add_item(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
    Json(payload): Json<AddToCartInput>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    let line = state
        .services
        .cart
        .add_line(user_id, payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(line))
}

async fn update_item(
    State(state): State<Arc<AppState>>,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<UpdateQuantityRequest>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    let line = state
        .services
        .cart
        .set_line_quantity(user_id, product_id, payload.quantity)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(line))
}

async fn remove_item(
    State(state): State<Arc<AppState>>,
    Path((user_id, product_id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    state
        .services
        .cart
        .remove_line(user_id, product_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}

/// Customer-initiated cart reset, outside of any checkout. The checkout
/// path clears the cart inside its own transaction instead.
async fn clear_cart(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    state
        .services
        .cart
        .clear_for_user(state.db.as_ref(), user_id)
        .await
        .map_err(map_service_error)?;

    Ok(no_content_response())
}
