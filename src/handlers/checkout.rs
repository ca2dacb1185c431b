use crate::{
    handlers::common::{map_service_error, success_response},
    services::{checkout::CheckoutInput, payments},
    AppState,
};
use axum::{
    extract::{Json, State},
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use std::sync::Arc;

/// Creates the router for checkout endpoints
pub fn checkout_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/process", post(process_checkout))
        .route("/payment-methods", get(list_payment_methods))
}

/// Turns a cart snapshot into a committed order, or a clean failure.
/// Validation, inventory and payment failures all come back as 400 with a
/// descriptive message; the customer keeps their cart and can retry.
async fn process_checkout(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<CheckoutInput>,
) -> Result<impl IntoResponse, crate::errors::ApiError> {
    let confirmation = state
        .services
        .checkout
        .process_checkout(payload)
        .await
        .map_err(map_service_error)?;

    Ok(success_response(confirmation))
}

/// The static payment method catalog the storefront renders.
async fn list_payment_methods() -> impl IntoResponse {
    success_response(payments::payment_method_catalog())
}
