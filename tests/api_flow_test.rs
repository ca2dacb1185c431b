//! Drives the HTTP surface end to end: stock a product, build a cart,
//! check out, then read the committed projections back.

mod common;

use axum::{
    body::{self, Body},
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use common::TestContext;
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> Response {
    let request = match body {
        Some(json_body) => Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(json_body.to_string()))
            .unwrap(),
        None => Request::builder()
            .method(method)
            .uri(uri)
            .body(Body::empty())
            .unwrap(),
    };
    app.clone().oneshot(request).await.expect("infallible")
}

async fn response_json(response: Response) -> Value {
    let bytes = body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("response body bytes");
    serde_json::from_slice(&bytes).expect("json response")
}

#[tokio::test]
async fn storefront_flow_over_http() {
    let ctx = TestContext::new().await;
    let app = salonmart_api::app_router(ctx.app_state());
    let user_id = Uuid::new_v4();

    // Health first
    let response = send(&app, Method::GET, "/health", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let health = response_json(response).await;
    assert_eq!(health["status"], "ok");

    // Stock a product
    let response = send(
        &app,
        Method::POST,
        "/products",
        Some(json!({
            "salon_id": Uuid::new_v4(),
            "name": "Argan Oil 100ml",
            "price": 1000,
            "discount_percent": 0,
            "available_quantity": 5
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let product = response_json(response).await;
    let product_id = product["id"].as_str().unwrap().to_string();

    // Cart it
    let response = send(
        &app,
        Method::POST,
        &format!("/cart/{}/items", user_id),
        Some(json!({ "product_id": product_id, "quantity": 2 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // Live summary reflects the cart
    let response = send(
        &app,
        Method::GET,
        &format!("/cart/{}/summary", user_id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let summary = response_json(response).await;
    assert_eq!(summary["subtotal"], 2000);
    assert_eq!(summary["tax"], 40);
    assert_eq!(summary["total"], 2040);

    // Check out with cash on delivery
    let response = send(
        &app,
        Method::POST,
        "/checkout/process",
        Some(json!({
            "user_id": user_id,
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
                "product_id": product_id,
                "product_name": "Argan Oil 100ml",
                "unit_price": 1000,
                "discount_percent": 0,
                "quantity": 2
            }]
        })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let confirmation = response_json(response).await;
    // COD adds its 200 handling fee on top of 2040
    assert_eq!(confirmation["amount"], 2240);
    assert_eq!(confirmation["payment_status"], "pay_on_delivery");
    let order_id = confirmation["order_id"].as_str().unwrap().to_string();

    // Cart is empty after commit
    let response = send(&app, Method::GET, &format!("/cart/{}", user_id), None).await;
    let cart = response_json(response).await;
    assert_eq!(cart["lines"].as_array().unwrap().len(), 0);

    // Stock went 5 -> 3
    let response = send(&app, Method::GET, &format!("/products/{}", product_id), None).await;
    let product = response_json(response).await;
    assert_eq!(product["available_quantity"], 3);

    // Committed projections are readable
    let response = send(
        &app,
        Method::GET,
        &format!("/orders/{}/invoice", order_id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let invoice = response_json(response).await;
    assert_eq!(invoice["amount"], 2240);
    assert_eq!(invoice["lines"].as_array().unwrap().len(), 1);

    let response = send(
        &app,
        Method::GET,
        &format!("/orders/{}/tracking", order_id),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let tracking = response_json(response).await;
    assert!(tracking["tracking_reference"]
        .as_str()
        .unwrap()
        .starts_with("TRK-"));
    assert_eq!(tracking["timeline"].as_array().unwrap().len(), 5);
}

#[tokio::test]
async fn checkout_failures_surface_as_bad_request() {
    let ctx = TestContext::new().await;
    let app = salonmart_api::app_router(ctx.app_state());
    let product = ctx.seed_product("Keratin Mask", 1000, 0, 1).await;

    let response = send(
        &app,
        Method::POST,
        "/checkout/process",
        Some(json!({
            "user_id": Uuid::new_v4(),
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
                "product_id": product.id,
                "product_name": product.name,
                "unit_price": product.price,
                "discount_percent": 0,
                "quantity": 2
            }]
        })),
    )
    .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let error = response_json(response).await;
    let message = error["message"].as_str().unwrap();
    assert!(message.contains("1 available, 2 requested"));
}

#[tokio::test]
async fn payment_method_catalog_is_served() {
    let ctx = TestContext::new().await;
    let app = salonmart_api::app_router(ctx.app_state());

    let response = send(&app, Method::GET, "/checkout/payment-methods", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let catalog = response_json(response).await;
    let methods = catalog.as_array().unwrap();
    assert_eq!(methods.len(), 5);
    assert!(methods
        .iter()
        .any(|m| m["method_type"] == "cash_on_delivery"));
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let ctx = TestContext::new().await;
    let app = salonmart_api::app_router(ctx.app_state());

    let response = send(
        &app,
        Method::GET,
        &format!("/orders/{}/invoice", Uuid::new_v4()),
        None,
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}
