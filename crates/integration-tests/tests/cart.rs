#![allow(clippy::unwrap_used)]

use axum::http::{Method, StatusCode};
use serde_json::json;
use shopfront_client::selectors;
use shopfront_core::{Price, ProductId};
use shopfront_integration_tests::{FakeBackend, cart_json};

#[tokio::test]
async fn test_fetch_cart_copies_server_totals() {
    let backend = FakeBackend::start().await;
    let mut body = cart_json(&[("p1", 2), ("p2", 1)], "30.00");
    body["tax"] = json!("2.40");
    body["shippingCost"] = json!(5);
    backend.respond(Method::GET, "/api/cart", StatusCode::OK, json!({ "cart": body }));

    let storefront = backend.storefront();
    let cart = storefront.cart().fetch_cart().await.unwrap();

    assert_eq!(cart.total, Price::parse("30.00").unwrap());
    assert_eq!(cart.tax, Price::parse("2.40").unwrap());
    assert_eq!(cart.shipping, Price::parse("5").unwrap());

    let state = storefront.cart().snapshot().await;
    assert_eq!(state.cart, cart);
    assert_eq!(selectors::cart_item_count(&state), 3);
    assert!(!state.status.loading);
}

#[tokio::test]
async fn test_add_item_rejection_keeps_cart_and_records_message() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::GET,
        "/api/cart",
        StatusCode::OK,
        json!({ "cart": cart_json(&[("p1", 1)], "10.00") }),
    );
    backend.respond(
        Method::POST,
        "/api/cart/items",
        StatusCode::CONFLICT,
        json!({ "message": "Insufficient stock" }),
    );

    let storefront = backend.storefront();
    let before = storefront.cart().fetch_cart().await.unwrap();

    let err = storefront
        .cart()
        .add_item(&ProductId::new("p9"), 5)
        .await
        .unwrap_err();
    assert_eq!(err.kind, shopfront_client::ErrorKind::Validation);

    let state = storefront.cart().snapshot().await;
    assert_eq!(state.cart, before);
    assert_eq!(state.status.error.as_deref(), Some("Insufficient stock"));
    assert!(!state.status.loading);

    let sent = backend.last_request(&Method::POST, "/api/cart/items").unwrap();
    assert_eq!(sent.body.unwrap(), json!({ "productId": "p9", "quantity": 5 }));
}

#[tokio::test]
async fn test_line_operations_hit_item_routes() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::PUT,
        "/api/cart/items/p1",
        StatusCode::OK,
        json!({ "cart": cart_json(&[("p1", 4)], "40.00") }),
    );
    backend.respond(
        Method::DELETE,
        "/api/cart/items/p1",
        StatusCode::OK,
        json!({ "cart": cart_json(&[], "0.00") }),
    );

    let storefront = backend.storefront();
    let cart = storefront
        .cart()
        .set_quantity(&ProductId::new("p1"), 4)
        .await
        .unwrap();
    assert_eq!(cart.item_count(), 4);
    let sent = backend.last_request(&Method::PUT, "/api/cart/items/p1").unwrap();
    assert_eq!(sent.body.unwrap(), json!({ "quantity": 4 }));

    storefront.cart().remove_item(&ProductId::new("p1")).await.unwrap();
    assert!(selectors::cart_is_empty(&storefront.cart().snapshot().await));
}

#[tokio::test]
async fn test_clear_cart_uses_server_snapshot() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::DELETE,
        "/api/cart",
        StatusCode::OK,
        json!({ "cart": cart_json(&[], "0.00") }),
    );

    let storefront = backend.storefront();
    storefront
        .cart()
        .replace(serde_json::from_value(cart_json(&[("p1", 1)], "10.00")).unwrap())
        .await;

    storefront.cart().clear_cart().await.unwrap();
    let state = storefront.cart().snapshot().await;
    assert!(state.cart.is_empty());
    assert_eq!(state.cart.total, Price::ZERO);
}

#[tokio::test]
async fn test_unreachable_backend_uses_fallback_message() {
    let config = shopfront_client::ClientConfig::new("http://127.0.0.1:9/api").unwrap();
    let storefront = shopfront_client::Storefront::with_storage(
        config,
        std::sync::Arc::new(shopfront_client::MemoryStorage::new()),
    )
    .unwrap();

    let err = storefront.cart().fetch_cart().await.unwrap_err();
    assert_eq!(err.kind, shopfront_client::ErrorKind::Network);
    let state = storefront.cart().snapshot().await;
    assert_eq!(state.status.error.as_deref(), Some("Failed to load cart"));
}
