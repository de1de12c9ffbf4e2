#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use serde_json::json;
use shopfront_client::selectors;
use shopfront_core::{Address, NewOrder, OrderId, OrderLine, OrderProgress, OrderStatus, ProductId};
use shopfront_integration_tests::{FakeBackend, cart_json, order_json};

fn new_order() -> NewOrder {
    NewOrder {
        items: vec![OrderLine {
            product_id: ProductId::new("p1"),
            quantity: 1,
        }],
        shipping_address: Address {
            street: "12 St James's Square".to_string(),
            city: "London".to_string(),
            state: "London".to_string(),
            postal_code: "SW1Y 4LB".to_string(),
            country: "UK".to_string(),
        },
        payment_method: "card".to_string(),
        payment_intent_id: Some("pi_123".to_string()),
    }
}

#[tokio::test]
async fn test_cancel_replaces_exactly_one_order() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::GET,
        "/api/orders",
        StatusCode::OK,
        json!({ "orders": [
            order_json("o3", "pending"),
            order_json("o2", "pending"),
            order_json("o1", "delivered"),
        ] }),
    );
    backend.respond(
        Method::POST,
        "/api/orders/o2/cancel",
        StatusCode::OK,
        json!({ "order": order_json("o2", "cancelled") }),
    );

    let storefront = backend.storefront();
    storefront.orders().fetch_mine().await.unwrap();
    let before = storefront.orders().snapshot().await;

    let cancelled = storefront.orders().cancel(&OrderId::new("o2")).await.unwrap();
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
    let sent = backend
        .last_request(&Method::POST, "/api/orders/o2/cancel")
        .unwrap();
    assert_eq!(sent.body.unwrap(), json!({}));

    let after = storefront.orders().snapshot().await;
    assert_eq!(after.orders.len(), 3);
    assert!(Arc::ptr_eq(&before.orders[0], &after.orders[0]));
    assert!(!Arc::ptr_eq(&before.orders[1], &after.orders[1]));
    assert!(Arc::ptr_eq(&before.orders[2], &after.orders[2]));
    assert_eq!(after.orders[1].status, OrderStatus::Cancelled);
    assert_eq!(
        selectors::order_progress(&after.orders[1]),
        OrderProgress::Cancelled
    );
}

#[tokio::test]
async fn test_cancel_rejection_records_message() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::POST,
        "/api/orders/o1/cancel",
        StatusCode::BAD_REQUEST,
        json!({ "message": "Order already shipped" }),
    );

    let storefront = backend.storefront();
    storefront.orders().cancel(&OrderId::new("o1")).await.unwrap_err();

    let state = storefront.orders().snapshot().await;
    assert_eq!(state.status.error.as_deref(), Some("Order already shipped"));
}

#[tokio::test]
async fn test_fetch_by_id_sets_current_and_tolerates_unknown_status() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::GET,
        "/api/orders/o7",
        StatusCode::OK,
        json!({ "order": order_json("o7", "awaiting_pickup") }),
    );

    let storefront = backend.storefront();
    let order = storefront.orders().fetch_by_id(&OrderId::new("o7")).await.unwrap();
    assert_eq!(
        selectors::order_progress(&order),
        OrderProgress::Unknown("awaiting_pickup".to_string())
    );

    let state = storefront.orders().snapshot().await;
    assert_eq!(state.current.as_ref().map(|o| o.id.as_str()), Some("o7"));
    assert!(selectors::find_order(&state, &OrderId::new("o7")).is_some());
}

#[tokio::test]
async fn test_checkout_prepends_order_and_clears_cart() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::GET,
        "/api/cart",
        StatusCode::OK,
        json!({ "cart": cart_json(&[("p1", 1)], "10.00") }),
    );
    backend.respond(
        Method::GET,
        "/api/orders",
        StatusCode::OK,
        json!({ "orders": [order_json("o1", "delivered")] }),
    );
    backend.respond(
        Method::POST,
        "/api/orders",
        StatusCode::CREATED,
        json!({ "order": order_json("o2", "paid") }),
    );

    let storefront = backend.storefront();
    storefront.cart().fetch_cart().await.unwrap();
    storefront.orders().fetch_mine().await.unwrap();

    let order_id = storefront.checkout(&new_order()).await.unwrap();
    assert_eq!(order_id, OrderId::new("o2"));

    let orders = storefront.orders().snapshot().await;
    let ids: Vec<&str> = orders.orders.iter().map(|o| o.id.as_str()).collect();
    assert_eq!(ids, vec!["o2", "o1"]);
    assert_eq!(orders.current.as_ref().map(|o| o.id.as_str()), Some("o2"));
    assert!(selectors::cart_is_empty(&storefront.cart().snapshot().await));

    let sent = backend.last_request(&Method::POST, "/api/orders").unwrap();
    assert_eq!(
        sent.body.unwrap(),
        json!({
            "items": [{ "productId": "p1", "quantity": 1 }],
            "shippingAddress": {
                "street": "12 St James's Square",
                "city": "London",
                "state": "London",
                "postalCode": "SW1Y 4LB",
                "country": "UK"
            },
            "paymentMethod": "card",
            "paymentIntentId": "pi_123"
        })
    );
}

#[tokio::test]
async fn test_failed_checkout_keeps_cart() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::GET,
        "/api/cart",
        StatusCode::OK,
        json!({ "cart": cart_json(&[("p1", 1)], "10.00") }),
    );
    backend.respond(
        Method::POST,
        "/api/orders",
        StatusCode::UNPROCESSABLE_ENTITY,
        json!({ "message": "Payment declined" }),
    );

    let storefront = backend.storefront();
    storefront.cart().fetch_cart().await.unwrap();

    storefront.checkout(&new_order()).await.unwrap_err();
    assert_eq!(
        selectors::cart_item_count(&storefront.cart().snapshot().await),
        1
    );
    let orders = storefront.orders().snapshot().await;
    assert!(orders.orders.is_empty());
    assert_eq!(orders.status.error.as_deref(), Some("Payment declined"));
}
