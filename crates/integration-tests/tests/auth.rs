//! Session flows against the fake backend.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use axum::http::{Method, StatusCode};
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use shopfront_client::storage::keys;
use shopfront_client::{Credentials, ErrorKind, FileStorage, SessionStorage, selectors};
use shopfront_core::{Email, ProfileUpdate};
use shopfront_integration_tests::{FakeBackend, cart_json, user_json};

fn credentials() -> Credentials {
    Credentials {
        email: Email::parse("ada@example.com").unwrap(),
        password: SecretString::from("hunter2"),
    }
}

// =============================================================================
// Login
// =============================================================================

#[tokio::test]
async fn test_login_persists_session_and_sends_bearer() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::POST,
        "/api/auth/login",
        StatusCode::OK,
        json!({ "user": user_json("u1", "admin"), "token": "tok-123" }),
    );
    backend.respond(
        Method::GET,
        "/api/cart",
        StatusCode::OK,
        json!({ "cart": cart_json(&[], "0.00") }),
    );

    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path().join("session.json")));
    let storefront = backend.storefront_with(storage.clone());

    let user = storefront.login(&credentials()).await.unwrap();
    assert_eq!(user.name, "Ada Lovelace");

    let auth = storefront.auth().snapshot().await;
    assert!(selectors::is_authenticated(&auth));
    assert!(selectors::is_admin(&auth));
    assert_eq!(auth.token.unwrap().expose_secret(), "tok-123");
    assert_eq!(auth.status.error, None);
    assert_eq!(storage.get(keys::TOKEN).unwrap().as_deref(), Some("tok-123"));
    assert!(storage.get(keys::USER).unwrap().unwrap().contains("\"u1\""));

    let login = backend.last_request(&Method::POST, "/api/auth/login").unwrap();
    assert_eq!(
        login.body.unwrap(),
        json!({ "email": "ada@example.com", "password": "hunter2" })
    );

    storefront.cart().fetch_cart().await.unwrap();
    let cart = backend.last_request(&Method::GET, "/api/cart").unwrap();
    assert_eq!(cart.authorization.as_deref(), Some("Bearer tok-123"));
}

#[tokio::test]
async fn test_login_failure_uses_server_message_and_keeps_session() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::POST,
        "/api/auth/login",
        StatusCode::UNAUTHORIZED,
        json!({ "message": "Invalid credentials" }),
    );

    let storefront = backend.storefront();
    let err = storefront.login(&credentials()).await.unwrap_err();
    assert_eq!(err.kind, ErrorKind::Unauthorized);

    let auth = storefront.auth().snapshot().await;
    assert!(!auth.is_authenticated);
    assert!(auth.user.is_none());
    assert!(!auth.status.loading);
    assert_eq!(auth.status.error.as_deref(), Some("Invalid credentials"));
    assert!(!storefront.realtime().is_connected());

    storefront.auth().clear_error().await;
    assert_eq!(storefront.auth().snapshot().await.status.error, None);
}

#[tokio::test]
async fn test_register_failure_without_message_uses_fallback() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::POST,
        "/api/auth/register",
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({}),
    );

    let storefront = backend.storefront();
    let registration = shopfront_client::Registration {
        name: "Ada".to_string(),
        email: Email::parse("ada@example.com").unwrap(),
        password: SecretString::from("hunter2"),
        phone: None,
    };
    storefront.register(&registration).await.unwrap_err();

    let auth = storefront.auth().snapshot().await;
    assert_eq!(auth.status.error.as_deref(), Some("Registration failed"));
}

// =============================================================================
// Profile
// =============================================================================

#[tokio::test]
async fn test_expired_session_on_profile_fetch_clears_everything() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::GET,
        "/api/auth/me",
        StatusCode::UNAUTHORIZED,
        json!({ "message": "Token expired" }),
    );

    let dir = tempfile::tempdir().unwrap();
    let storage = Arc::new(FileStorage::new(dir.path().join("session.json")));
    storage.set(keys::TOKEN, "stale").unwrap();
    storage
        .set(keys::USER, &user_json("u1", "user").to_string())
        .unwrap();

    let storefront = backend.storefront_with(storage.clone());
    assert!(storefront.auth().is_authenticated().await);

    let err = storefront.refresh_session().await.unwrap_err();
    assert!(err.is_unauthorized());

    let auth = storefront.auth().snapshot().await;
    assert!(!auth.is_authenticated);
    assert!(auth.user.is_none());
    assert!(auth.token.is_none());
    assert_eq!(storage.get(keys::TOKEN).unwrap(), None);
    assert_eq!(storage.get(keys::USER).unwrap(), None);
    assert!(!storefront.realtime().is_connected());
}

#[tokio::test]
async fn test_store_profile_expiry_leaves_cascade_to_coordinator() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::GET,
        "/api/auth/me",
        StatusCode::UNAUTHORIZED,
        json!({ "message": "Token expired" }),
    );
    backend.respond(
        Method::GET,
        "/api/cart",
        StatusCode::OK,
        json!({ "cart": cart_json(&[("p1", 2)], "20.00") }),
    );

    let storage = Arc::new(shopfront_client::MemoryStorage::new());
    storage.set(keys::TOKEN, "stale").unwrap();
    let storefront = backend.storefront_with(storage.clone());
    storefront.cart().fetch_cart().await.unwrap();

    // The store call drops the session but nothing else.
    storefront.auth().get_profile().await.unwrap_err();
    assert!(!storefront.auth().is_authenticated().await);
    assert_eq!(storage.get(keys::TOKEN).unwrap(), None);
    assert_eq!(
        selectors::cart_item_count(&storefront.cart().snapshot().await),
        2
    );
    assert!(storefront.realtime().is_connected());

    storefront.refresh_session().await.unwrap_err();
    assert!(selectors::cart_is_empty(&storefront.cart().snapshot().await));
    assert!(!storefront.realtime().is_connected());
}

#[tokio::test]
async fn test_profile_server_error_keeps_session() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::GET,
        "/api/auth/me",
        StatusCode::BAD_GATEWAY,
        json!({ "message": "authentication service unavailable" }),
    );

    let storage = Arc::new(shopfront_client::MemoryStorage::new());
    storage.set(keys::TOKEN, "tok").unwrap();
    let storefront = backend.storefront_with(storage.clone());

    storefront.auth().get_profile().await.unwrap_err();
    assert!(storefront.auth().is_authenticated().await);
    assert_eq!(storage.get(keys::TOKEN).unwrap().as_deref(), Some("tok"));
    storefront.logout().await;
}

#[tokio::test]
async fn test_update_profile_replaces_user_wholesale() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::POST,
        "/api/auth/login",
        StatusCode::OK,
        json!({ "user": user_json("u1", "user"), "token": "tok" }),
    );
    backend.respond(
        Method::PUT,
        "/api/auth/profile",
        StatusCode::OK,
        json!({ "user": {
            "id": "u1",
            "name": "Countess Lovelace",
            "email": "ada@example.com",
            "role": "user"
        } }),
    );

    let storefront = backend.storefront();
    storefront.login(&credentials()).await.unwrap();

    let update = ProfileUpdate {
        name: Some("Countess Lovelace".to_string()),
        ..ProfileUpdate::default()
    };
    storefront.auth().update_profile(&update).await.unwrap();

    let auth = storefront.auth().snapshot().await;
    assert_eq!(selectors::current_user_name(&auth), Some("Countess Lovelace"));
    let sent = backend.last_request(&Method::PUT, "/api/auth/profile").unwrap();
    assert_eq!(sent.body.unwrap(), json!({ "name": "Countess Lovelace" }));
    storefront.logout().await;
}

#[tokio::test]
async fn test_change_password_sends_both_passwords() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::PUT,
        "/api/auth/password",
        StatusCode::OK,
        json!({ "message": "Password updated" }),
    );

    let storefront = backend.storefront();
    storefront
        .auth()
        .change_password(&SecretString::from("old"), &SecretString::from("new"))
        .await
        .unwrap();

    let sent = backend.last_request(&Method::PUT, "/api/auth/password").unwrap();
    assert_eq!(
        sent.body.unwrap(),
        json!({ "currentPassword": "old", "newPassword": "new" })
    );
}

// =============================================================================
// Logout
// =============================================================================

#[tokio::test]
async fn test_logout_without_session_is_noop_safe() {
    let backend = FakeBackend::start().await;
    let storefront = backend.storefront();

    storefront.logout().await;
    storefront.logout().await;

    assert!(!storefront.auth().is_authenticated().await);
    assert!(backend.requests().is_empty());
}

#[tokio::test]
async fn test_logout_clears_storage_and_user_data() {
    let backend = FakeBackend::start().await;
    backend.respond(
        Method::POST,
        "/api/auth/login",
        StatusCode::OK,
        json!({ "user": user_json("u1", "user"), "token": "tok" }),
    );
    backend.respond(
        Method::GET,
        "/api/cart",
        StatusCode::OK,
        json!({ "cart": cart_json(&[("p1", 2)], "20.00") }),
    );

    let storage = Arc::new(shopfront_client::MemoryStorage::new());
    let storefront = backend.storefront_with(storage.clone());
    storefront.login(&credentials()).await.unwrap();
    storefront.cart().fetch_cart().await.unwrap();
    assert!(storefront.realtime().is_connected());

    storefront.logout().await;

    assert_eq!(storage.get(keys::TOKEN).unwrap(), None);
    assert_eq!(storage.get(keys::USER).unwrap(), None);
    assert!(selectors::cart_is_empty(&storefront.cart().snapshot().await));
    assert!(!storefront.realtime().is_connected());
}
