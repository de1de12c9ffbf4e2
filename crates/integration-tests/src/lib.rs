//! Integration test harness for Shopfront.
//!
//! [`FakeBackend`] is an in-process `axum` server on `127.0.0.1:0` standing
//! in for the storefront API. Tests script responses per method and path,
//! inspect the requests the client sent, and push realtime events down the
//! `/api/events` stream.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p shopfront-integration-tests
//! ```

use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, Method, StatusCode, Uri, header};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{Value, json};
use shopfront_client::{ClientConfig, MemoryStorage, SessionStorage, Storefront};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// A request received by the fake backend.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Option<Value>,
}

struct Shared {
    routes: Mutex<HashMap<(Method, String), (StatusCode, Value)>>,
    requests: Mutex<Vec<RecordedRequest>>,
    events: broadcast::Sender<(String, String)>,
    reset_streams: AtomicBool,
}

/// In-process storefront API.
pub struct FakeBackend {
    addr: SocketAddr,
    shared: Arc<Shared>,
    server: JoinHandle<()>,
}

impl FakeBackend {
    /// Bind to an ephemeral port and start serving.
    pub async fn start() -> Self {
        let (events, _) = broadcast::channel(16);
        let shared = Arc::new(Shared {
            routes: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            events,
            reset_streams: AtomicBool::new(false),
        });

        let app = Router::new()
            .route("/api/events", get(events_stream))
            .fallback(scripted)
            .with_state(Arc::clone(&shared));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind fake backend");
        let addr = listener.local_addr().expect("Fake backend has no address");
        let server = tokio::spawn(async move {
            axum::serve(listener, app).await.expect("Fake backend crashed");
        });

        Self {
            addr,
            shared,
            server,
        }
    }

    /// Client configuration pointing at this backend.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        let mut config =
            ClientConfig::new(&format!("http://{}/api", self.addr)).expect("Invalid fake URL");
        config.request_timeout = Duration::from_secs(5);
        config.realtime.initial_backoff = Duration::from_millis(50);
        config.realtime.max_backoff = Duration::from_millis(200);
        config
    }

    /// A storefront over fresh in-memory storage.
    #[must_use]
    pub fn storefront(&self) -> Storefront {
        self.storefront_with(Arc::new(MemoryStorage::new()))
    }

    /// A storefront over the given storage.
    #[must_use]
    pub fn storefront_with(&self, storage: Arc<dyn SessionStorage>) -> Storefront {
        Storefront::with_storage(self.config(), storage).expect("Failed to build storefront")
    }

    /// Answer `method path` (path includes the `/api` prefix) with `body`.
    pub fn respond(&self, method: Method, path: &str, status: StatusCode, body: Value) {
        self.shared
            .routes
            .lock()
            .expect("routes lock poisoned")
            .insert((method, path.to_owned()), (status, body));
    }

    /// Every request received so far, oldest first.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.shared
            .requests
            .lock()
            .expect("requests lock poisoned")
            .clone()
    }

    /// Most recent request for `method path`.
    #[must_use]
    pub fn last_request(&self, method: &Method, path: &str) -> Option<RecordedRequest> {
        self.requests()
            .into_iter()
            .rev()
            .find(|r| &r.method == method && r.path == path)
    }

    /// Number of requests received for `method path`.
    #[must_use]
    pub fn count(&self, method: &Method, path: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| &r.method == method && r.path == path)
            .count()
    }

    /// Push a named event to every open realtime stream.
    pub fn push_event(&self, name: &str, data: &Value) {
        let _ = self.shared.events.send((name.to_owned(), data.to_string()));
    }

    /// Make every later realtime stream send one notification and then
    /// fail mid-body, as a dropped connection would.
    pub fn reset_streams(&self) {
        self.shared.reset_streams.store(true, Ordering::SeqCst);
    }

    /// Wait until at least one realtime stream is open.
    pub async fn wait_for_subscriber(&self) {
        for _ in 0..200 {
            if self.shared.events.receiver_count() > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        panic!("No realtime subscriber connected");
    }
}

impl Drop for FakeBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Poll `check` until it holds or a second passes.
pub async fn eventually(mut check: impl AsyncFnMut() -> bool) -> bool {
    for _ in 0..100 {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    false
}

fn bearer(headers: &HeaderMap) -> Option<String> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .map(str::to_owned)
}

async fn scripted(
    State(shared): State<Arc<Shared>>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let path = uri.path().to_owned();
    shared
        .requests
        .lock()
        .expect("requests lock poisoned")
        .push(RecordedRequest {
            method: method.clone(),
            path: path.clone(),
            query: uri.query().map(str::to_owned),
            authorization: bearer(&headers),
            body: serde_json::from_slice(&body).ok(),
        });

    let scripted = shared
        .routes
        .lock()
        .expect("routes lock poisoned")
        .get(&(method, path))
        .cloned();
    match scripted {
        Some((status, body)) => (status, Json(body)).into_response(),
        None => (
            StatusCode::NOT_FOUND,
            Json(json!({ "message": "Route not scripted" })),
        )
            .into_response(),
    }
}

async fn events_stream(
    State(shared): State<Arc<Shared>>,
    headers: HeaderMap,
) -> Response {
    shared
        .requests
        .lock()
        .expect("requests lock poisoned")
        .push(RecordedRequest {
            method: Method::GET,
            path: "/api/events".to_owned(),
            query: None,
            authorization: bearer(&headers),
            body: None,
        });
    if shared.reset_streams.load(Ordering::SeqCst) {
        // The pause lets the event flush before the connection is torn down.
        let stream = futures::stream::unfold(0u8, |step| async move {
            match step {
                0 => {
                    let event = Event::default()
                        .event("notification")
                        .data(json!({ "message": "Connected" }).to_string());
                    Some((Ok(event), 1))
                }
                1 => {
                    tokio::time::sleep(Duration::from_millis(20)).await;
                    Some((Err(io::Error::other("connection reset")), 2))
                }
                _ => None,
            }
        });
        return Sse::new(stream).into_response();
    }

    let receiver = shared.events.subscribe();

    let stream = futures::stream::unfold(receiver, |mut receiver| async move {
        loop {
            match receiver.recv().await {
                Ok((name, data)) => {
                    let event = Event::default().event(name).data(data);
                    return Some((Ok::<_, io::Error>(event), receiver));
                }
                Err(broadcast::error::RecvError::Lagged(_)) => {}
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    });
    Sse::new(stream)
        .keep_alive(KeepAlive::default())
        .into_response()
}

// =============================================================================
// Fixtures
// =============================================================================

/// Wire-format user record.
#[must_use]
pub fn user_json(id: &str, role: &str) -> Value {
    json!({
        "id": id,
        "name": "Ada Lovelace",
        "email": "ada@example.com",
        "role": role
    })
}

/// Wire-format product record.
#[must_use]
pub fn product_json(id: &str) -> Value {
    json!({
        "id": id,
        "name": format!("Product {id}"),
        "description": "A fine product",
        "price": "19.99",
        "category": "Electronics",
        "images": [],
        "stock": 10,
        "rating": 4.5,
        "numReviews": 3
    })
}

/// Wire-format cart with one line per `(product_id, quantity)`.
#[must_use]
pub fn cart_json(lines: &[(&str, u32)], total: &str) -> Value {
    let items: Vec<Value> = lines
        .iter()
        .map(|(id, quantity)| {
            json!({
                "productId": id,
                "name": format!("Product {id}"),
                "price": "10.00",
                "quantity": quantity
            })
        })
        .collect();
    json!({
        "items": items,
        "subtotal": total,
        "tax": "0.00",
        "shippingCost": "0.00",
        "total": total
    })
}

/// Wire-format order record.
#[must_use]
pub fn order_json(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "items": [{ "productId": "p1", "name": "Product p1", "price": "10.00", "quantity": 1 }],
        "status": status,
        "subtotal": "10.00",
        "tax": "0.80",
        "shippingCost": "5.00",
        "total": "15.80"
    })
}
