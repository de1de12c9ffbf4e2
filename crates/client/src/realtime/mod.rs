//! Realtime channel adapter.
//!
//! Holds one server-sent events connection while a session exists. Each
//! named event is pushed into the [`NotificationStore`] and published on a
//! broadcast channel so the coordinator can re-fetch whatever it invalidates.
//!
//! The listener runs on its own task. It reconnects with exponential backoff
//! and gives up after `max_retries` consecutive failed attempts. The count
//! resets as soon as the endpoint accepts a stream, even if that stream later
//! drops. A `401`/`403` ends the task immediately. Dropping the last adapter
//! handle aborts the task.

mod events;
mod sse;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use async_stream::stream;
use futures::{Stream, StreamExt};
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, instrument, warn};
use url::Url;

pub use events::{EventError, EventName, EventPayload, Invalidation, RealtimeEvent, UnknownEvent};
pub use sse::SseFrame;

use crate::config::RealtimeConfig;
use crate::stores::NotificationStore;

/// Buffered events per subscriber before the slowest one starts lagging.
const BROADCAST_CAPACITY: usize = 64;

/// Errors that end one connection attempt.
#[derive(Debug, Error)]
pub enum RealtimeError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Realtime endpoint rejected the token ({0})")]
    Unauthorized(StatusCode),

    #[error("Realtime endpoint returned {0}")]
    Status(StatusCode),

    #[error("Stream error: {0}")]
    Stream(String),
}

/// Realtime channel adapter.
#[derive(Clone)]
pub struct RealtimeAdapter {
    inner: Arc<RealtimeInner>,
}

struct RealtimeInner {
    listener: Arc<Listener>,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Drop for RealtimeInner {
    fn drop(&mut self) {
        let task = self.task.get_mut().unwrap_or_else(PoisonError::into_inner);
        if let Some(handle) = task.take() {
            handle.abort();
        }
    }
}

/// State the listener task needs; never holds the task's own handle.
struct Listener {
    http: reqwest::Client,
    url: Url,
    policy: RealtimeConfig,
    notifications: NotificationStore,
    sender: broadcast::Sender<RealtimeEvent>,
}

impl std::fmt::Debug for RealtimeAdapter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealtimeAdapter")
            .field("url", &self.inner.listener.url.as_str())
            .field("connected", &self.is_connected())
            .finish_non_exhaustive()
    }
}

impl RealtimeAdapter {
    /// Create a disconnected adapter.
    ///
    /// `http` should be built without a total request timeout; the stream is
    /// expected to stay open indefinitely.
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        url: Url,
        policy: RealtimeConfig,
        notifications: NotificationStore,
    ) -> Self {
        let (sender, _) = broadcast::channel(BROADCAST_CAPACITY);
        Self {
            inner: Arc::new(RealtimeInner {
                listener: Arc::new(Listener {
                    http,
                    url,
                    policy,
                    notifications,
                    sender,
                }),
                task: Mutex::new(None),
            }),
        }
    }

    /// Receive every event decoded after this call.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<RealtimeEvent> {
        self.inner.listener.sender.subscribe()
    }

    /// Whether a listener task is running.
    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.task().as_ref().is_some_and(|t| !t.is_finished())
    }

    /// Open the channel with `token`, replacing any existing connection.
    ///
    /// Must be called from within a Tokio runtime.
    pub fn connect(&self, token: SecretString) {
        let listener = Arc::clone(&self.inner.listener);
        let handle = tokio::spawn(async move { listener.listen(token).await });
        if let Some(previous) = self.task().replace(handle) {
            previous.abort();
            debug!("Replaced existing realtime connection");
        }
        info!(url = %self.inner.listener.url, "Realtime channel connecting");
    }

    /// Close the channel. Safe to call when not connected.
    pub fn disconnect(&self) {
        if let Some(handle) = self.task().take() {
            handle.abort();
            info!("Realtime channel disconnected");
        }
    }

    fn task(&self) -> MutexGuard<'_, Option<JoinHandle<()>>> {
        self.inner
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Listener {
    async fn listen(&self, token: SecretString) {
        let mut failures = 0u32;
        loop {
            match self.session(&token, &mut failures).await {
                Ok(()) => {
                    debug!("Realtime stream ended; reconnecting");
                    tokio::time::sleep(self.policy.initial_backoff).await;
                }
                Err(RealtimeError::Unauthorized(status)) => {
                    warn!(status = %status, "Realtime token rejected; not reconnecting");
                    return;
                }
                Err(e) => {
                    failures += 1;
                    if failures > self.policy.max_retries {
                        error!(error = %e, attempts = failures, "Realtime channel gave up");
                        return;
                    }
                    let delay = self.policy.backoff(failures);
                    warn!(
                        error = %e,
                        attempt = failures,
                        delay = ?delay,
                        "Realtime connection failed; retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
            }
        }
    }

    /// One connection: open the stream and dispatch frames until it ends.
    ///
    /// Resets `failures` once the endpoint accepts the stream.
    #[instrument(skip_all, fields(url = %self.url))]
    async fn session(
        &self,
        token: &SecretString,
        failures: &mut u32,
    ) -> Result<(), RealtimeError> {
        let response = self
            .http
            .get(self.url.clone())
            .bearer_auth(token.expose_secret())
            .header(ACCEPT, "text/event-stream")
            .header(CACHE_CONTROL, "no-cache")
            .send()
            .await?;

        let status = response.status();
        if matches!(status, StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN) {
            return Err(RealtimeError::Unauthorized(status));
        }
        if !status.is_success() {
            return Err(RealtimeError::Status(status));
        }
        info!("Realtime channel connected");
        *failures = 0;

        let mut frames = std::pin::pin!(frames(response));
        while let Some(frame) = frames.next().await {
            self.dispatch(&frame?);
        }
        Ok(())
    }

    fn dispatch(&self, frame: &SseFrame) {
        let event = match RealtimeEvent::from_frame(frame) {
            Ok(event) => event,
            Err(EventError::UnknownName(e)) => {
                debug!(error = %e, "Ignoring realtime event");
                return;
            }
            Err(e) => {
                warn!(error = %e, "Dropping malformed realtime event");
                return;
            }
        };

        debug!(event = %event.name, "Realtime event received");
        self.notifications.push(event.to_notification());
        // No subscribers is fine; the feed already has the event.
        let _ = self.sender.send(event);
    }
}

/// Decode a response body into SSE frames.
fn frames(response: reqwest::Response) -> impl Stream<Item = Result<SseFrame, RealtimeError>> {
    stream! {
        let mut buffer = String::new();
        // Bytes of a UTF-8 sequence split across chunks.
        let mut pending: Vec<u8> = Vec::new();
        let mut bytes = std::pin::pin!(response.bytes_stream());

        while let Some(chunk) = bytes.next().await {
            match chunk {
                Ok(chunk) => pending.extend_from_slice(&chunk),
                Err(e) => {
                    yield Err(RealtimeError::Stream(e.to_string()));
                    return;
                }
            }
            let valid = match std::str::from_utf8(&pending) {
                Ok(text) => text.len(),
                Err(e) if e.error_len().is_none() => e.valid_up_to(),
                Err(e) => {
                    yield Err(RealtimeError::Stream(format!("Invalid UTF-8: {e}")));
                    return;
                }
            };
            let rest = pending.split_off(valid);
            buffer.push_str(&String::from_utf8_lossy(&pending));
            pending = rest;

            while let Some(raw) = sse::extract_frame(&mut buffer) {
                if let Some(frame) = sse::parse_frame(&raw) {
                    yield Ok(frame);
                }
            }
        }
    }
}
