//! HTTP adapter for the storefront REST API.
//!
//! Attaches the bearer token from durable storage to every request and maps
//! transport and HTTP failures onto [`ApiError`]. Response bodies are decoded
//! into the caller's envelope type; unwrapping the named key is the caller's job.

use std::sync::Arc;

use reqwest::{Method, RequestBuilder, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::storage::{SessionStorage, keys};

/// Maximum number of body characters included in log lines.
const LOG_BODY_LIMIT: usize = 500;

/// Client for the storefront REST API.
///
/// Cheap to clone; all clones share one connection pool and one storage.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    storage: Arc<dyn SessionStorage>,
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.inner.base_url.as_str())
            .finish_non_exhaustive()
    }
}

/// Error body shape shared by every endpoint.
#[derive(serde::Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

impl ApiClient {
    /// Create a client for the API at `config.api_url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client fails to build.
    pub fn new(config: &ClientConfig, storage: Arc<dyn SessionStorage>) -> Result<Self, ApiError> {
        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()?;

        Ok(Self {
            inner: Arc::new(ApiClientInner {
                client,
                base_url: config.api_url.clone(),
                storage,
            }),
        })
    }

    /// Base URL every request path is joined onto.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Current bearer token, read from durable storage.
    ///
    /// Storage failures are logged and treated as "no token".
    #[must_use]
    pub fn bearer_token(&self) -> Option<String> {
        match self.inner.storage.get(keys::TOKEN) {
            Ok(token) => token.filter(|t| !t.is_empty()),
            Err(e) => {
                warn!(error = %e, "Failed to read bearer token from session storage");
                None
            }
        }
    }

    /// `GET path`.
    ///
    /// # Errors
    ///
    /// Returns an `ApiError` for transport failures, non-2xx statuses, or an
    /// unexpected body.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::GET, path, |r| r).await
    }

    /// `GET path?query`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn get_with_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize + ?Sized,
    {
        self.send(Method::GET, path, |r| r.query(query)).await
    }

    /// `POST path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn post<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::POST, path, |r| r.json(body)).await
    }

    /// `PUT path` with a JSON body.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn put<T, B>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        B: Serialize + ?Sized,
    {
        self.send(Method::PUT, path, |r| r.json(body)).await
    }

    /// `DELETE path`.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::get`].
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::DELETE, path, |r| r).await
    }

    /// Resolve `path` (with or without a leading `/`) against the base URL.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.inner
            .base_url
            .join(path.trim_start_matches('/'))
            .map_err(|e| {
                warn!(path, error = %e, "Invalid API path");
                ApiError::unknown()
            })
    }

    #[instrument(skip(self, build))]
    async fn send<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        build: impl FnOnce(RequestBuilder) -> RequestBuilder,
    ) -> Result<T, ApiError> {
        let url = self.url(path)?;
        let mut request = self.inner.client.request(method, url);
        if let Some(token) = self.bearer_token() {
            request = request.bearer_auth(token);
        }

        let response = build(request).send().await.map_err(|e| {
            warn!(error = %e, "API request failed before a response arrived");
            ApiError::from(e)
        })?;

        decode(response).await
    }
}

/// Turn a response into the expected envelope or a classified error.
async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let status = response.status();
    let body = response.text().await.map_err(ApiError::from)?;

    if !status.is_success() {
        let message = serde_json::from_str::<ErrorBody>(&body)
            .ok()
            .and_then(|b| b.message);
        warn!(
            status = %status,
            message = ?message,
            body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
            "API returned non-success status"
        );
        return Err(ApiError::http(status, message));
    }

    match serde_json::from_str(&body) {
        Ok(value) => {
            debug!(status = %status, "API request succeeded");
            Ok(value)
        }
        Err(e) => {
            warn!(
                error = %e,
                body = %body.chars().take(LOG_BODY_LIMIT).collect::<String>(),
                "Failed to decode API response"
            );
            Err(ApiError::decode(status))
        }
    }
}
