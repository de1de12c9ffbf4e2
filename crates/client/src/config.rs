//! Client configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPFRONT_API_URL` - Base URL of the storefront REST API (e.g., `https://shop.example/api`)
//!
//! ## Optional
//! - `SHOPFRONT_REALTIME_URL` - Server-sent events endpoint (default: `<api>/events`)
//! - `SHOPFRONT_SESSION_FILE` - Durable session file (default: `.shopfront/session.json`)
//! - `SHOPFRONT_REQUEST_TIMEOUT_SECS` - Per-request timeout (default: 30)
//! - `SHOPFRONT_NOTIFICATION_CAPACITY` - Notification feed cap (default: 50)
//! - `SHOPFRONT_REALTIME_MAX_RETRIES` - Reconnect attempts before giving up (default: 5)
//! - `SHOPFRONT_REALTIME_MAX_BACKOFF_SECS` - Reconnect delay cap (default: 30)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;
use url::Url;

/// Default number of notifications kept in the feed.
pub const DEFAULT_NOTIFICATION_CAPACITY: usize = 50;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
}

/// Shopfront client configuration.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// REST API base URL, always ending in `/`
    pub api_url: Url,
    /// Realtime event stream URL
    pub realtime_url: Url,
    /// File holding the persisted session
    pub session_file: PathBuf,
    /// Timeout applied to every API request
    pub request_timeout: Duration,
    /// Maximum notifications kept in the feed
    pub notification_capacity: usize,
    /// Realtime reconnection policy
    pub realtime: RealtimeConfig,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Reconnection policy for the realtime channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RealtimeConfig {
    /// Consecutive failed connection attempts before the adapter gives up
    pub max_retries: u32,
    /// Delay before the first reconnect; doubled on each further attempt
    pub initial_backoff: Duration,
    /// Upper bound on the reconnect delay
    pub max_backoff: Duration,
}

impl Default for RealtimeConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            initial_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(30),
        }
    }
}

impl RealtimeConfig {
    /// Delay before reconnect attempt number `attempt` (1-based).
    #[must_use]
    pub fn backoff(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt.saturating_sub(1));
        self.initial_backoff
            .saturating_mul(factor)
            .min(self.max_backoff)
    }
}

impl ClientConfig {
    /// Configuration pointing at `api_url` with every optional setting at its default.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if `api_url` is not an absolute URL.
    pub fn new(api_url: &str) -> Result<Self, ConfigError> {
        let api_url = parse_base_url("SHOPFRONT_API_URL", api_url)?;
        let realtime_url = api_url
            .join("events")
            .map_err(|e| ConfigError::InvalidEnvVar("SHOPFRONT_REALTIME_URL".to_string(), e.to_string()))?;

        Ok(Self {
            api_url,
            realtime_url,
            session_file: PathBuf::from(".shopfront/session.json"),
            request_timeout: Duration::from_secs(30),
            notification_capacity: DEFAULT_NOTIFICATION_CAPACITY,
            realtime: RealtimeConfig::default(),
            sentry_dsn: None,
            sentry_environment: None,
        })
    }

    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing or invalid.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let mut config = Self::new(&get_required_env("SHOPFRONT_API_URL")?)?;

        if let Some(raw) = get_optional_env("SHOPFRONT_REALTIME_URL") {
            config.realtime_url = Url::parse(&raw).map_err(|e| {
                ConfigError::InvalidEnvVar("SHOPFRONT_REALTIME_URL".to_string(), e.to_string())
            })?;
        }
        if let Some(path) = get_optional_env("SHOPFRONT_SESSION_FILE") {
            config.session_file = PathBuf::from(path);
        }
        config.request_timeout =
            Duration::from_secs(get_parsed_or_default("SHOPFRONT_REQUEST_TIMEOUT_SECS", 30)?);
        config.notification_capacity = get_parsed_or_default(
            "SHOPFRONT_NOTIFICATION_CAPACITY",
            DEFAULT_NOTIFICATION_CAPACITY,
        )?;
        config.realtime.max_retries = get_parsed_or_default("SHOPFRONT_REALTIME_MAX_RETRIES", 5)?;
        config.realtime.max_backoff =
            Duration::from_secs(get_parsed_or_default("SHOPFRONT_REALTIME_MAX_BACKOFF_SECS", 30)?);
        config.sentry_dsn = get_optional_env("SENTRY_DSN");
        config.sentry_environment = get_optional_env("SENTRY_ENVIRONMENT");

        Ok(config)
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Parse a base URL, normalizing it to end with `/` so relative joins append.
fn parse_base_url(key: &str, raw: &str) -> Result<Url, ConfigError> {
    let mut url =
        Url::parse(raw).map_err(|e| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))?;
    if url.cannot_be_a_base() {
        return Err(ConfigError::InvalidEnvVar(
            key.to_string(),
            "URL cannot be used as a base".to_string(),
        ));
    }
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }
    Ok(url)
}

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable, treating empty values as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Parse an optional environment variable, falling back to `default`.
fn get_parsed_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}
