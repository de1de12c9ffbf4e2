//! Session store: login, registration, profile, and logout.
//!
//! The session (user record plus bearer token) lives in memory and is
//! mirrored into durable [`SessionStorage`] on every successful change. The
//! initial state is produced by [`hydrate_session`], which the entry point
//! calls explicitly before constructing the store.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use shopfront_core::{Email, ProfileUpdate, User};
use tracing::{error, info, instrument, warn};

use super::{RequestStatus, Slice, SliceState};
use crate::error::ApiError;
use crate::http::ApiClient;
use crate::storage::{SessionStorage, keys};
use crate::telemetry;

/// Session slice.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    /// Authenticated user record.
    pub user: Option<User>,
    /// Bearer token issued at login or registration.
    pub token: Option<SecretString>,
    /// Set together with `token`; never reconciled separately.
    pub is_authenticated: bool,
    /// Request flags.
    pub status: RequestStatus,
}

impl SliceState for AuthState {
    fn status_mut(&mut self) -> &mut RequestStatus {
        &mut self.status
    }
}

impl AuthState {
    fn sign_in(&mut self, session: SessionEnvelope) {
        self.user = Some(session.user);
        self.token = Some(SecretString::from(session.token));
        self.is_authenticated = true;
    }

    fn sign_out(&mut self) {
        self.user = None;
        self.token = None;
        self.is_authenticated = false;
    }
}

/// Login credentials.
#[derive(Debug, Clone, Serialize)]
pub struct Credentials {
    pub email: Email,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
}

/// New-account details.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub name: String,
    pub email: Email,
    #[serde(serialize_with = "expose")]
    pub password: SecretString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct PasswordChange<'a> {
    current_password: &'a str,
    new_password: &'a str,
}

fn expose<S: Serializer>(secret: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

#[derive(Deserialize)]
struct SessionEnvelope {
    user: User,
    token: String,
}

#[derive(Deserialize)]
struct UserEnvelope {
    user: User,
}

#[derive(Deserialize)]
struct Ack {}

/// Build the initial session from durable storage.
///
/// A missing or unreadable user record yields `user: None`; the token alone
/// decides `is_authenticated`, mirroring how it is written.
#[must_use]
pub fn hydrate_session(storage: &dyn SessionStorage) -> AuthState {
    let token = storage.get(keys::TOKEN).unwrap_or_else(|e| {
        warn!(error = %e, "Failed to read stored token");
        None
    });
    let user = storage
        .get(keys::USER)
        .unwrap_or_else(|e| {
            warn!(error = %e, "Failed to read stored user");
            None
        })
        .and_then(|raw| {
            serde_json::from_str::<User>(&raw)
                .inspect_err(|e| warn!(error = %e, "Stored user record is corrupt; ignoring"))
                .ok()
        });

    let token = token.filter(|t| !t.is_empty());
    AuthState {
        user,
        is_authenticated: token.is_some(),
        token: token.map(SecretString::from),
        status: RequestStatus::default(),
    }
}

/// Session store.
#[derive(Clone)]
pub struct AuthStore {
    inner: Arc<AuthStoreInner>,
}

struct AuthStoreInner {
    api: ApiClient,
    storage: Arc<dyn SessionStorage>,
    slice: Slice<AuthState>,
}

impl AuthStore {
    /// Create the store from an already-hydrated initial state.
    #[must_use]
    pub fn new(api: ApiClient, storage: Arc<dyn SessionStorage>, initial: AuthState) -> Self {
        Self {
            inner: Arc::new(AuthStoreInner {
                api,
                storage,
                slice: Slice::new(initial),
            }),
        }
    }

    /// Clone of the current session state.
    pub async fn snapshot(&self) -> AuthState {
        self.inner.slice.snapshot().await
    }

    /// Whether a session is currently active.
    pub async fn is_authenticated(&self) -> bool {
        self.inner.slice.read(|s| s.is_authenticated).await
    }

    /// Log in with email and password.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous session is left untouched.
    #[instrument(skip(self, credentials), fields(email = %credentials.email))]
    pub async fn login(&self, credentials: &Credentials) -> Result<User, ApiError> {
        let request = self.inner.api.post::<SessionEnvelope, _>("auth/login", credentials);
        self.open_session("login", "Login failed", request).await
    }

    /// Create an account and log in.
    ///
    /// # Errors
    ///
    /// Returns the API error; the previous session is left untouched.
    #[instrument(skip(self, registration), fields(email = %registration.email))]
    pub async fn register(&self, registration: &Registration) -> Result<User, ApiError> {
        let request = self
            .inner
            .api
            .post::<SessionEnvelope, _>("auth/register", registration);
        self.open_session("register", "Registration failed", request).await
    }

    async fn open_session(
        &self,
        operation: &'static str,
        fallback: &'static str,
        request: impl Future<Output = Result<SessionEnvelope, ApiError>>,
    ) -> Result<User, ApiError> {
        let user = self
            .inner
            .slice
            .dispatch(operation, fallback, request, |state, session| {
                self.persist_session(&session.user, Some(&session.token));
                state.sign_in(session);
                state.user.clone()
            })
            .await?
            .ok_or_else(ApiError::unknown)?;

        telemetry::set_user(&user);
        info!(user_id = %user.id, "Session opened");
        Ok(user)
    }

    /// Refresh the user record.
    ///
    /// An `Unauthorized` failure is treated as session expiry: the session is
    /// cleared from memory and durable storage. Only the session; the other
    /// stores and the realtime channel are untouched. Go through
    /// [`Storefront::refresh_session`](crate::Storefront::refresh_session) to
    /// get the full logout cascade.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    #[instrument(skip(self))]
    pub async fn get_profile(&self) -> Result<User, ApiError> {
        let request = self.inner.api.get::<UserEnvelope>("auth/me");
        let result = self
            .inner
            .slice
            .dispatch("get_profile", "Failed to load profile", request, |state, body| {
                self.persist_session(&body.user, None);
                state.user = Some(body.user.clone());
                body.user
            })
            .await;

        match result {
            Ok(user) => {
                telemetry::set_user(&user);
                Ok(user)
            }
            Err(err) if err.is_unauthorized() => {
                warn!("Profile fetch rejected; treating session as expired");
                self.clear_session().await;
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Partially update the profile. The stored user is replaced by the
    /// backend's response, not merged.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    #[instrument(skip(self, fields))]
    pub async fn update_profile(&self, fields: &ProfileUpdate) -> Result<User, ApiError> {
        let request = self.inner.api.put::<UserEnvelope, _>("auth/profile", fields);
        self.inner
            .slice
            .dispatch("update_profile", "Failed to update profile", request, |state, body| {
                self.persist_session(&body.user, None);
                state.user = Some(body.user.clone());
                body.user
            })
            .await
    }

    /// Change the account password. Session state is otherwise untouched.
    ///
    /// # Errors
    ///
    /// Returns the API error.
    #[instrument(skip_all)]
    pub async fn change_password(
        &self,
        current: &SecretString,
        new: &SecretString,
    ) -> Result<(), ApiError> {
        let body = PasswordChange {
            current_password: current.expose_secret(),
            new_password: new.expose_secret(),
        };
        let request = self.inner.api.put::<Ack, _>("auth/password", &body);
        self.inner
            .slice
            .dispatch("change_password", "Failed to change password", request, |_, _| ())
            .await
    }

    /// End the session locally. Never touches the network and is safe to
    /// call when no session exists.
    pub async fn logout(&self) {
        self.clear_session().await;
        info!("Logged out");
    }

    /// Clear the recorded error.
    pub async fn clear_error(&self) {
        self.inner.slice.update(|s| s.status.error = None).await;
    }

    async fn clear_session(&self) {
        self.inner.slice.update(AuthState::sign_out).await;
        for key in [keys::USER, keys::TOKEN] {
            if let Err(e) = self.inner.storage.remove(key) {
                error!(key, error = %e, "Failed to clear session storage");
            }
        }
        telemetry::clear_user();
    }

    /// Mirror the session into durable storage. The token is only written
    /// when a new one was issued.
    fn persist_session(&self, user: &User, token: Option<&str>) {
        match serde_json::to_string(user) {
            Ok(raw) => {
                if let Err(e) = self.inner.storage.set(keys::USER, &raw) {
                    error!(error = %e, "Failed to persist user record");
                }
            }
            Err(e) => error!(error = %e, "Failed to encode user record"),
        }
        if let Some(token) = token
            && let Err(e) = self.inner.storage.set(keys::TOKEN, token)
        {
            error!(error = %e, "Failed to persist bearer token");
        }
    }
}
