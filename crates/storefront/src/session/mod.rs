//! Authenticated session lifecycle.
//!
//! # States
//!
//! ```text
//!              login()                      /auth/me ok
//! Unauthenticated ──────▶ Authenticated ◀────────────── Validating
//!        ▲                     │                             │
//!        └──── logout() / 401 ─┘◀──── /auth/me failed ───────┘
//! ```
//!
//! - The manager starts in `Validating` when a credential is persisted and in
//!   `Unauthenticated` otherwise.
//! - Validation runs once per process. A single failed `/auth/me` is final:
//!   the credential is purged and there is no retry.
//! - There is no way back from `Authenticated` to `Validating`.
//! - `logout()` goes home; a 401 from any request goes to sign-in, keeping
//!   the location the user was on.

mod state;

pub use state::{Session, SessionStatus};

use std::sync::{Arc, Weak};

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::watch;
use tracing::instrument;

use virtual_wardrobe_core::UserSummary;

use crate::api::{ApiClient, InvalidationListener, SessionRevoked};
use crate::credentials::{CredentialStore, CredentialStoreError};
use crate::error::{AppError, Result, clear_sentry_user, set_sentry_user};
use crate::models::{AuthResponse, Credential};
use crate::navigation::{self, Destination, Navigator, RouteAccess};

const ME_PATH: &str = "/auth/me";
const LOGIN_PATH: &str = "/auth/login";
const SIGNUP_PATH: &str = "/auth/signup";

/// Minimum password length accepted by the sign-up endpoint.
pub const MIN_PASSWORD_LENGTH: usize = 8;

#[derive(Serialize)]
struct SignInRequest<'a> {
    email: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
struct SignUpRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    full_name: Option<&'a str>,
}

/// Owns the session state machine.
///
/// Cheap to clone. Views and the cart observe it through [`SessionManager::subscribe`].
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionInner>,
}

struct SessionInner {
    api: ApiClient,
    credentials: Arc<dyn CredentialStore>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<Session>,
}

impl SessionManager {
    /// Create the manager and register it as the API client's invalidation
    /// handler.
    ///
    /// `credentials` must be the store the API client reads from.
    #[must_use]
    pub fn new(
        api: ApiClient,
        credentials: Arc<dyn CredentialStore>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let initial = if credentials.has_credential() {
            Session::validating()
        } else {
            Session::unauthenticated()
        };
        let (state, _) = watch::channel(initial);

        let inner = Arc::new(SessionInner {
            api,
            credentials,
            navigator,
            state,
        });

        let listener: Weak<dyn InvalidationListener> =
            Arc::downgrade(&inner) as Weak<SessionInner>;
        inner.api.on_session_invalidated(listener);

        Self { inner }
    }

    /// Current session snapshot.
    #[must_use]
    pub fn session(&self) -> Session {
        self.inner.state.borrow().clone()
    }

    /// Observe session changes.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.inner.state.subscribe()
    }

    /// Whether the session is authenticated right now.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.inner.state.borrow().is_authenticated()
    }

    /// Apply the protected-route rule to a location.
    #[must_use]
    pub fn route_access(&self, location: &str) -> RouteAccess {
        navigation::guard(&self.session(), location)
    }

    /// Validate the persisted credential with the server.
    ///
    /// Only does anything while the session is `Validating`; otherwise the
    /// current session is returned unchanged. Never leaves the session in
    /// `Validating`.
    #[instrument(skip(self))]
    pub async fn validate(&self) -> Session {
        if !self.inner.state.borrow().is_validating() {
            return self.session();
        }

        match self.inner.api.get::<UserSummary>(ME_PATH).await {
            Ok(user) => {
                let entered = self.inner.state.send_if_modified(|session| {
                    if !session.is_validating() {
                        return false;
                    }
                    *session = session.signed_in(user.clone());
                    true
                });

                if entered {
                    self.inner.refresh_persisted_user(&user);
                    set_sentry_user(&user.id, Some(&user.email));
                    tracing::info!(user_id = %user.id, "Session validated");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Session validation failed");
                self.inner.state.send_if_modified(|session| {
                    if !session.is_validating() {
                        return false;
                    }
                    // Purge as part of the transition so a concurrent login is never wiped.
                    if let Err(e) = self.inner.credentials.clear() {
                        tracing::error!(error = %e, "Failed to purge invalid credential");
                    }
                    *session = session.signed_out();
                    true
                });
            }
        }

        self.session()
    }

    /// Sign in with a token issued by a prior successful authentication call.
    ///
    /// Persists the credential first, then updates the session. No request
    /// is made.
    ///
    /// # Errors
    ///
    /// Returns an error if the credential cannot be persisted; the session is
    /// left unchanged in that case.
    pub fn login(&self, token: impl Into<String>, user: UserSummary) -> Result<Session> {
        let credential = Credential::new(token, user.clone());
        self.inner.credentials.save(&credential)?;

        self.inner
            .state
            .send_modify(|session| *session = session.signed_in(user.clone()));

        set_sentry_user(&user.id, Some(&user.email));
        tracing::info!(user_id = %user.id, "Signed in");
        Ok(self.session())
    }

    /// Sign out and go to the home view.
    ///
    /// The in-memory session is cleared even if purging the stored
    /// credential fails.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored credential could not be purged.
    pub fn logout(&self) -> Result<()> {
        let purged = self.inner.end_session();
        self.inner.navigator.navigate(&Destination::Home);
        tracing::info!("Signed out");
        Ok(purged?)
    }

    /// Exchange email and password for a credential and sign in.
    ///
    /// # Errors
    ///
    /// Returns the API error on rejection (401 for bad credentials) or a
    /// credential store error if the result cannot be persisted.
    #[instrument(skip(self, password))]
    pub async fn sign_in(&self, email: &str, password: &SecretString) -> Result<Session> {
        let request = SignInRequest {
            email,
            password: password.expose_secret(),
        };
        let response: AuthResponse = self.inner.api.post_json(LOGIN_PATH, &request).await?;
        self.login(response.token, response.user)
    }

    /// Create an account and sign in with it.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] for a password shorter than
    /// [`MIN_PASSWORD_LENGTH`] without contacting the server, otherwise any
    /// API or credential store error.
    #[instrument(skip(self, password))]
    pub async fn sign_up(
        &self,
        email: &str,
        password: &SecretString,
        full_name: Option<&str>,
    ) -> Result<Session> {
        let password = password.expose_secret();
        if password.chars().count() < MIN_PASSWORD_LENGTH {
            return Err(AppError::InvalidInput(format!(
                "Password must be at least {MIN_PASSWORD_LENGTH} characters long"
            )));
        }

        let request = SignUpRequest {
            email,
            password,
            full_name: full_name.filter(|name| !name.trim().is_empty()),
        };
        let response: AuthResponse = self.inner.api.post_json(SIGNUP_PATH, &request).await?;
        self.login(response.token, response.user)
    }
}

impl SessionInner {
    /// Purge the stored credential and reset the session.
    ///
    /// Memory is reset even if the purge fails.
    fn end_session(&self) -> std::result::Result<(), CredentialStoreError> {
        let purged = self.credentials.clear();
        if let Err(e) = &purged {
            let event_id = sentry::capture_error(e);
            tracing::error!(
                error = %e,
                sentry_event_id = %event_id,
                "Failed to purge stored credential"
            );
        }

        self.state.send_if_modified(|session| {
            if matches!(session.status(), SessionStatus::Unauthenticated) {
                return false;
            }
            *session = session.signed_out();
            true
        });

        clear_sentry_user();
        purged
    }

    /// Keep the persisted user summary in step with the validated one.
    fn refresh_persisted_user(&self, user: &UserSummary) {
        let result = match self.credentials.load() {
            Ok(Some(credential)) if credential.user() != user => self
                .credentials
                .save(&credential.with_user(user.clone())),
            Ok(_) => Ok(()),
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "Failed to refresh persisted user summary");
        }
    }
}

impl InvalidationListener for SessionInner {
    fn session_invalidated(&self, event: &SessionRevoked) {
        tracing::info!(path = %event.path, detail = %event.detail, "Session invalidated");

        // Already purged by the API client; clearing an empty store is a no-op.
        let _ = self.end_session();

        let location = self.navigator.current_location();
        if !navigation::is_sign_in(&location) {
            self.navigator.navigate(&Destination::sign_in_from(&location));
        }
    }
}
