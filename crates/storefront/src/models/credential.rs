//! Credential types.
//!
//! A credential is the bearer token issued by the identity endpoints plus the
//! user summary cached next to it. The two always travel together.

use chrono::{DateTime, Utc};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use virtual_wardrobe_core::UserSummary;

/// A bearer token and the user it was issued to.
///
/// `Debug` never prints the token.
#[derive(Clone)]
pub struct Credential {
    token: SecretString,
    user: UserSummary,
}

impl Credential {
    /// Pair a token with its user.
    #[must_use]
    pub fn new(token: impl Into<String>, user: UserSummary) -> Self {
        Self {
            token: SecretString::from(token.into()),
            user,
        }
    }

    /// The bearer token.
    #[must_use]
    pub const fn token(&self) -> &SecretString {
        &self.token
    }

    /// The cached user summary.
    #[must_use]
    pub const fn user(&self) -> &UserSummary {
        &self.user
    }

    /// Replace the cached user summary, keeping the token.
    #[must_use]
    pub fn with_user(self, user: UserSummary) -> Self {
        Self { user, ..self }
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credential")
            .field("token", &"[REDACTED]")
            .field("user", &self.user)
            .finish()
    }
}

/// On-disk form of a [`Credential`].
///
/// Token and user live in one document so they are written and removed as a
/// pair.
#[derive(Debug, Serialize, Deserialize)]
pub struct PersistedCredential {
    pub token: String,
    pub user: UserSummary,
    /// When the pair was written.
    pub saved_at: DateTime<Utc>,
}

impl From<&Credential> for PersistedCredential {
    fn from(credential: &Credential) -> Self {
        Self {
            token: credential.token.expose_secret().to_string(),
            user: credential.user.clone(),
            saved_at: Utc::now(),
        }
    }
}

impl From<PersistedCredential> for Credential {
    fn from(persisted: PersistedCredential) -> Self {
        Self::new(persisted.token, persisted.user)
    }
}

/// Response body of the sign-in and sign-up endpoints.
#[derive(Debug, Deserialize)]
pub struct AuthResponse {
    pub token: String,
    pub user: UserSummary,
}

impl From<AuthResponse> for Credential {
    fn from(response: AuthResponse) -> Self {
        Self::new(response.token, response.user)
    }
}
