//! Signed-in user identity.

use serde::{Deserialize, Serialize};

use super::id::UserId;

/// The user summary returned by the identity endpoints.
///
/// This is the cached half of a credential: it is persisted next to the
/// bearer token and mirrored into the in-memory session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    /// User's account ID.
    pub id: UserId,
    /// User's email address.
    pub email: String,
    /// Optional display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
}

impl UserSummary {
    /// Name to greet the user with: the display name, falling back to the email.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.full_name
            .as_deref()
            .filter(|name| !name.trim().is_empty())
            .unwrap_or(&self.email)
    }
}
