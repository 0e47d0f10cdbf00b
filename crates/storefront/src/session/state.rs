//! Session state snapshot.

use virtual_wardrobe_core::UserSummary;

/// Where the session is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStatus {
    /// No trusted credential.
    Unauthenticated,
    /// A persisted credential exists and is being checked with the server.
    Validating,
    /// The credential has been accepted.
    Authenticated,
}

/// Snapshot of the session observed by views and the cart.
///
/// `generation` increases every time the session enters
/// [`SessionStatus::Authenticated`], so two authenticated snapshots with
/// different generations belong to different sign-ins.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    status: SessionStatus,
    user: Option<UserSummary>,
    generation: u64,
}

impl Session {
    /// Signed-out session.
    #[must_use]
    pub const fn unauthenticated() -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            user: None,
            generation: 0,
        }
    }

    /// Session awaiting validation of a persisted credential.
    ///
    /// The persisted user is not trusted yet, so none is exposed.
    #[must_use]
    pub const fn validating() -> Self {
        Self {
            status: SessionStatus::Validating,
            user: None,
            generation: 0,
        }
    }

    /// Signed-in session.
    #[must_use]
    pub const fn authenticated(user: UserSummary, generation: u64) -> Self {
        Self {
            status: SessionStatus::Authenticated,
            user: Some(user),
            generation,
        }
    }

    /// The next authenticated session for `user`.
    #[must_use]
    pub(crate) fn signed_in(&self, user: UserSummary) -> Self {
        Self::authenticated(user, self.generation.saturating_add(1))
    }

    /// This session signed out. The generation is kept so the next sign-in
    /// gets a fresh one.
    #[must_use]
    pub(crate) const fn signed_out(&self) -> Self {
        Self {
            status: SessionStatus::Unauthenticated,
            user: None,
            generation: self.generation,
        }
    }

    #[must_use]
    pub const fn status(&self) -> SessionStatus {
        self.status
    }

    /// The signed-in user, only while authenticated.
    #[must_use]
    pub const fn user(&self) -> Option<&UserSummary> {
        self.user.as_ref()
    }

    #[must_use]
    pub const fn generation(&self) -> u64 {
        self.generation
    }

    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        matches!(self.status, SessionStatus::Authenticated)
    }

    #[must_use]
    pub const fn is_validating(&self) -> bool {
        matches!(self.status, SessionStatus::Validating)
    }
}
