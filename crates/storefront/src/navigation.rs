//! Application-level routing.
//!
//! The API client reports a revoked session; deciding where the user goes
//! next happens here. A [`Navigator`] knows the current location and can move
//! to a [`Destination`]. The terminal front end and tests supply their own.

use std::sync::{Mutex, PoisonError};

use url::form_urlencoded;

use crate::session::Session;

/// Path of the home view.
pub const HOME_PATH: &str = "/";

/// Path of the sign-in view.
pub const SIGN_IN_PATH: &str = "/login";

/// Where to send the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    /// The home view, as a full page load.
    Home,
    /// The sign-in view, remembering where to return after signing in.
    SignIn {
        /// Location the user was on (or trying to reach).
        from: Option<String>,
    },
    /// Any other location.
    Path(String),
}

impl Destination {
    /// Sign-in destination returning to `from` afterwards.
    ///
    /// A `from` that is itself the sign-in view is dropped.
    #[must_use]
    pub fn sign_in_from(from: &str) -> Self {
        let from = (!from.is_empty() && !is_sign_in(from)).then(|| from.to_string());
        Self::SignIn { from }
    }

    /// Location string for this destination, e.g. `/login?from=%2Fcart`.
    #[must_use]
    pub fn location(&self) -> String {
        match self {
            Self::Home => HOME_PATH.to_string(),
            Self::SignIn { from: None } => SIGN_IN_PATH.to_string(),
            Self::SignIn { from: Some(from) } => {
                format!("{SIGN_IN_PATH}?from={}", urlencoding::encode(from))
            }
            Self::Path(path) => path.clone(),
        }
    }
}

/// Whether a location is the sign-in view (query string ignored).
#[must_use]
pub fn is_sign_in(location: &str) -> bool {
    let path = location.split(['?', '#']).next().unwrap_or_default();
    path.trim_end_matches('/') == SIGN_IN_PATH
}

/// Extract the post-sign-in destination from a sign-in location.
///
/// Returns `None` if there is no `from` parameter.
#[must_use]
pub fn return_to(location: &str) -> Option<String> {
    let (_, query) = location.split_once('?')?;
    form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == "from")
        .map(|(_, value)| value.into_owned())
}

/// Moves the user between views.
pub trait Navigator: Send + Sync {
    /// The current location, e.g. `/cart`.
    fn current_location(&self) -> String;

    /// Move to a destination.
    fn navigate(&self, destination: &Destination);
}

/// Navigator that keeps its location and history in memory.
///
/// Used by the terminal front end and by tests to observe redirects.
#[derive(Debug)]
pub struct MemoryNavigator {
    history: Mutex<Vec<String>>,
}

impl MemoryNavigator {
    /// Start at the given location.
    #[must_use]
    pub fn new(location: impl Into<String>) -> Self {
        Self {
            history: Mutex::new(vec![location.into()]),
        }
    }

    /// Every location visited, oldest first, starting location included.
    #[must_use]
    pub fn history(&self) -> Vec<String> {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Number of navigations performed.
    #[must_use]
    pub fn navigation_count(&self) -> usize {
        self.history().len().saturating_sub(1)
    }
}

impl Default for MemoryNavigator {
    fn default() -> Self {
        Self::new(HOME_PATH)
    }
}

impl Navigator for MemoryNavigator {
    fn current_location(&self) -> String {
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .last()
            .cloned()
            .unwrap_or_else(|| HOME_PATH.to_string())
    }

    fn navigate(&self, destination: &Destination) {
        let location = destination.location();
        tracing::debug!(%location, "Navigating");
        self.history
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(location);
    }
}

// =============================================================================
// Route guard
// =============================================================================

/// Outcome of checking a protected location against the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RouteAccess {
    /// The session is still being validated; show a loading state.
    Pending,
    /// The user may see the location.
    Granted,
    /// The user must sign in first.
    Redirect(Destination),
}

/// Decide whether a protected location may be shown.
///
/// Unauthenticated users are sent to sign-in with the requested location
/// preserved for the post-sign-in redirect.
#[must_use]
pub fn guard(session: &Session, location: &str) -> RouteAccess {
    if session.is_validating() {
        RouteAccess::Pending
    } else if session.is_authenticated() {
        RouteAccess::Granted
    } else {
        RouteAccess::Redirect(Destination::sign_in_from(location))
    }
}
