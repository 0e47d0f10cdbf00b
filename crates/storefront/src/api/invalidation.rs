//! Session invalidation signal.
//!
//! When any request comes back 401 the API client purges the stored
//! credential and then tells every registered listener. Listeners are held
//! weakly so that a listener owning the client does not keep itself alive.

use std::sync::{Mutex, PoisonError, Weak};

use reqwest::Method;

/// Details of the request whose 401 revoked the session.
#[derive(Debug, Clone)]
pub struct SessionRevoked {
    /// HTTP method of the failing request.
    pub method: Method,
    /// API path of the failing request.
    pub path: String,
    /// Request ID sent with the failing request.
    pub request_id: String,
    /// Server-provided reason.
    pub detail: String,
}

/// Receives the session invalidation signal.
///
/// Called synchronously from inside the API client before the failing call
/// returns to its caller, so implementations must not block.
pub trait InvalidationListener: Send + Sync {
    /// The credential has been purged because the server rejected it.
    fn session_invalidated(&self, event: &SessionRevoked);
}

/// Registered invalidation listeners.
#[derive(Default)]
pub(crate) struct Listeners {
    entries: Mutex<Vec<Weak<dyn InvalidationListener>>>,
}

impl Listeners {
    pub(crate) fn register(&self, listener: Weak<dyn InvalidationListener>) {
        let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
        entries.retain(|entry| entry.strong_count() > 0);
        entries.push(listener);
    }

    /// Deliver an event to every live listener. Returns how many were reached.
    pub(crate) fn notify(&self, event: &SessionRevoked) -> usize {
        // Upgrade under the lock, call outside it so listeners may register others.
        let live: Vec<_> = {
            let mut entries = self.entries.lock().unwrap_or_else(PoisonError::into_inner);
            entries.retain(|entry| entry.strong_count() > 0);
            entries.iter().filter_map(Weak::upgrade).collect()
        };

        for listener in &live {
            listener.session_invalidated(event);
        }

        live.len()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    #[derive(Default)]
    struct Counter(AtomicUsize);

    impl InvalidationListener for Counter {
        fn session_invalidated(&self, _event: &SessionRevoked) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn event() -> SessionRevoked {
        SessionRevoked {
            method: Method::DELETE,
            path: "/cart/items/7".to_string(),
            request_id: "req-1".to_string(),
            detail: "Token has expired".to_string(),
        }
    }

    #[test]
    fn test_notify_reaches_each_listener_once() {
        let listeners = Listeners::default();
        let counter = Arc::new(Counter::default());
        let weak: Weak<dyn InvalidationListener> = Arc::downgrade(&counter) as Weak<Counter>;
        listeners.register(weak);

        assert_eq!(listeners.notify(&event()), 1);
        assert_eq!(counter.0.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_dropped_listener_is_skipped() {
        let listeners = Listeners::default();
        let counter = Arc::new(Counter::default());
        let weak: Weak<dyn InvalidationListener> = Arc::downgrade(&counter) as Weak<Counter>;
        listeners.register(weak);
        drop(counter);

        assert_eq!(listeners.notify(&event()), 0);
    }
}
