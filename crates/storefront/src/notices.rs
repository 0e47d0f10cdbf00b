//! Transient user-visible notices ("toasts").
//!
//! Managers report outcomes here instead of failing loudly; any view may
//! subscribe and render them. Notices sent with no subscriber are dropped.

use tokio::sync::broadcast;

const CHANNEL_CAPACITY: usize = 64;

/// Severity of a notice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Error,
}

/// A message for the user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl std::fmt::Display for Notice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

/// Broadcast channel for notices. Clones share one channel.
#[derive(Debug, Clone)]
pub struct Notices {
    sender: broadcast::Sender<Notice>,
}

impl Notices {
    /// Create a notice channel.
    #[must_use]
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(CHANNEL_CAPACITY);
        Self { sender }
    }

    /// Subscribe to notices sent from now on.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    /// Send a success notice.
    pub fn success(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Success, message.into());
    }

    /// Send an error notice.
    pub fn error(&self, message: impl Into<String>) {
        self.send(NoticeLevel::Error, message.into());
    }

    fn send(&self, level: NoticeLevel, message: String) {
        // No receivers is fine: nobody is looking.
        let _ = self.sender.send(Notice { level, message });
    }
}

impl Default for Notices {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_subscriber_receives_notices_in_order() {
        let notices = Notices::new();
        let mut rx = notices.subscribe();

        notices.success("Added to cart");
        notices.error("Failed to remove item");

        let first = rx.try_recv().unwrap();
        assert_eq!(first.level, NoticeLevel::Success);
        assert_eq!(first.to_string(), "Added to cart");
        assert_eq!(rx.try_recv().unwrap().level, NoticeLevel::Error);
    }

    #[test]
    fn test_send_without_subscribers_is_silent() {
        Notices::new().success("nobody listening");
    }
}
