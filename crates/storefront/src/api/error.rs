//! API client error types.

use thiserror::Error;

use crate::credentials::CredentialStoreError;

/// Errors that can occur when talking to the Virtual Wardrobe API.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed (connection, TLS, timeout, body read).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server rejected the credential. The session has already been
    /// revoked by the time the caller sees this.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// Any other 4xx response.
    #[error("Request rejected ({status}): {detail}")]
    Rejected {
        /// HTTP status code.
        status: u16,
        /// Server-provided detail message.
        detail: String,
    },

    /// A 5xx response.
    #[error("Server error ({status}): {detail}")]
    Server {
        /// HTTP status code.
        status: u16,
        /// Server-provided detail message.
        detail: String,
    },

    /// Rate limited by the server.
    #[error("Rate limited, retry after {0} seconds")]
    RateLimited(u64),

    /// JSON encoding or decoding failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The request URL could not be built.
    #[error("Invalid request URL: {0}")]
    Url(#[from] url::ParseError),

    /// The credential store could not be read.
    #[error("Credential store error: {0}")]
    Credentials(#[from] CredentialStoreError),
}

impl ApiError {
    /// HTTP status code carried by the error, if the server answered.
    #[must_use]
    pub const fn status(&self) -> Option<u16> {
        match self {
            Self::Unauthorized(_) => Some(401),
            Self::Rejected { status, .. } | Self::Server { status, .. } => Some(*status),
            Self::RateLimited(_) => Some(429),
            _ => None,
        }
    }

    /// Whether this error revoked the session.
    #[must_use]
    pub const fn is_session_revoked(&self) -> bool {
        matches!(self, Self::Unauthorized(_))
    }

    /// Whether the server reported the resource as missing.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Rejected { status: 404, .. })
    }

    /// Whether the failure is on the server or transport side rather than
    /// caused by the request itself.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        matches!(
            self,
            Self::Http(_) | Self::Server { .. } | Self::Parse(_) | Self::Credentials(_)
        )
    }
}

/// Extract the `detail` message from a FastAPI-style error body.
///
/// Validation errors carry a list of objects with `msg` fields; those are
/// joined. Anything else falls back to the first 200 characters of the body.
pub(crate) fn error_detail(body: &str) -> String {
    let parsed = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|json| match json.get("detail")? {
            serde_json::Value::String(s) => Some(s.clone()),
            serde_json::Value::Array(items) => {
                let messages: Vec<_> = items
                    .iter()
                    .filter_map(|item| item.get("msg").and_then(serde_json::Value::as_str))
                    .collect();
                (!messages.is_empty()).then(|| messages.join("; "))
            }
            _ => None,
        });

    parsed.unwrap_or_else(|| body.chars().take(200).collect())
}
