//! Virtual Wardrobe REST API client.
//!
//! [`ApiClient`] is the only channel the storefront uses to reach the remote
//! service, and the only place cross-cutting failure handling happens:
//!
//! - **Before dispatch** the credential store is read (every time, never
//!   cached) and the token, if any, is attached as a bearer credential.
//!   Requests without a token go out anonymously.
//! - **After receipt** a 401 purges the stored credential and notifies every
//!   [`InvalidationListener`] before the caller gets
//!   [`ApiError::Unauthorized`]. The failing request is not retried.
//! - Every other failure is returned as a typed [`ApiError`]. There is no
//!   retry and no backoff; that is the caller's call.
//!
//! The client never navigates. Routing on revocation is left to whoever
//! listens for it (see `session::SessionManager`).
//!
//! # Example
//!
//! ```rust,ignore
//! use virtual_wardrobe_storefront::api::ApiClient;
//!
//! let client = ApiClient::new(&config.api, credentials);
//! let cart: Cart = client.get("/cart").await?;
//! ```

mod error;
mod invalidation;

pub use error::ApiError;
pub use invalidation::{InvalidationListener, SessionRevoked};

use std::sync::{Arc, Weak};
use std::time::Duration;

use reqwest::multipart::Form;
use reqwest::{Method, StatusCode};
use secrecy::ExposeSecret;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{Span, instrument};
use url::Url;
use uuid::Uuid;

use crate::config::ApiConfig;
use crate::credentials::CredentialStore;

use error::error_detail;
use invalidation::Listeners;

/// The HTTP header carrying the per-request correlation ID.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Request payload.
#[derive(Debug)]
pub enum RequestBody {
    /// JSON document.
    Json(serde_json::Value),
    /// Multipart form (file uploads).
    Multipart(Form),
}

/// Per-request options.
#[derive(Debug, Default, Clone)]
pub struct RequestOptions {
    /// Query string parameters.
    pub query: Vec<(String, String)>,
    /// Overrides the client-wide timeout for this request.
    pub timeout: Option<Duration>,
}

impl RequestOptions {
    /// Add a query parameter.
    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.query.push((key.into(), value.to_string()));
        self
    }
}

/// A successful (2xx/3xx) response.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: StatusCode,
    /// Raw response body.
    pub body: String,
}

impl ApiResponse {
    /// Decode the body as JSON.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Parse`] if the body does not match `T`.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        serde_json::from_str(&self.body).map_err(|e| {
            tracing::error!(
                error = %e,
                body = %self.body.chars().take(500).collect::<String>(),
                "Failed to parse API response"
            );
            ApiError::Parse(e)
        })
    }
}

// =============================================================================
// ApiClient
// =============================================================================

/// Client for the Virtual Wardrobe REST API.
///
/// Cheap to clone; all clones share one connection pool, one credential
/// store and one listener registry.
#[derive(Clone)]
pub struct ApiClient {
    inner: Arc<ApiClientInner>,
}

struct ApiClientInner {
    client: reqwest::Client,
    base_url: Url,
    timeout: Option<Duration>,
    credentials: Arc<dyn CredentialStore>,
    listeners: Listeners,
}

impl ApiClient {
    /// Create a new API client reading its bearer token from `credentials`.
    #[must_use]
    pub fn new(config: &ApiConfig, credentials: Arc<dyn CredentialStore>) -> Self {
        Self {
            inner: Arc::new(ApiClientInner {
                client: reqwest::Client::new(),
                base_url: config.base_url.clone(),
                timeout: config.request_timeout,
                credentials,
                listeners: Listeners::default(),
            }),
        }
    }

    /// Base URL requests are sent to.
    #[must_use]
    pub fn base_url(&self) -> &Url {
        &self.inner.base_url
    }

    /// Register a listener for the session invalidation signal.
    ///
    /// The listener is held weakly; it stops receiving events once dropped.
    pub fn on_session_invalidated(&self, listener: Weak<dyn InvalidationListener>) {
        self.inner.listeners.register(listener);
    }

    /// Build the absolute URL for an API path such as `/cart/items/7`.
    fn url(&self, path: &str) -> Result<Url, ApiError> {
        let base = self.inner.base_url.as_str().trim_end_matches('/');
        let path = path.trim_start_matches('/');
        Ok(Url::parse(&format!("{base}/{path}"))?)
    }

    /// Send a request.
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::Unauthorized`] on a 401 (after revoking the
    /// session), [`ApiError::Rejected`]/[`ApiError::Server`] for other
    /// non-success statuses, and [`ApiError::Http`] when no response arrived.
    #[instrument(
        skip(self, method, path, body, options),
        fields(
            method = %method,
            path = %path,
            request_id = tracing::field::Empty,
            status = tracing::field::Empty
        )
    )]
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<RequestBody>,
        options: RequestOptions,
    ) -> Result<ApiResponse, ApiError> {
        let url = self.url(path)?;
        let request_id = Uuid::new_v4().to_string();
        Span::current().record("request_id", request_id.as_str());

        let mut request = self
            .inner
            .client
            .request(method.clone(), url)
            .header(REQUEST_ID_HEADER, &request_id);

        // Read the store on every request: a 401 elsewhere may have purged it.
        if let Some(credential) = self.inner.credentials.load()? {
            request = request.bearer_auth(credential.token().expose_secret());
        }

        if !options.query.is_empty() {
            request = request.query(&options.query);
        }

        if let Some(timeout) = options.timeout.or(self.inner.timeout) {
            request = request.timeout(timeout);
        }

        request = match body {
            Some(RequestBody::Json(json)) => request.json(&json),
            Some(RequestBody::Multipart(form)) => request.multipart(form),
            None => request,
        };

        let response = request.send().await?;
        let status = response.status();
        Span::current().record("status", status.as_u16());

        if status == StatusCode::UNAUTHORIZED {
            let body = response.text().await.unwrap_or_default();
            let detail = error_detail(&body);
            self.revoke_session(SessionRevoked {
                method,
                path: path.to_string(),
                request_id,
                detail: detail.clone(),
            });
            return Err(ApiError::Unauthorized(detail));
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            let retry_after = response
                .headers()
                .get("Retry-After")
                .and_then(|v| v.to_str().ok())
                .and_then(|s| s.parse::<u64>().ok())
                .unwrap_or(1);
            return Err(ApiError::RateLimited(retry_after));
        }

        let body = response.text().await?;

        if status.is_client_error() {
            tracing::debug!(status = %status, "API rejected request");
            return Err(ApiError::Rejected {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        if status.is_server_error() {
            tracing::error!(
                status = %status,
                body = %body.chars().take(500).collect::<String>(),
                "API returned server error"
            );
            return Err(ApiError::Server {
                status: status.as_u16(),
                detail: error_detail(&body),
            });
        }

        Ok(ApiResponse { status, body })
    }

    /// Purge the credential and signal every listener, exactly once per 401.
    fn revoke_session(&self, event: SessionRevoked) {
        if let Err(e) = self.inner.credentials.clear() {
            let event_id = sentry::capture_error(&e);
            tracing::error!(
                error = %e,
                sentry_event_id = %event_id,
                "Failed to purge credential after authentication failure"
            );
        }

        let notified = self.inner.listeners.notify(&event);
        tracing::warn!(
            method = %event.method,
            path = %event.path,
            request_id = %event.request_id,
            listeners = notified,
            "Authentication failed, session revoked"
        );
    }

    // =========================================================================
    // Typed helpers
    // =========================================================================

    /// `GET` a path and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if the body does not decode.
    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.get_with(path, RequestOptions::default()).await
    }

    /// `GET` a path with options and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if the body does not decode.
    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        options: RequestOptions,
    ) -> Result<T, ApiError> {
        self.send(Method::GET, path, None, options).await?.json()
    }

    /// `POST` a JSON body and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if either body does not (de)serialize.
    pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let body = RequestBody::Json(serde_json::to_value(body)?);
        self.send(Method::POST, path, Some(body), RequestOptions::default())
            .await?
            .json()
    }

    /// `POST` a multipart form and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if the body does not decode.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: Form,
    ) -> Result<T, ApiError> {
        self.send(
            Method::POST,
            path,
            Some(RequestBody::Multipart(form)),
            RequestOptions::default(),
        )
        .await?
        .json()
    }

    /// `DELETE` a path and decode the JSON response.
    ///
    /// # Errors
    ///
    /// See [`ApiClient::send`]; also fails if the body does not decode.
    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        self.send(Method::DELETE, path, None, RequestOptions::default())
            .await?
            .json()
    }
}
