//! Unified error handling with Sentry integration.
//!
//! Provides a unified `AppError` type for every manager operation. Server-side
//! failures are captured to Sentry by [`AppError::report`]; the message shown
//! to the user comes from [`AppError::notice_message`] and never carries
//! internal details.

use thiserror::Error;

use crate::api::ApiError;
use crate::config::ConfigError;
use crate::credentials::CredentialStoreError;

/// Application-level error type for the storefront client.
#[derive(Debug, Error)]
pub enum AppError {
    /// Remote API call failed.
    #[error("API error: {0}")]
    Api(#[from] ApiError),

    /// Credential persistence failed.
    #[error("Credential store error: {0}")]
    Credentials(#[from] CredentialStoreError),

    /// Configuration is missing or invalid.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// The operation needs a signed-in user.
    #[error("Not authenticated")]
    NotAuthenticated,

    /// Input rejected before contacting the server.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),
}

impl AppError {
    /// Whether the failure is on our side (transport, server, storage)
    /// rather than caused by the user.
    #[must_use]
    pub const fn is_server_side(&self) -> bool {
        match self {
            Self::Api(e) => e.is_server_side(),
            Self::Credentials(_) | Self::Config(_) => true,
            Self::NotAuthenticated | Self::InvalidInput(_) | Self::NotFound(_) => false,
        }
    }

    /// Log the error, capturing server-side failures to Sentry.
    pub fn report(&self, operation: &str) {
        if self.is_server_side() {
            let event_id = sentry::capture_error(self);
            tracing::error!(
                error = %self,
                operation,
                sentry_event_id = %event_id,
                "Operation failed"
            );
        } else {
            tracing::warn!(error = %self, operation, "Operation failed");
        }
    }

    /// Message safe to show to the user.
    #[must_use]
    pub fn notice_message(&self) -> String {
        match self {
            Self::Api(
                ApiError::Unauthorized(detail) | ApiError::Rejected { detail, .. },
            ) if !detail.is_empty() => detail.clone(),
            Self::Api(ApiError::Unauthorized(_)) | Self::NotAuthenticated => {
                "Please sign in to continue".to_string()
            }
            Self::Api(ApiError::RateLimited(secs)) => {
                format!("Too many requests, please try again in {secs} seconds")
            }
            Self::Api(ApiError::Http(_)) => "Could not reach the server".to_string(),
            Self::Api(_) | Self::Credentials(_) | Self::Config(_) => {
                "Something went wrong, please try again".to_string()
            }
            Self::InvalidInput(msg) => msg.clone(),
            Self::NotFound(what) => format!("{what} not found"),
        }
    }
}

/// Result type alias for `AppError`.
pub type Result<T> = std::result::Result<T, AppError>;

/// Set the Sentry user context from a user ID.
///
/// Call this after successful authentication to associate errors with users.
pub fn set_sentry_user(user_id: &impl ToString, email: Option<&str>) {
    sentry::configure_scope(|scope| {
        scope.set_user(Some(sentry::User {
            id: Some(user_id.to_string()),
            email: email.map(String::from),
            ..Default::default()
        }));
    });
}

/// Clear the Sentry user context.
pub fn clear_sentry_user() {
    sentry::configure_scope(|scope| {
        scope.set_user(None);
    });
}

/// Add a breadcrumb for user actions.
///
/// Breadcrumbs appear in Sentry error reports to show the trail of user actions
/// leading up to an error.
///
/// # Example
///
/// ```rust,ignore
/// add_breadcrumb("cart", "Added item", Some(&[("product_id", "2")]));
/// ```
pub fn add_breadcrumb(category: &str, message: &str, data: Option<&[(&str, &str)]>) {
    let mut breadcrumb = sentry::Breadcrumb {
        category: Some(category.to_string()),
        message: Some(message.to_string()),
        level: sentry::Level::Info,
        ..Default::default()
    };

    for (key, value) in data.unwrap_or_default() {
        breadcrumb.data.insert(
            (*key).to_string(),
            serde_json::Value::String((*value).to_string()),
        );
    }

    sentry::add_breadcrumb(breadcrumb);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_error_display() {
        let err = AppError::NotFound("Product 9".to_string());
        assert_eq!(err.to_string(), "Not found: Product 9");

        let err = AppError::InvalidInput("Please upload your photo first".to_string());
        assert_eq!(err.to_string(), "Invalid input: Please upload your photo first");
    }

    #[test]
    fn test_notice_message_hides_server_details() {
        let err = AppError::Api(ApiError::Server {
            status: 500,
            detail: "psycopg2.OperationalError".to_string(),
        });
        assert!(err.is_server_side());
        assert_eq!(err.notice_message(), "Something went wrong, please try again");
    }

    #[test]
    fn test_notice_message_passes_rejection_detail() {
        let err = AppError::Api(ApiError::Rejected {
            status: 400,
            detail: "Email already registered".to_string(),
        });
        assert!(!err.is_server_side());
        assert_eq!(err.notice_message(), "Email already registered");
    }

    #[test]
    fn test_notice_message_for_auth() {
        assert_eq!(
            AppError::NotAuthenticated.notice_message(),
            "Please sign in to continue"
        );
        assert_eq!(
            AppError::Api(ApiError::Unauthorized(String::new())).notice_message(),
            "Please sign in to continue"
        );
        assert_eq!(
            AppError::Api(ApiError::Unauthorized("Incorrect email or password".to_string()))
                .notice_message(),
            "Incorrect email or password"
        );
    }

    #[test]
    fn test_report_does_not_panic_without_sentry() {
        AppError::NotFound("Product 9".to_string()).report("catalog.product");
        AppError::Config(ConfigError::MissingEnvVar("WARDROBE_API_BASE_URL".to_string()))
            .report("startup");
    }
}
