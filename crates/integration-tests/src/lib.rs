//! Integration tests for Virtual Wardrobe.
//!
//! Every test runs the storefront library against a `wiremock` server
//! standing in for the remote API, so no real service is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p virtual-wardrobe-integration-tests
//! ```
//!
//! # Test Categories
//!
//! - `gateway` - Bearer credentials, request IDs, 401 invalidation
//! - `session` - Startup validation, sign-in, sign-out
//! - `cart` - Snapshot replacement, notices, session following
//! - `catalog` - Listing, filtering, caching
//! - `try_on` - Photo upload

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use tokio::sync::watch;
use url::Url;
use wiremock::MockServer;

use virtual_wardrobe_core::{UserId, UserSummary};
use virtual_wardrobe_storefront::Storefront;
use virtual_wardrobe_storefront::config::StorefrontConfig;
use virtual_wardrobe_storefront::credentials::MemoryCredentialStore;
use virtual_wardrobe_storefront::models::Credential;
use virtual_wardrobe_storefront::navigation::MemoryNavigator;

/// Token every test credential carries.
pub const TOKEN: &str = "test-token";

/// How long to wait for background state changes.
pub const SETTLE_TIMEOUT: Duration = Duration::from_secs(5);

/// A storefront wired to a mock API.
pub struct TestContext {
    pub server: MockServer,
    pub credentials: Arc<MemoryCredentialStore>,
    pub navigator: Arc<MemoryNavigator>,
    pub storefront: Storefront,
}

impl TestContext {
    /// Signed-out storefront on the home view.
    pub async fn new() -> Self {
        Self::build("/", None).await
    }

    /// Storefront with a persisted credential for [`user`], on `location`.
    pub async fn with_credential(location: &str) -> Self {
        Self::build(location, Some(Credential::new(TOKEN, user()))).await
    }

    /// Storefront starting on `location`, optionally with a persisted credential.
    pub async fn build(location: &str, credential: Option<Credential>) -> Self {
        let server = MockServer::start().await;
        let credentials = Arc::new(
            credential.map_or_else(MemoryCredentialStore::new, MemoryCredentialStore::with_credential),
        );
        let navigator = Arc::new(MemoryNavigator::new(location));

        let config = StorefrontConfig::with_base_url(Url::parse(&server.uri()).unwrap());
        let storefront = Storefront::new(config, credentials.clone(), navigator.clone());

        Self {
            server,
            credentials,
            navigator,
            storefront,
        }
    }
}

/// Wait until the watched state satisfies `predicate`.
///
/// Panics after [`SETTLE_TIMEOUT`].
pub async fn settle<T>(rx: &mut watch::Receiver<T>, predicate: impl FnMut(&T) -> bool) {
    tokio::time::timeout(SETTLE_TIMEOUT, rx.wait_for(predicate))
        .await
        .expect("state did not settle in time")
        .unwrap();
}

/// The test user.
pub fn user() -> UserSummary {
    UserSummary {
        id: UserId::new(1),
        email: "ada@example.com".to_string(),
        full_name: Some("Ada".to_string()),
    }
}

/// [`user`] as the API returns it.
pub fn user_json() -> Value {
    json!({"id": 1, "email": "ada@example.com", "full_name": "Ada"})
}

/// The blazer, product 2.
pub fn blazer_json() -> Value {
    json!({
        "id": 2,
        "name": "Tailored Wool Blazer",
        "brand": "Atelier",
        "price": 275.0,
        "image": "/images/blazer.jpg",
        "category": "Outerwear",
        "description": "Single-breasted blazer in Italian wool.",
        "colors": ["Camel", "Black"],
        "sizes": ["S", "M", "L"],
        "details": ["100% wool", "Dry clean only"]
    })
}

/// A silk scarf, product 5.
pub fn scarf_json() -> Value {
    json!({
        "id": 5,
        "name": "Silk Scarf",
        "brand": "Maison",
        "price": 45.5,
        "image": "/images/scarf.jpg",
        "category": "Accessories",
        "description": "",
        "colors": ["Ivory"],
        "sizes": ["One Size"],
        "details": []
    })
}

/// A cart line for product JSON `product`.
pub fn line_json(id: i32, product: &Value, quantity: u32, size: &str, color: &str) -> Value {
    json!({
        "id": id,
        "product": product,
        "quantity": quantity,
        "size": size,
        "color": color
    })
}

/// A cart snapshot.
pub fn cart_json(items: &[Value], total: f64) -> Value {
    json!({"id": 1, "items": items, "total": total})
}

/// An empty cart snapshot.
pub fn empty_cart_json() -> Value {
    cart_json(&[], 0.0)
}
