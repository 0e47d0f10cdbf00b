//! Session lifecycle against the mock API.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use url::Url;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use virtual_wardrobe_core::UserId;
use virtual_wardrobe_storefront::Storefront;
use virtual_wardrobe_storefront::config::StorefrontConfig;
use virtual_wardrobe_storefront::credentials::CredentialStore;
use virtual_wardrobe_storefront::error::AppError;
use virtual_wardrobe_storefront::models::Credential;
use virtual_wardrobe_storefront::navigation::{MemoryNavigator, Navigator, RouteAccess};
use virtual_wardrobe_storefront::session::SessionStatus;
use virtual_wardrobe_integration_tests::{
    TOKEN, TestContext, empty_cart_json, settle, user, user_json,
};

fn password(value: &str) -> SecretString {
    SecretString::from(value.to_string())
}

#[tokio::test]
async fn test_no_credential_starts_signed_out_without_validation() {
    let ctx = TestContext::new().await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let (session, sync) = ctx.storefront.start().await;

    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert!(session.user().is_none());
    sync.abort();
}

#[tokio::test]
async fn test_stored_credential_validates_and_fetches_cart() {
    let ctx = TestContext::with_credential("/").await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_cart_json()))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let mut cart = ctx.storefront.cart().subscribe();
    assert!(ctx.storefront.session().session().is_validating());
    assert_eq!(ctx.storefront.session().route_access("/cart"), RouteAccess::Pending);

    let (session, sync) = ctx.storefront.start().await;

    assert_eq!(session.status(), SessionStatus::Authenticated);
    assert_eq!(session.user(), Some(&user()));
    assert_eq!(ctx.storefront.session().route_access("/cart"), RouteAccess::Granted);
    settle(&mut cart, |state| state.cart.is_some()).await;
    sync.abort();
}

#[tokio::test]
async fn test_failed_validation_purges_credential() {
    let ctx = TestContext::with_credential("/").await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let session = ctx.storefront.session().validate().await;

    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert!(!ctx.credentials.has_credential());

    // Validation happens once; a second call does not retry.
    let again = ctx.storefront.session().validate().await;
    assert_eq!(again.status(), SessionStatus::Unauthenticated);
}

#[tokio::test]
async fn test_expired_credential_at_startup_redirects_to_sign_in() {
    let ctx = TestContext::with_credential("/checkout").await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&ctx.server)
        .await;

    let session = ctx.storefront.session().validate().await;

    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert!(!ctx.credentials.has_credential());
    assert_eq!(
        ctx.navigator.current_location(),
        "/login?from=%2Fcheckout"
    );
}

#[tokio::test]
async fn test_validation_refreshes_persisted_user() {
    let stale = virtual_wardrobe_core::UserSummary {
        id: UserId::new(1),
        email: "old@example.com".to_string(),
        full_name: None,
    };
    let ctx = TestContext::build("/", Some(Credential::new(TOKEN, stale))).await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .mount(&ctx.server)
        .await;

    ctx.storefront.session().validate().await;

    let stored = ctx.credentials.load().unwrap().unwrap();
    assert_eq!(stored.user(), &user());
    assert_eq!(stored.token().expose_secret(), TOKEN);
}

#[tokio::test]
async fn test_login_then_logout_leaves_no_credential() {
    let ctx = TestContext::build("/account", None).await;

    ctx.storefront.session().login(TOKEN, user()).unwrap();
    assert!(ctx.credentials.has_credential());
    assert!(ctx.storefront.session().is_authenticated());

    ctx.storefront.session().logout().unwrap();

    assert!(!ctx.credentials.has_credential());
    let session = ctx.storefront.session().session();
    assert_eq!(session.status(), SessionStatus::Unauthenticated);
    assert!(session.user().is_none());
    assert_eq!(ctx.navigator.current_location(), "/");
    assert!(ctx.server.received_requests().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_sign_in_exchanges_password_for_token() {
    let ctx = TestContext::build("/login", None).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .and(body_json(json!({"email": "ada@example.com", "password": "correct-horse"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "token": "fresh-token",
            "user": user_json()
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let session = ctx
        .storefront
        .session()
        .sign_in("ada@example.com", &password("correct-horse"))
        .await
        .unwrap();

    assert!(session.is_authenticated());
    assert_eq!(session.generation(), 1);
    let stored = ctx.credentials.load().unwrap().unwrap();
    assert_eq!(stored.token().expose_secret(), "fresh-token");
}

#[tokio::test]
async fn test_sign_up_creates_account_and_signs_in() {
    let ctx = TestContext::build("/signup", None).await;

    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .and(body_json(json!({
            "email": "ada@example.com",
            "password": "correct-horse",
            "full_name": "Ada"
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "token": "new-token",
            "user": user_json()
        })))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let session = ctx
        .storefront
        .session()
        .sign_up("ada@example.com", &password("correct-horse"), Some("Ada"))
        .await
        .unwrap();

    assert_eq!(session.user().unwrap().display_name(), "Ada");
    assert!(ctx.credentials.has_credential());
}

#[tokio::test]
async fn test_sign_up_short_password_never_reaches_server() {
    let ctx = TestContext::new().await;

    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&ctx.server)
        .await;

    let err = ctx
        .storefront
        .session()
        .sign_up("ada@example.com", &password("short"), None)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::InvalidInput(_)));
}

#[tokio::test]
async fn test_duplicate_sign_up_reports_server_detail() {
    let ctx = TestContext::new().await;

    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(
            ResponseTemplate::new(400).set_body_json(json!({"detail": "Email already registered"})),
        )
        .mount(&ctx.server)
        .await;

    let err = ctx
        .storefront
        .session()
        .sign_up("ada@example.com", &password("correct-horse"), None)
        .await
        .unwrap_err();

    assert_eq!(err.notice_message(), "Email already registered");
    assert!(!ctx.credentials.has_credential());
}

#[tokio::test]
async fn test_credential_file_survives_restart() {
    let server = MockServer::start().await;
    let dir = tempfile::tempdir().unwrap();

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = StorefrontConfig::with_base_url(Url::parse(&server.uri()).unwrap());
    config.credentials_path = dir.path().join("credentials.json");

    let first = Storefront::with_credential_file(config.clone(), Arc::new(MemoryNavigator::default()));
    first.session().login(TOKEN, user()).unwrap();
    drop(first);

    let second = Storefront::with_credential_file(config, Arc::new(MemoryNavigator::default()));
    assert!(second.session().session().is_validating());

    let session = second.session().validate().await;
    assert_eq!(session.user(), Some(&user()));
}
