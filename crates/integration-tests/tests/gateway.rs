//! API client behaviour shared by every request.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use serde_json::json;
use wiremock::matchers::{header, method, path};
use wiremock::{Mock, ResponseTemplate};

use virtual_wardrobe_core::{CartItemId, Product};
use virtual_wardrobe_storefront::api::ApiError;
use virtual_wardrobe_storefront::credentials::CredentialStore;
use virtual_wardrobe_storefront::error::AppError;
use virtual_wardrobe_storefront::navigation::Navigator;
use virtual_wardrobe_storefront::session::SessionStatus;
use virtual_wardrobe_integration_tests::{
    TOKEN, TestContext, blazer_json, empty_cart_json, settle, user, user_json,
};

#[tokio::test]
async fn test_bearer_token_attached_when_credential_stored() {
    let ctx = TestContext::with_credential("/").await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .and(header("authorization", format!("Bearer {TOKEN}").as_str()))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let session = ctx.storefront.session().validate().await;
    assert_eq!(session.status(), SessionStatus::Authenticated);
}

#[tokio::test]
async fn test_anonymous_request_has_no_authorization() {
    let ctx = TestContext::new().await;

    Mock::given(method("GET"))
        .and(path("/products/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(blazer_json()))
        .mount(&ctx.server)
        .await;

    let product: Product = ctx.storefront.api().get("/products/2").await.unwrap();
    assert_eq!(product.name, "Tailored Wool Blazer");

    let requests = ctx.server.received_requests().await.unwrap();
    assert_eq!(requests.len(), 1);
    assert!(requests[0].headers.get("authorization").is_none());
}

#[tokio::test]
async fn test_every_request_carries_a_fresh_request_id() {
    let ctx = TestContext::new().await;

    Mock::given(method("GET"))
        .and(path("/products/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(blazer_json()))
        .mount(&ctx.server)
        .await;

    let _: Product = ctx.storefront.api().get("/products/2").await.unwrap();
    let _: Product = ctx.storefront.api().get("/products/2").await.unwrap();

    let requests = ctx.server.received_requests().await.unwrap();
    let ids: Vec<String> = requests
        .iter()
        .map(|r| {
            r.headers
                .get("x-request-id")
                .unwrap()
                .to_str()
                .unwrap()
                .to_string()
        })
        .collect();
    assert_eq!(ids.len(), 2);
    assert_ne!(ids[0], ids[1]);
    assert_eq!(ids[0].len(), 36);
}

#[tokio::test]
async fn test_unauthorized_anywhere_revokes_session_and_redirects() {
    let ctx = TestContext::build("/products/2", None).await;
    ctx.storefront.session().login(TOKEN, user()).unwrap();

    Mock::given(method("DELETE"))
        .and(path("/cart/items/7"))
        .respond_with(
            ResponseTemplate::new(401).set_body_json(json!({"detail": "Token has expired"})),
        )
        .expect(1)
        .mount(&ctx.server)
        .await;

    let err = ctx
        .storefront
        .cart()
        .remove_item(CartItemId::new(7))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        AppError::Api(ApiError::Unauthorized(ref detail)) if detail == "Token has expired"
    ));
    assert!(!ctx.credentials.has_credential());
    assert_eq!(
        ctx.storefront.session().session().status(),
        SessionStatus::Unauthenticated
    );
    assert_eq!(
        ctx.navigator.current_location(),
        "/login?from=%2Fproducts%2F2"
    );
}

#[tokio::test]
async fn test_unauthorized_on_sign_in_view_does_not_navigate() {
    let ctx = TestContext::build("/login", None).await;

    Mock::given(method("POST"))
        .and(path("/auth/login"))
        .respond_with(
            ResponseTemplate::new(401)
                .set_body_json(json!({"detail": "Incorrect email or password"})),
        )
        .mount(&ctx.server)
        .await;

    let err = ctx
        .storefront
        .session()
        .sign_in("ada@example.com", &"wrong-password".to_string().into())
        .await
        .unwrap_err();

    assert_eq!(err.notice_message(), "Incorrect email or password");
    assert_eq!(ctx.navigator.navigation_count(), 0);
}

#[tokio::test]
async fn test_unauthorized_is_not_retried() {
    let ctx = TestContext::new().await;
    ctx.storefront.session().login(TOKEN, user()).unwrap();

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&ctx.server)
        .await;

    assert!(ctx.storefront.cart().refresh().await.is_err());
}

#[tokio::test]
async fn test_server_error_is_typed_and_keeps_session() {
    let ctx = TestContext::new().await;
    ctx.storefront.session().login(TOKEN, user()).unwrap();

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(
            ResponseTemplate::new(503).set_body_json(json!({"detail": "Database unavailable"})),
        )
        .mount(&ctx.server)
        .await;

    let err = ctx.storefront.cart().refresh().await.unwrap_err();

    assert!(matches!(
        err,
        AppError::Api(ApiError::Server { status: 503, ref detail }) if detail == "Database unavailable"
    ));
    assert!(ctx.credentials.has_credential());
    assert!(ctx.storefront.session().is_authenticated());
}

#[tokio::test]
async fn test_validation_errors_are_joined() {
    let ctx = TestContext::new().await;

    Mock::given(method("POST"))
        .and(path("/auth/signup"))
        .respond_with(ResponseTemplate::new(422).set_body_json(json!({
            "detail": [
                {"loc": ["body", "email"], "msg": "value is not a valid email address"},
                {"loc": ["body", "password"], "msg": "field required"}
            ]
        })))
        .mount(&ctx.server)
        .await;

    let err = ctx
        .storefront
        .session()
        .sign_up("not-an-email", &"long-enough".to_string().into(), None)
        .await
        .unwrap_err();

    assert_eq!(
        err.notice_message(),
        "value is not a valid email address; field required"
    );
}

#[tokio::test]
async fn test_rate_limit_reports_retry_after() {
    let ctx = TestContext::new().await;

    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(429).insert_header("Retry-After", "30"))
        .mount(&ctx.server)
        .await;

    let err = ctx
        .storefront
        .api()
        .get::<serde_json::Value>("/cart")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::RateLimited(30)));
}

#[tokio::test]
async fn test_cart_cleared_after_revocation() {
    let ctx = TestContext::with_credential("/cart").await;

    Mock::given(method("GET"))
        .and(path("/auth/me"))
        .respond_with(ResponseTemplate::new(200).set_body_json(user_json()))
        .mount(&ctx.server)
        .await;
    Mock::given(method("GET"))
        .and(path("/cart"))
        .respond_with(ResponseTemplate::new(200).set_body_json(empty_cart_json()))
        .mount(&ctx.server)
        .await;
    Mock::given(method("DELETE"))
        .and(path("/cart/items/7"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&ctx.server)
        .await;

    let (_, sync) = ctx.storefront.start().await;
    let mut cart = ctx.storefront.cart().subscribe();
    settle(&mut cart, |state| state.cart.is_some()).await;

    let _ = ctx.storefront.cart().remove_item(CartItemId::new(7)).await;

    settle(&mut cart, |state| state.cart.is_none()).await;
    assert_eq!(ctx.navigator.current_location(), "/login?from=%2Fcart");
    sync.abort();
}
