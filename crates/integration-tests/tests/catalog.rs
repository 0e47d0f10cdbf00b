//! Catalog browsing against the mock API.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, ResponseTemplate};

use virtual_wardrobe_core::{Money, ProductId};
use virtual_wardrobe_storefront::catalog::ProductQuery;
use virtual_wardrobe_storefront::error::AppError;
use virtual_wardrobe_integration_tests::{TestContext, blazer_json, scarf_json};

#[tokio::test]
async fn test_list_products_filters_by_category() {
    let ctx = TestContext::new().await;

    Mock::given(method("GET"))
        .and(path("/products/"))
        .and(query_param("category", "Outerwear"))
        .and(query_param("limit", "20"))
        .and(query_param("offset", "0"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([blazer_json()])))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let products = ctx
        .storefront
        .catalog()
        .products(&ProductQuery::default().category("Outerwear"))
        .await
        .unwrap();

    assert_eq!(products.len(), 1);
    assert_eq!(products[0].price, Money::from_cents(27_500));
    assert!(products[0].has_size("M"));
}

#[tokio::test]
async fn test_all_category_sends_no_filter() {
    let ctx = TestContext::new().await;

    Mock::given(method("GET"))
        .and(path("/products/"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!([blazer_json(), scarf_json()])),
        )
        .mount(&ctx.server)
        .await;

    let products = ctx
        .storefront
        .catalog()
        .products(&ProductQuery::default().category("All").page(10, 20))
        .await
        .unwrap();
    assert_eq!(products.len(), 2);

    let requests = ctx.server.received_requests().await.unwrap();
    let query: Vec<(String, String)> = requests[0]
        .url
        .query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect();
    assert_eq!(
        query,
        vec![
            ("limit".to_string(), "10".to_string()),
            ("offset".to_string(), "20".to_string()),
        ]
    );
}

#[tokio::test]
async fn test_product_is_cached() {
    let ctx = TestContext::new().await;

    Mock::given(method("GET"))
        .and(path("/products/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(blazer_json()))
        .expect(1)
        .mount(&ctx.server)
        .await;

    let catalog = ctx.storefront.catalog();
    let first = catalog.product(ProductId::new(2)).await.unwrap();
    let second = catalog.product(ProductId::new(2)).await.unwrap();

    assert_eq!(first, second);
    assert_eq!(first.colors, vec!["Camel", "Black"]);
}

#[tokio::test]
async fn test_invalidated_product_is_fetched_again() {
    let ctx = TestContext::new().await;

    Mock::given(method("GET"))
        .and(path("/products/2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(blazer_json()))
        .expect(2)
        .mount(&ctx.server)
        .await;

    let catalog = ctx.storefront.catalog();
    catalog.product(ProductId::new(2)).await.unwrap();
    catalog.invalidate_product(ProductId::new(2)).await;
    catalog.product(ProductId::new(2)).await.unwrap();
}

#[tokio::test]
async fn test_missing_product_is_not_found() {
    let ctx = TestContext::new().await;

    Mock::given(method("GET"))
        .and(path("/products/99"))
        .respond_with(
            ResponseTemplate::new(404).set_body_json(json!({"detail": "Product not found"})),
        )
        .mount(&ctx.server)
        .await;

    let err = ctx
        .storefront
        .catalog()
        .product(ProductId::new(99))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::NotFound(_)));
    assert_eq!(err.notice_message(), "Product 99 not found");
}
