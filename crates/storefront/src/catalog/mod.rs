//! Product catalog client.
//!
//! Browsing needs no sign-in. Responses are cached with `moka` for the
//! configured time to live (5 minutes by default).

mod cache;

use std::sync::Arc;

use moka::future::Cache;
use tracing::{debug, instrument};

use virtual_wardrobe_core::{Product, ProductId};

use crate::api::{ApiClient, RequestOptions};
use crate::config::CatalogCacheConfig;
use crate::error::{AppError, Result};

use cache::{CacheKey, CacheValue};

const PRODUCTS_PATH: &str = "/products/";

/// Category name meaning "every category".
pub const ALL_CATEGORIES: &str = "All";

/// Default page size of a product listing.
pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// A page of the product listing.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub struct ProductQuery {
    /// Only products in this category. `None` or `"All"` lists everything.
    pub category: Option<String>,
    pub limit: u32,
    pub offset: u32,
}

impl Default for ProductQuery {
    fn default() -> Self {
        Self {
            category: None,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl ProductQuery {
    /// Restrict the listing to a category.
    #[must_use]
    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the page window.
    #[must_use]
    pub fn page(mut self, limit: u32, offset: u32) -> Self {
        self.limit = limit;
        self.offset = offset;
        self
    }

    /// The category filter to send, if any.
    fn category_filter(&self) -> Option<&str> {
        self.category
            .as_deref()
            .map(str::trim)
            .filter(|c| !c.is_empty() && *c != ALL_CATEGORIES)
    }

    /// Same query with "every category" spellings folded together.
    fn normalized(&self) -> Self {
        Self {
            category: self.category_filter().map(String::from),
            ..self.clone()
        }
    }

    fn options(&self) -> RequestOptions {
        let mut options = RequestOptions::default();
        if let Some(category) = self.category_filter() {
            options = options.query("category", category);
        }
        options.query("limit", self.limit).query("offset", self.offset)
    }
}

/// Client for the product catalog.
///
/// Cheap to clone; clones share one cache.
#[derive(Clone)]
pub struct CatalogClient {
    inner: Arc<CatalogClientInner>,
}

struct CatalogClientInner {
    api: ApiClient,
    cache: Cache<CacheKey, CacheValue>,
}

impl CatalogClient {
    /// Create a catalog client.
    #[must_use]
    pub fn new(api: ApiClient, config: CatalogCacheConfig) -> Self {
        let cache = Cache::builder()
            .max_capacity(config.max_capacity)
            .time_to_live(config.time_to_live)
            .build();

        Self {
            inner: Arc::new(CatalogClientInner { api, cache }),
        }
    }

    /// List products.
    ///
    /// # Errors
    ///
    /// Returns an error if the API request fails.
    #[instrument(skip(self))]
    pub async fn products(&self, query: &ProductQuery) -> Result<Vec<Product>> {
        let query = query.normalized();
        let cache_key = CacheKey::Products(query.clone());

        if let Some(CacheValue::Products(products)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for products");
            return Ok(products);
        }

        let products: Vec<Product> = self
            .inner
            .api
            .get_with(PRODUCTS_PATH, query.options())
            .await?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Products(products.clone()))
            .await;

        Ok(products)
    }

    /// Get a product by its ID.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::NotFound`] if the product does not exist, or any
    /// other API error.
    #[instrument(skip(self, id), fields(product_id = %id))]
    pub async fn product(&self, id: ProductId) -> Result<Product> {
        let cache_key = CacheKey::Product(id);

        if let Some(CacheValue::Product(product)) = self.inner.cache.get(&cache_key).await {
            debug!("Cache hit for product");
            return Ok(*product);
        }

        let product: Product = self
            .inner
            .api
            .get(&format!("/products/{id}"))
            .await
            .map_err(|e| {
                if e.is_not_found() {
                    AppError::NotFound(format!("Product {id}"))
                } else {
                    AppError::from(e)
                }
            })?;

        self.inner
            .cache
            .insert(cache_key, CacheValue::Product(Box::new(product.clone())))
            .await;

        Ok(product)
    }

    /// Invalidate a cached product.
    pub async fn invalidate_product(&self, id: ProductId) {
        self.inner.cache.invalidate(&CacheKey::Product(id)).await;
    }

    /// Invalidate all cached data.
    pub async fn invalidate_all(&self) {
        self.inner.cache.invalidate_all();
        self.inner.cache.run_pending_tasks().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_category_sends_no_filter() {
        let query = ProductQuery::default().category("All");
        assert_eq!(query.category_filter(), None);
        assert_eq!(
            query.options().query,
            vec![
                ("limit".to_string(), "20".to_string()),
                ("offset".to_string(), "0".to_string()),
            ]
        );
    }

    #[test]
    fn test_category_filter_and_page() {
        let query = ProductQuery::default().category("Outerwear").page(5, 10);
        assert_eq!(
            query.options().query,
            vec![
                ("category".to_string(), "Outerwear".to_string()),
                ("limit".to_string(), "5".to_string()),
                ("offset".to_string(), "10".to_string()),
            ]
        );
    }

    #[test]
    fn test_every_category_spelling_shares_a_cache_key() {
        let all = ProductQuery::default().category("All").normalized();
        let blank = ProductQuery::default().category(" ").normalized();
        assert_eq!(all, ProductQuery::default());
        assert_eq!(blank, ProductQuery::default());
    }
}
