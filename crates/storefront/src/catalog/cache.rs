//! Cache types for catalog responses.

use virtual_wardrobe_core::{Product, ProductId};

use super::ProductQuery;

/// Cache key for products and product listings.
#[derive(Debug, Clone, Hash, PartialEq, Eq)]
pub enum CacheKey {
    Product(ProductId),
    Products(ProductQuery),
}

/// Cached value types.
#[derive(Debug, Clone)]
pub enum CacheValue {
    Product(Box<Product>),
    Products(Vec<Product>),
}
