//! Catalog product types.

use serde::{Deserialize, Serialize};

use super::id::ProductId;
use super::money::Money;

/// A catalog product with its color and size variants.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub price: Money,
    /// Image URL.
    pub image: String,
    pub category: String,
    #[serde(default)]
    pub description: String,
    /// Available colors, e.g. `"Camel"`.
    #[serde(default)]
    pub colors: Vec<String>,
    /// Available sizes, e.g. `"M"`.
    #[serde(default)]
    pub sizes: Vec<String>,
    /// Bullet-point product details.
    #[serde(default)]
    pub details: Vec<String>,
}

impl Product {
    /// Whether the product is offered in the given color.
    #[must_use]
    pub fn has_color(&self, color: &str) -> bool {
        self.colors.iter().any(|c| c.eq_ignore_ascii_case(color))
    }

    /// Whether the product is offered in the given size.
    #[must_use]
    pub fn has_size(&self, size: &str) -> bool {
        self.sizes.iter().any(|s| s.eq_ignore_ascii_case(size))
    }

    /// The summary embedded in cart lines.
    #[must_use]
    pub fn summary(&self) -> ProductSummary {
        ProductSummary {
            id: self.id,
            name: self.name.clone(),
            brand: self.brand.clone(),
            price: self.price,
            image: self.image.clone(),
        }
    }
}

/// The product fields a cart line needs for display.
///
/// Cart snapshots embed the full product; extra fields are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSummary {
    pub id: ProductId,
    pub name: String,
    pub brand: String,
    pub price: Money,
    pub image: String,
}
