//! Catalog browsing.

use virtual_wardrobe_core::ProductId;
use virtual_wardrobe_storefront::Storefront;
use virtual_wardrobe_storefront::catalog::ProductQuery;

use super::CliError;
use crate::output;

/// List a page of products.
pub async fn list(
    storefront: &Storefront,
    category: Option<String>,
    limit: u32,
    offset: u32,
) -> Result<(), CliError> {
    let mut query = ProductQuery::default().page(limit, offset);
    if let Some(category) = category {
        query = query.category(category);
    }

    let products = storefront.catalog().products(&query).await?;
    output::products(&products);
    Ok(())
}

/// Show one product.
pub async fn show(storefront: &Storefront, id: ProductId) -> Result<(), CliError> {
    let product = storefront.catalog().product(id).await?;
    output::product(&product);
    Ok(())
}
