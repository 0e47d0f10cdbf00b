//! Cart commands.
//!
//! The cart route is protected: signed-out users are sent to sign in first.

use virtual_wardrobe_core::{CartItemId, ProductId};
use virtual_wardrobe_storefront::Storefront;
use virtual_wardrobe_storefront::navigation::RouteAccess;

use super::CliError;
use crate::output;

fn require_session(storefront: &Storefront) -> Result<(), CliError> {
    match storefront.session().route_access("/cart") {
        RouteAccess::Granted => Ok(()),
        RouteAccess::Pending | RouteAccess::Redirect(_) => Err(CliError::NotSignedIn),
    }
}

/// Fetch and print the cart.
pub async fn show(storefront: &Storefront) -> Result<(), CliError> {
    require_session(storefront)?;
    let cart = storefront.cart().refresh().await?;
    output::cart(&cart);
    Ok(())
}

/// Add a product variant.
pub async fn add(
    storefront: &Storefront,
    product_id: ProductId,
    size: &str,
    color: &str,
    quantity: u32,
) -> Result<(), CliError> {
    let cart = storefront
        .cart()
        .add_item(product_id, size, color, quantity)
        .await?;
    output::cart(&cart);
    Ok(())
}

/// Remove a cart line.
pub async fn remove(storefront: &Storefront, item_id: CartItemId) -> Result<(), CliError> {
    let cart = storefront.cart().remove_item(item_id).await?;
    output::cart(&cart);
    Ok(())
}
