//! Virtual try-on.

use std::path::Path;

use virtual_wardrobe_core::ProductId;
use virtual_wardrobe_storefront::Storefront;
use virtual_wardrobe_storefront::try_on::UserPhoto;

use super::CliError;
use crate::output;

/// Upload a photo and print the generated image URL.
pub async fn generate(
    storefront: &Storefront,
    product_id: ProductId,
    photo: &Path,
) -> Result<(), CliError> {
    let photo = UserPhoto::from_path(photo).await?;
    let result = storefront.try_on().generate(product_id, &photo).await?;
    output::try_on(&result);
    Ok(())
}
