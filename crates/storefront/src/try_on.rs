//! Virtual try-on.
//!
//! Uploads the user's photo together with a product ID and returns the URL
//! of the generated image.

use std::path::Path;

use reqwest::multipart::{Form, Part};
use tracing::instrument;

use virtual_wardrobe_core::{ProductId, TryOnResult};

use crate::api::{ApiClient, ApiError};
use crate::error::{AppError, Result};
use crate::notices::Notices;

const TRY_ON_PATH: &str = "/try-on/";

/// A photo of the user to dress.
#[derive(Clone, PartialEq, Eq)]
pub struct UserPhoto {
    pub file_name: String,
    pub mime: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for UserPhoto {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserPhoto")
            .field("file_name", &self.file_name)
            .field("mime", &self.mime)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl UserPhoto {
    /// Wrap photo bytes, inferring the content type from the file name.
    #[must_use]
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime = mime_for(&file_name);
        Self {
            file_name,
            mime,
            bytes,
        }
    }

    /// Read a photo from disk.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read.
    pub async fn from_path(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map_or_else(|| "photo".to_string(), |n| n.to_string_lossy().into_owned());
        Ok(Self::new(file_name, bytes))
    }

    /// Whether there is no image data.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

fn mime_for(file_name: &str) -> String {
    mime_guess::from_path(file_name)
        .first_or_octet_stream()
        .essence_str()
        .to_string()
}

/// Client for the try-on endpoint.
#[derive(Clone)]
pub struct TryOnClient {
    api: ApiClient,
    notices: Notices,
}

impl TryOnClient {
    #[must_use]
    pub const fn new(api: ApiClient, notices: Notices) -> Self {
        Self { api, notices }
    }

    /// Generate a try-on image of `product_id` on the user in `photo`.
    ///
    /// An empty photo is rejected without a request.
    ///
    /// # Errors
    ///
    /// Returns [`AppError::InvalidInput`] for an empty photo, otherwise any
    /// API error.
    #[instrument(skip(self, product_id, photo), fields(product_id = %product_id, photo = ?photo))]
    pub async fn generate(&self, product_id: ProductId, photo: &UserPhoto) -> Result<TryOnResult> {
        if photo.is_empty() {
            self.notices.error("Please upload your photo first");
            return Err(AppError::InvalidInput(
                "Please upload your photo first".to_string(),
            ));
        }

        match self.upload(product_id, photo).await {
            Ok(result) => {
                tracing::info!(result_image = %result.result_image, "Try-on generated");
                self.notices.success("Virtual try-on complete!");
                Ok(result)
            }
            Err(e) => {
                let err = AppError::from(e);
                err.report("try_on.generate");
                self.notices.error("Failed to generate try-on result");
                Err(err)
            }
        }
    }

    async fn upload(
        &self,
        product_id: ProductId,
        photo: &UserPhoto,
    ) -> std::result::Result<TryOnResult, ApiError> {
        let image = Part::bytes(photo.bytes.clone())
            .file_name(photo.file_name.clone())
            .mime_str(&photo.mime)?;

        let form = Form::new()
            .part("userImage", image)
            .text("productId", product_id.to_string());

        self.api.post_multipart(TRY_ON_PATH, form).await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Arc;

    use url::Url;

    use crate::config::ApiConfig;
    use crate::credentials::MemoryCredentialStore;

    use super::*;

    #[test]
    fn test_mime_from_extension() {
        assert_eq!(UserPhoto::new("me.JPG", vec![1]).mime, "image/jpeg");
        assert_eq!(UserPhoto::new("me.png", vec![1]).mime, "image/png");
        assert_eq!(UserPhoto::new("me", vec![1]).mime, "application/octet-stream");
    }

    #[test]
    fn test_debug_omits_bytes() {
        let photo = UserPhoto::new("me.png", vec![0; 4096]);
        let debug = format!("{photo:?}");
        assert!(debug.contains("len: 4096"));
        assert!(!debug.contains("0, 0"));
    }

    #[tokio::test]
    async fn test_from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("selfie.webp");
        std::fs::write(&path, b"RIFF").unwrap();

        let photo = UserPhoto::from_path(&path).await.unwrap();
        assert_eq!(photo.file_name, "selfie.webp");
        assert_eq!(photo.mime, "image/webp");
        assert_eq!(photo.bytes, b"RIFF");
    }

    #[tokio::test]
    async fn test_empty_photo_rejected_locally() {
        let config = ApiConfig {
            base_url: Url::parse("http://127.0.0.1:9").unwrap(),
            request_timeout: None,
        };
        let api = ApiClient::new(&config, Arc::new(MemoryCredentialStore::new()));
        let notices = Notices::new();
        let mut rx = notices.subscribe();
        let client = TryOnClient::new(api, notices);

        let result = client
            .generate(ProductId::new(2), &UserPhoto::new("me.jpg", Vec::new()))
            .await;

        assert!(matches!(result, Err(AppError::InvalidInput(_))));
        assert_eq!(rx.try_recv().unwrap().message, "Please upload your photo first");
    }
}
