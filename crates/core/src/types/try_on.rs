//! Virtual try-on result.

use serde::{Deserialize, Serialize};

/// The image produced by the try-on service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TryOnResult {
    /// URL of the generated image.
    pub result_image: String,
}
