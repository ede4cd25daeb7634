//! Image fetch port definition.

use async_trait::async_trait;
use image::RgbaImage;

use crate::domain::errors::FetchError;

/// Port for retrieving and decoding remote images.
#[async_trait]
pub trait ImageFetchPort: Send + Sync {
    /// Fetches the image at `url` and decodes it to RGBA.
    async fn fetch(&self, url: &str) -> Result<RgbaImage, FetchError>;
}
