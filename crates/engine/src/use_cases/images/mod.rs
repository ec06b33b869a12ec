//! Image proxy use cases.
//!
//! Clients only ever see `/image/{id}` references. The resolver maps an id
//! back to its origin URL through the installed dataset snapshot and fetches
//! the bytes from the origin.

use std::sync::Arc;

use wappenquiz_domain::{ImageId, ImageRegistry};

use crate::infrastructure::ports::{FetchedImage, ImageFetchError, ImageFetchPort, RandomPort};
use crate::use_cases::dataset::DatasetCache;

/// Mint a random id for `origin_url` and record it in `registry`.
pub fn register_image(
    random: &dyn RandomPort,
    registry: &mut ImageRegistry,
    origin_url: impl Into<String>,
) -> ImageId {
    registry.register(ImageId::from_uuid(random.gen_uuid()), origin_url)
}

#[derive(Debug, thiserror::Error)]
pub enum ImageError {
    #[error("Unknown image id")]
    UnknownImageId,
    #[error(transparent)]
    Fetch(#[from] ImageFetchError),
}

pub struct ImageResolver {
    dataset: Arc<DatasetCache>,
    fetcher: Arc<dyn ImageFetchPort>,
}

impl ImageResolver {
    pub fn new(dataset: Arc<DatasetCache>, fetcher: Arc<dyn ImageFetchPort>) -> Self {
        Self { dataset, fetcher }
    }

    /// Origin URL for `id` in the installed snapshot. Never triggers a refresh.
    pub async fn resolve(&self, id: &ImageId) -> Result<String, ImageError> {
        let snapshot = self.dataset.current().await.ok_or(ImageError::UnknownImageId)?;
        snapshot
            .image_mappings()
            .resolve(id)
            .map(str::to_string)
            .ok_or(ImageError::UnknownImageId)
    }

    pub async fn fetch_bytes(&self, origin_url: &str) -> Result<FetchedImage, ImageError> {
        Ok(self.fetcher.fetch_bytes(origin_url).await?)
    }

    /// Resolve `id` and fetch its bytes from the origin.
    pub async fn proxy(&self, id: &ImageId) -> Result<FetchedImage, ImageError> {
        let origin_url = self.resolve(id).await.inspect_err(|_| {
            tracing::debug!(image_id = %id, "Unknown image id requested");
        })?;

        match self.fetch_bytes(&origin_url).await {
            Ok(image) => {
                tracing::debug!(
                    image_id = %id,
                    origin = %origin_url,
                    content_type = %image.content_type,
                    len = image.bytes.len(),
                    "Proxied image"
                );
                Ok(image)
            }
            Err(e) => {
                tracing::warn!(image_id = %id, origin = %origin_url, error = %e, "Image proxy failed");
                Err(e)
            }
        }
    }
}
