//! HTTP client for origin emblem images.
//!
//! Implements ImageFetchPort against the third-party media host. The host
//! rejects anonymous clients, so every request carries a descriptive
//! User-Agent and browser-like Accept headers.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONTENT_TYPE};
use reqwest::Client;

use crate::infrastructure::ports::{FetchedImage, ImageFetchError, ImageFetchPort};

/// Content type assumed when the origin does not send one (most emblems are SVG).
pub const DEFAULT_IMAGE_CONTENT_TYPE: &str = "image/svg+xml";

const IMAGE_ACCEPT: &str = "image/webp,image/apng,image/svg+xml,image/*,*/*;q=0.8";
const IMAGE_ACCEPT_LANGUAGE: &str = "de-DE,de;q=0.9,en;q=0.8";

/// Client for origin images. Cheap to clone; the connection pool is shared.
#[derive(Clone)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    pub fn new(user_agent: &str, timeout: Duration) -> Self {
        let client = Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }
}

#[async_trait]
impl ImageFetchPort for HttpImageFetcher {
    async fn fetch_bytes(&self, origin_url: &str) -> Result<FetchedImage, ImageFetchError> {
        let response = self
            .client
            .get(origin_url)
            .header(ACCEPT, IMAGE_ACCEPT)
            .header(ACCEPT_LANGUAGE, IMAGE_ACCEPT_LANGUAGE)
            .send()
            .await
            .map_err(|e| request_error(origin_url, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url = %origin_url, status = status.as_u16(), "Image origin rejected request");
            return Err(ImageFetchError::Status {
                url: origin_url.to_string(),
                status: status.as_u16(),
            });
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .filter(|v| !v.trim().is_empty())
            .unwrap_or(DEFAULT_IMAGE_CONTENT_TYPE)
            .to_string();

        let bytes = response
            .bytes()
            .await
            .map_err(|e| request_error(origin_url, e))?;

        tracing::debug!(
            url = %origin_url,
            status = status.as_u16(),
            content_type = %content_type,
            len = bytes.len(),
            "Fetched origin image"
        );

        Ok(FetchedImage {
            content_type,
            bytes: bytes.to_vec(),
        })
    }
}

fn request_error(url: &str, e: reqwest::Error) -> ImageFetchError {
    if e.is_timeout() {
        ImageFetchError::Timeout {
            url: url.to_string(),
        }
    } else {
        ImageFetchError::RequestFailed {
            url: url.to_string(),
            message: e.to_string(),
        }
    }
}
