//! External service port traits (dataset source, image origin).

use async_trait::async_trait;

use super::error::{DatasetFetchError, ImageFetchError};

// =============================================================================
// Dataset Source
// =============================================================================

/// One municipality as delivered by the remote source, before filtering
/// and before its image URL is replaced by an opaque id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceRecord {
    pub name: String,
    /// Origin URL of the coat of arms image
    pub image_url: String,
    /// Blazon text, empty if unknown
    pub description: String,
    /// Encyclopedia article URL, empty if unknown
    pub article_url: String,
}

impl SourceRecord {
    pub fn new(name: impl Into<String>, image_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            image_url: image_url.into(),
            description: String::new(),
            article_url: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_article_url(mut self, url: impl Into<String>) -> Self {
        self.article_url = url.into();
        self
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DatasetSourcePort: Send + Sync {
    /// Fetch the complete reference dataset.
    async fn fetch_dataset(&self) -> Result<Vec<SourceRecord>, DatasetFetchError>;
}

// =============================================================================
// Image Origin
// =============================================================================

/// Raw image as served by the origin.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedImage {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageFetchPort: Send + Sync {
    /// Retrieve `origin_url` in a single bounded attempt.
    async fn fetch_bytes(&self, origin_url: &str) -> Result<FetchedImage, ImageFetchError>;
}
