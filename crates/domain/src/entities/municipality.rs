//! Municipality entity - one quiz subject with its coat of arms.

use serde::{Deserialize, Serialize};

/// A place whose coat of arms can be asked about.
///
/// `emblem_ref` is the proxied image reference (`/image/{id}`), never the
/// origin URL. The serialized field names are what clients and the dataset
/// cache file use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    name: String,
    #[serde(rename = "coat_of_arms")]
    emblem_ref: String,
    #[serde(rename = "coat_of_arms_desc", default)]
    description: String,
    #[serde(rename = "wiki_url", default)]
    source_article_url: String,
}

impl Municipality {
    pub fn new(name: impl Into<String>, emblem_ref: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            emblem_ref: emblem_ref.into(),
            description: String::new(),
            source_article_url: String::new(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn with_source_article_url(mut self, url: impl Into<String>) -> Self {
        self.source_article_url = url.into();
        self
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn emblem_ref(&self) -> &str {
        &self.emblem_ref
    }

    /// Blazon text, empty when the source has none.
    #[inline]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Encyclopedia article link, empty when the source has none.
    #[inline]
    pub fn source_article_url(&self) -> &str {
        &self.source_article_url
    }
}
