use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DomainError;

/// Path prefix under which proxied emblem images are served.
pub const IMAGE_ROUTE_PREFIX: &str = "/image/";

/// Opaque identifier standing in for an emblem's origin URL.
///
/// Minted fresh for every entity on each cold fetch, so an id is only
/// meaningful within the snapshot that issued it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ImageId(Uuid);

impl ImageId {
    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid)
    }

    /// The client-facing reference, e.g. `/image/6f1c...`.
    pub fn proxy_path(&self) -> String {
        format!("{IMAGE_ROUTE_PREFIX}{}", self.0)
    }

    /// Inverse of [`ImageId::proxy_path`].
    pub fn from_proxy_path(path: &str) -> Option<Self> {
        path.strip_prefix(IMAGE_ROUTE_PREFIX)
            .and_then(|raw| raw.parse().ok())
    }
}

impl fmt::Display for ImageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ImageId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s.trim())
            .map(Self)
            .map_err(|e| DomainError::invalid_id(format!("image id '{s}': {e}")))
    }
}

impl From<Uuid> for ImageId {
    fn from(value: Uuid) -> Self {
        Self(value)
    }
}

/// Opaque per-player key supplied by the session layer.
///
/// Restricted to `[A-Za-z0-9_-]` so it can double as a storage key
/// (file name, map key) without escaping.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PlayerKey(String);

impl PlayerKey {
    pub const MAX_LEN: usize = 128;

    pub fn new(raw: impl Into<String>) -> Result<Self, DomainError> {
        let raw = raw.into();
        if raw.is_empty() || raw.len() > Self::MAX_LEN {
            return Err(DomainError::invalid_id(format!(
                "player key must be 1..={} characters",
                Self::MAX_LEN
            )));
        }
        if !raw
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        {
            return Err(DomainError::invalid_id(
                "player key may only contain ASCII letters, digits, '-' and '_'",
            ));
        }
        Ok(Self(raw))
    }

    pub fn from_uuid(uuid: Uuid) -> Self {
        Self(uuid.to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for PlayerKey {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<PlayerKey> for String {
    fn from(value: PlayerKey) -> Self {
        value.0
    }
}
