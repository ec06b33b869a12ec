//! Dataset snapshot aggregate.
//!
//! A snapshot is one fetched, time-stamped copy of the full municipality list
//! together with the image mappings minted during that fetch. Snapshots are
//! replaced wholesale on refresh and never mutated after construction.

use std::collections::{BTreeMap, HashSet};

use chrono::{DateTime, Duration, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

use crate::entities::Municipality;
use crate::ids::ImageId;

/// Snapshots younger than this are reused instead of refetched.
pub const DEFAULT_FRESHNESS_WINDOW_HOURS: i64 = 24;

/// Opaque image id -> origin URL.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ImageRegistry {
    mappings: BTreeMap<ImageId, String>,
}

impl ImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `origin_url` under `id` and hand the id back.
    pub fn register(&mut self, id: ImageId, origin_url: impl Into<String>) -> ImageId {
        self.mappings.insert(id, origin_url.into());
        id
    }

    pub fn resolve(&self, id: &ImageId) -> Option<&str> {
        self.mappings.get(id).map(String::as_str)
    }

    pub fn contains(&self, id: &ImageId) -> bool {
        self.mappings.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.mappings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mappings.is_empty()
    }
}

/// The complete reference dataset as of `fetched_at`.
///
/// # Invariants
///
/// - municipality names are unique (enforced by the cache during a cold fetch)
/// - every `emblem_ref` resolves through `image_mappings` (see [`DatasetSnapshot::is_consistent`])
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetSnapshot {
    #[serde(alias = "municipalities")]
    entities: Vec<Municipality>,
    image_mappings: ImageRegistry,
    #[serde(alias = "timestamp", deserialize_with = "deserialize_fetched_at")]
    fetched_at: DateTime<Utc>,
}

/// RFC 3339, or a timestamp without offset (older cache files), read as UTC.
fn deserialize_fetched_at<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = String::deserialize(deserializer)?;
    if let Ok(parsed) = DateTime::parse_from_rfc3339(&raw) {
        return Ok(parsed.with_timezone(&Utc));
    }
    NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
        .map(|naive| naive.and_utc())
        .map_err(|e| serde::de::Error::custom(format!("invalid timestamp {raw:?}: {e}")))
}

impl DatasetSnapshot {
    pub fn new(
        entities: Vec<Municipality>,
        image_mappings: ImageRegistry,
        fetched_at: DateTime<Utc>,
    ) -> Self {
        Self {
            entities,
            image_mappings,
            fetched_at,
        }
    }

    #[inline]
    pub fn entities(&self) -> &[Municipality] {
        &self.entities
    }

    #[inline]
    pub fn image_mappings(&self) -> &ImageRegistry {
        &self.image_mappings
    }

    #[inline]
    pub fn fetched_at(&self) -> DateTime<Utc> {
        self.fetched_at
    }

    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.fetched_at
    }

    /// True while the snapshot is younger than `window`.
    ///
    /// A `fetched_at` in the future (clock moved backwards) counts as fresh.
    pub fn is_fresh(&self, now: DateTime<Utc>, window: Duration) -> bool {
        self.age(now) < window
    }

    /// Checks the structural invariants a persisted copy may have lost:
    /// unique names and resolvable emblem references.
    pub fn is_consistent(&self) -> bool {
        let mut seen = HashSet::with_capacity(self.entities.len());
        self.entities.iter().all(|m| {
            seen.insert(m.name())
                && ImageId::from_proxy_path(m.emblem_ref())
                    .is_some_and(|id| self.image_mappings.contains(&id))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use uuid::Uuid;

    fn snapshot_at(fetched_at: DateTime<Utc>) -> DatasetSnapshot {
        let mut registry = ImageRegistry::new();
        let id = registry.register(
            ImageId::from_uuid(Uuid::from_u128(1)),
            "https://commons.example/Aach.svg",
        );
        DatasetSnapshot::new(
            vec![Municipality::new("Aach", id.proxy_path())],
            registry,
            fetched_at,
        )
    }

    #[test]
    fn freshness_window_is_exclusive() {
        let fetched = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap();
        let snapshot = snapshot_at(fetched);
        let window = Duration::hours(DEFAULT_FRESHNESS_WINDOW_HOURS);

        assert!(snapshot.is_fresh(fetched, window));
        assert!(snapshot.is_fresh(fetched + Duration::hours(23), window));
        assert!(!snapshot.is_fresh(fetched + Duration::hours(24), window));
    }

    #[test]
    fn registry_resolves_registered_ids_only() {
        let snapshot = snapshot_at(Utc::now());
        let known = ImageId::from_uuid(Uuid::from_u128(1));
        let unknown = ImageId::from_uuid(Uuid::from_u128(2));

        assert_eq!(
            snapshot.image_mappings().resolve(&known),
            Some("https://commons.example/Aach.svg")
        );
        assert_eq!(snapshot.image_mappings().resolve(&unknown), None);
    }

    #[test]
    fn dangling_emblem_ref_is_inconsistent() {
        let snapshot = DatasetSnapshot::new(
            vec![Municipality::new("Aach", "/image/00000000-0000-0000-0000-000000000009")],
            ImageRegistry::new(),
            Utc::now(),
        );
        assert!(!snapshot.is_consistent());
        assert!(snapshot_at(Utc::now()).is_consistent());
    }

    #[test]
    fn duplicate_names_are_inconsistent() {
        let mut registry = ImageRegistry::new();
        let a = registry.register(ImageId::from_uuid(Uuid::from_u128(1)), "a");
        let b = registry.register(ImageId::from_uuid(Uuid::from_u128(2)), "b");
        let snapshot = DatasetSnapshot::new(
            vec![
                Municipality::new("Aach", a.proxy_path()),
                Municipality::new("Aach", b.proxy_path()),
            ],
            registry,
            Utc::now(),
        );
        assert!(!snapshot.is_consistent());
    }

    #[test]
    fn persisted_layout_accepts_legacy_keys() {
        let json = r#"{
            "municipalities": [{"name": "Aach", "coat_of_arms": "/image/00000000-0000-0000-0000-000000000001"}],
            "image_mappings": {"00000000-0000-0000-0000-000000000001": "https://commons.example/Aach.svg"},
            "timestamp": "2024-05-01T12:00:00Z"
        }"#;
        let snapshot: DatasetSnapshot = serde_json::from_str(json).unwrap();
        assert_eq!(snapshot.len(), 1);
        assert!(snapshot.is_consistent());

        let written = serde_json::to_value(&snapshot).unwrap();
        assert!(written.get("entities").is_some());
        assert!(written.get("fetched_at").is_some());
    }

    #[test]
    fn legacy_timestamp_without_offset_is_read_as_utc() {
        let json = r#"{
            "municipalities": [{"name": "Aach", "coat_of_arms": "/image/00000000-0000-0000-0000-000000000001"}],
            "image_mappings": {"00000000-0000-0000-0000-000000000001": "https://commons.example/Aach.svg"},
            "timestamp": "2024-05-01T12:00:00.123456"
        }"#;
        let snapshot: DatasetSnapshot = serde_json::from_str(json).unwrap();
        let expected = Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
            + Duration::microseconds(123_456);
        assert_eq!(snapshot.fetched_at(), expected);

        let whole_seconds = json.replace("12:00:00.123456", "12:00:00");
        let snapshot: DatasetSnapshot = serde_json::from_str(&whole_seconds).unwrap();
        assert_eq!(
            snapshot.fetched_at(),
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap()
        );
    }

    #[test]
    fn written_timestamp_reads_back_unchanged() {
        let fetched =
            Utc.with_ymd_and_hms(2024, 5, 1, 12, 0, 0).unwrap() + Duration::milliseconds(250);
        let snapshot = snapshot_at(fetched);
        let json = serde_json::to_string(&snapshot).unwrap();
        let read: DatasetSnapshot = serde_json::from_str(&json).unwrap();
        assert_eq!(read.fetched_at(), fetched);
    }

    #[test]
    fn garbage_timestamp_is_rejected() {
        let json = r#"{"entities": [], "image_mappings": {}, "fetched_at": "yesterday"}"#;
        assert!(serde_json::from_str::<DatasetSnapshot>(json).is_err());
    }

    #[test]
    fn partially_structured_record_is_rejected() {
        let json = r#"{"entities": [], "fetched_at": "2024-05-01T12:00:00Z"}"#;
        assert!(serde_json::from_str::<DatasetSnapshot>(json).is_err());
    }
}
