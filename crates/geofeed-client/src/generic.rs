//! Generic GeoJSON feeds with no source-specific attributes.

use chrono::{DateTime, Utc};
use geofeed_core::error::FeedError;
use geofeed_core::models::{Coordinate, Feature, FeedEntry};
use geofeed_core::source::{EntryExtractor, TimestampReducer};
use serde::Serialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};

use crate::feed::parse_feed_url;

/// Length of the hex digest used as a last-resort external id.
const DIGEST_ID_LEN: usize = 16;

/// Properties of a generic feature, kept verbatim for the hosting application.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct GenericAttributes {
    pub properties: Map<String, Value>,
}

/// Extractor for an arbitrary GeoJSON document at a caller-supplied URL.
#[derive(Debug, Clone)]
pub struct GenericFeed {
    url: String,
}

impl GenericFeed {
    /// # Errors
    ///
    /// Returns `FeedError::InvalidUrl` for anything but an absolute http(s) URL.
    pub fn new(url: impl Into<String>) -> Result<Self, FeedError> {
        let url = url.into();
        parse_feed_url(&url)?;
        Ok(Self { url })
    }
}

impl EntryExtractor for GenericFeed {
    type Attributes = GenericAttributes;

    fn name(&self) -> &'static str {
        "generic"
    }

    fn url(&self) -> &str {
        &self.url
    }

    fn extract(
        &self,
        home: Coordinate,
        feature: &Feature,
        _feed_attribution: Option<&str>,
    ) -> FeedEntry<GenericAttributes> {
        let title = feature.property_string("title");
        let external_id = resolve_external_id(feature, title.as_deref());
        let attributes = GenericAttributes {
            properties: feature.properties.clone().unwrap_or_default(),
        };
        FeedEntry::new(home, external_id, feature.geometry.clone(), attributes).with_title(title)
    }
}

impl TimestampReducer<GenericAttributes> for GenericFeed {
    fn latest_timestamp(&self, _entries: &[FeedEntry<GenericAttributes>]) -> Option<DateTime<Utc>> {
        None
    }
}

/// Derives a stable id for a feature.
///
/// First non-empty of: the feature `id`, `properties.id`, `properties.guid`,
/// the title, and finally a digest of the representative coordinate. A
/// feature without any usable position is keyed on its serialized geometry.
///
/// # Examples
///
/// ```
/// use geofeed_client::generic::resolve_external_id;
/// use geofeed_core::{Feature, Geometry};
///
/// let feature = Feature {
///     geometry: Some(Geometry::point(150.0, -37.5)),
///     ..Feature::default()
/// };
/// assert_eq!(resolve_external_id(&feature, None), "e934fd5479f820b1");
/// assert_eq!(resolve_external_id(&feature, Some("Grass fire")), "Grass fire");
/// ```
pub fn resolve_external_id(feature: &Feature, title: Option<&str>) -> String {
    if let Some(id) = feature
        .id_string()
        .or_else(|| feature.property_id("id"))
        .or_else(|| feature.property_id("guid"))
    {
        return id;
    }
    if let Some(title) = title.filter(|t| !t.is_empty()) {
        return title.to_string();
    }

    let key = match feature.geometry.as_ref().and_then(|g| g.coordinates()) {
        Some(Coordinate {
            latitude,
            longitude,
        }) => format!("{},{}", latitude, longitude),
        None => serde_json::to_string(&feature.geometry).unwrap_or_default(),
    };
    digest_id(&key)
}

fn digest_id(key: &str) -> String {
    hex::encode(&Sha256::digest(key.as_bytes())[..DIGEST_ID_LEN / 2])
}

#[cfg(test)]
mod tests {
    use super::*;
    use geofeed_core::models::Geometry;
    use serde_json::json;

    fn feature(value: Value) -> Feature {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_new_rejects_invalid_url() {
        assert!(GenericFeed::new("https://example.org/feed.geojson").is_ok());
        assert!(matches!(
            GenericFeed::new("feed.geojson"),
            Err(FeedError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_id_fallback_chain() {
        let point = json!({"type": "Point", "coordinates": [150.0, -37.5]});

        let f = feature(json!({"id": "a", "geometry": point, "properties": {"id": "b", "guid": "c"}}));
        assert_eq!(resolve_external_id(&f, Some("t")), "a");

        let f = feature(json!({"id": 42, "geometry": point, "properties": {}}));
        assert_eq!(resolve_external_id(&f, None), "42");

        let f = feature(json!({"geometry": point, "properties": {"id": "b", "guid": "c"}}));
        assert_eq!(resolve_external_id(&f, Some("t")), "b");

        let f = feature(json!({"geometry": point, "properties": {"id": null, "guid": "c"}}));
        assert_eq!(resolve_external_id(&f, Some("t")), "c");

        let f = feature(json!({"id": "", "geometry": point, "properties": {}}));
        assert_eq!(resolve_external_id(&f, Some("t")), "t");
        assert_eq!(resolve_external_id(&f, Some("")), "e934fd5479f820b1");
    }

    #[test]
    fn test_digest_id_is_stable() {
        let polygon = Geometry::polygon(&[(150.0, -37.0), (151.0, -37.0), (150.0, -37.0)]);
        let f = Feature {
            geometry: Some(polygon),
            ..Feature::default()
        };
        let first = resolve_external_id(&f, None);
        assert_eq!(first.len(), DIGEST_ID_LEN);
        assert_eq!(first, resolve_external_id(&f.clone(), None));
    }

    #[test]
    fn test_digest_id_is_lowercase_hex_prefix() {
        let id = digest_id("-37.5,150");
        assert_eq!(id, "e934fd5479f820b1");
        assert!(id.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
    }

    #[test]
    fn test_unsupported_geometry_still_gets_an_id() {
        let f = feature(json!({
            "geometry": {"type": "LineString", "coordinates": [[150.0, -37.0], [151.0, -37.0]]}
        }));
        assert_eq!(resolve_external_id(&f, None).len(), DIGEST_ID_LEN);
    }

    #[test]
    fn test_extract() {
        let extractor = GenericFeed::new("https://example.org/feed.geojson").unwrap();
        let f = feature(json!({
            "id": "3456",
            "geometry": {"type": "Point", "coordinates": [151.0, -30.0]},
            "properties": {"title": "Title 1", "severity": "minor"}
        }));

        let entry = extractor.extract(Coordinate::new(-31.0, 150.0), &f, None);
        assert_eq!(entry.external_id, "3456");
        assert_eq!(entry.title.as_deref(), Some("Title 1"));
        assert!(entry.attribution.is_none());
        assert_eq!(entry.attributes.properties["severity"], "minor");
        assert!((entry.distance_to_home - 146.8).abs() < 0.1);
        assert!(extractor.latest_timestamp(&[entry]).is_none());
    }
}
