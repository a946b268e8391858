//! Domain and wire types.
//!
//! The wire types mirror the GeoJSON interchange format closely enough to
//! deserialize real feeds with `serde`: positions keep their on-the-wire
//! `[longitude, latitude, ...]` order and are only swapped by the geometry
//! reducer.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FeedError;
use crate::geometry;

/// A (latitude, longitude) pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub const fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Builds a coordinate, rejecting non-finite or out-of-range values.
    ///
    /// # Examples
    ///
    /// ```
    /// use geofeed_core::Coordinate;
    ///
    /// assert!(Coordinate::try_new(-31.0, 151.0).is_ok());
    /// assert!(Coordinate::try_new(91.0, 0.0).is_err());
    /// assert!(Coordinate::try_new(f64::NAN, 0.0).is_err());
    /// ```
    pub fn try_new(latitude: f64, longitude: f64) -> Result<Self, FeedError> {
        let valid = latitude.is_finite()
            && longitude.is_finite()
            && (-90.0..=90.0).contains(&latitude)
            && (-180.0..=180.0).contains(&longitude);
        if !valid {
            return Err(FeedError::InvalidCoordinate {
                latitude,
                longitude,
            });
        }
        Ok(Self::new(latitude, longitude))
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:?}, {:?})", self.latitude, self.longitude)
    }
}

/// A wire position: `[longitude, latitude]`, optionally followed by altitude.
pub type Position = Vec<f64>;

/// GeoJSON geometry, restricted to the shapes the reducer understands.
///
/// Every other geometry type (`LineString`, `MultiPolygon`, ...) decodes as
/// [`Geometry::Unsupported`] instead of failing the whole document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    Point {
        coordinates: Position,
    },
    /// Linear rings; the first one is the outer ring.
    Polygon {
        coordinates: Vec<Vec<Position>>,
    },
    GeometryCollection {
        geometries: Vec<Geometry>,
    },
    #[serde(other)]
    Unsupported,
}

impl Geometry {
    /// Convenience constructor taking the wire order (longitude first).
    pub fn point(longitude: f64, latitude: f64) -> Self {
        Geometry::Point {
            coordinates: vec![longitude, latitude],
        }
    }

    /// Polygon with a single outer ring given as `(longitude, latitude)` pairs.
    pub fn polygon(outer_ring: &[(f64, f64)]) -> Self {
        Geometry::Polygon {
            coordinates: vec![outer_ring
                .iter()
                .map(|(longitude, latitude)| vec![*longitude, *latitude])
                .collect()],
        }
    }

    pub fn collection(geometries: Vec<Geometry>) -> Self {
        Geometry::GeometryCollection { geometries }
    }

    /// See [`geometry::extract_coordinates`].
    pub fn coordinates(&self) -> Option<Coordinate> {
        geometry::extract_coordinates(self)
    }
}

/// One GeoJSON feature as published by a feed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Feature {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(default)]
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub properties: Option<Map<String, Value>>,
}

impl Feature {
    /// Feature-level `id`, rendered as a string. Empty strings count as missing.
    pub fn id_string(&self) -> Option<String> {
        self.id.as_ref().and_then(value_to_id)
    }

    /// Raw property value; `null` counts as missing.
    pub fn property(&self, name: &str) -> Option<&Value> {
        self.properties
            .as_ref()
            .and_then(|props| props.get(name))
            .filter(|value| !value.is_null())
    }

    pub fn property_str(&self, name: &str) -> Option<&str> {
        self.property(name).and_then(Value::as_str)
    }

    pub fn property_string(&self, name: &str) -> Option<String> {
        self.property_str(name).map(str::to_string)
    }

    pub fn property_f64(&self, name: &str) -> Option<f64> {
        self.property(name).and_then(Value::as_f64)
    }

    /// Integer property; floats are truncated.
    pub fn property_i64(&self, name: &str) -> Option<i64> {
        let value = self.property(name)?;
        value
            .as_i64()
            .or_else(|| value.as_f64().map(|f| f as i64))
    }

    /// Property rendered as an identifier (string or number).
    pub fn property_id(&self, name: &str) -> Option<String> {
        self.property(name).and_then(value_to_id)
    }
}

fn value_to_id(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Top-level GeoJSON document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeatureCollection {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub features: Vec<Feature>,
    /// Non-standard feed metadata block (USGS publishes one).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl FeatureCollection {
    /// Decodes a document, requiring `"type": "FeatureCollection"`.
    ///
    /// # Errors
    ///
    /// Returns `FeedError::Decode` for malformed JSON and
    /// `FeedError::UnexpectedDocument` for any other GeoJSON object.
    pub fn from_json(text: &str) -> Result<Self, FeedError> {
        let collection: FeatureCollection = serde_json::from_str(text)?;
        if collection.kind != "FeatureCollection" {
            return Err(FeedError::UnexpectedDocument(collection.kind));
        }
        Ok(collection)
    }

    pub fn metadata_str(&self, name: &str) -> Option<&str> {
        self.metadata
            .as_ref()
            .and_then(|meta| meta.get(name))
            .and_then(Value::as_str)
    }
}

/// One parsed record of a fetched document.
///
/// Entries are built fresh on every fetch and never mutated afterwards; the
/// next fetch supersedes an entry with a new value under the same
/// `external_id`. `A` carries the source-specific attributes.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedEntry<A> {
    pub external_id: String,
    pub geometry: Option<Geometry>,
    pub title: Option<String>,
    pub attribution: Option<String>,
    /// Great-circle distance in km from the home coordinate the entry was
    /// built against; infinite without usable geometry.
    pub distance_to_home: f64,
    pub attributes: A,
}

impl<A> FeedEntry<A> {
    pub fn new(
        home: Coordinate,
        external_id: impl Into<String>,
        geometry: Option<Geometry>,
        attributes: A,
    ) -> Self {
        let distance_to_home = geometry
            .as_ref()
            .map_or(f64::INFINITY, |g| geometry::distance_to(home, g));
        Self {
            external_id: external_id.into(),
            geometry,
            title: None,
            attribution: None,
            distance_to_home,
            attributes,
        }
    }

    pub fn with_title(mut self, title: Option<String>) -> Self {
        self.title = title;
        self
    }

    pub fn with_attribution(mut self, attribution: Option<String>) -> Self {
        self.attribution = attribution;
        self
    }

    /// Representative position for display.
    pub fn coordinates(&self) -> Option<Coordinate> {
        self.geometry.as_ref().and_then(geometry::extract_coordinates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_geometry_deserialization() {
        let json = r#"{
            "type": "GeometryCollection",
            "geometries": [
                {"type": "Point", "coordinates": [151.0, -30.0, 10.0]},
                {"type": "Polygon", "coordinates": [[[151.0, -30.0], [151.5, -30.0], [151.0, -30.0]]]},
                {"type": "LineString", "coordinates": [[151.0, -30.0], [151.5, -30.0]]}
            ]
        }"#;

        let geometry: Geometry = serde_json::from_str(json).unwrap();
        let Geometry::GeometryCollection { geometries } = geometry else {
            panic!("Expected a geometry collection");
        };
        assert_eq!(geometries.len(), 3);
        assert_eq!(
            geometries[0],
            Geometry::Point {
                coordinates: vec![151.0, -30.0, 10.0]
            }
        );
        assert!(matches!(geometries[1], Geometry::Polygon { .. }));
        assert_eq!(geometries[2], Geometry::Unsupported);
    }

    #[test]
    fn test_feature_collection_from_json() {
        let json = r#"{
            "type": "FeatureCollection",
            "metadata": {"title": "Feed Title"},
            "features": [
                {"type": "Feature", "id": 42, "geometry": null, "properties": {"title": "T", "mag": null}}
            ]
        }"#;

        let collection = FeatureCollection::from_json(json).unwrap();
        assert_eq!(collection.metadata_str("title"), Some("Feed Title"));
        let feature = &collection.features[0];
        assert_eq!(feature.id_string(), Some("42".to_string()));
        assert!(feature.geometry.is_none());
        assert_eq!(feature.property_str("title"), Some("T"));
        assert!(feature.property("mag").is_none());
    }

    #[test]
    fn test_feature_collection_rejects_other_documents() {
        let json = r#"{"type": "Feature", "geometry": null, "properties": {}}"#;
        let result = FeatureCollection::from_json(json);
        assert!(matches!(result, Err(FeedError::UnexpectedDocument(kind)) if kind == "Feature"));
    }

    #[test]
    fn test_feature_collection_rejects_malformed_json() {
        let result = FeatureCollection::from_json("{ not json");
        assert!(matches!(result, Err(FeedError::Decode(_))));
    }

    #[test]
    fn test_empty_string_id_counts_as_missing() {
        let feature: Feature =
            serde_json::from_str(r#"{"id": "", "properties": {"guid": "", "id": 7}}"#).unwrap();
        assert_eq!(feature.id_string(), None);
        assert_eq!(feature.property_id("guid"), None);
        assert_eq!(feature.property_id("id"), Some("7".to_string()));
    }

    #[test]
    fn test_property_i64_accepts_floats() {
        let feature: Feature =
            serde_json::from_str(r#"{"properties": {"time": 1537603200000.0}}"#).unwrap();
        assert_eq!(feature.property_i64("time"), Some(1_537_603_200_000));
    }

    #[test]
    fn test_entry_without_geometry_is_infinitely_far() {
        let entry = FeedEntry::new(Coordinate::new(-31.0, 151.0), "a", None, ());
        assert!(entry.distance_to_home.is_infinite());
        assert!(entry.coordinates().is_none());
    }

    #[test]
    fn test_coordinate_display() {
        assert_eq!(Coordinate::new(-31.0, 151.0).to_string(), "(-31.0, 151.0)");
    }
}
