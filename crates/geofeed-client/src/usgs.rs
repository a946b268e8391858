//! U.S. Geological Survey earthquake summary feeds.
//!
//! USGS publishes twenty summary documents, one per combination of time
//! window (hour, day, week, month) and magnitude class. Feeds are selected by
//! name, e.g. `past_day_m25_earthquakes`.
//!
//! Reference: <https://earthquake.usgs.gov/earthquakes/feed/v1.0/geojson.php>

use chrono::{DateTime, Utc};
use geofeed_core::config::FilterSettings;
use geofeed_core::error::FeedError;
use geofeed_core::filter::{magnitude_stage, EntryFilter, HasMagnitude};
use geofeed_core::models::{Coordinate, Feature, FeatureCollection, FeedEntry};
use geofeed_core::source::{latest_by, EntryExtractor, TimestampReducer};
use serde::Serialize;

use crate::generic::resolve_external_id;

const URL_PREFIX: &str = "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/";

/// Feed type name and summary document file name.
static FEED_TYPES: [(&str, &str); 20] = [
    ("past_hour_significant_earthquakes", "significant_hour.geojson"),
    ("past_hour_m45_earthquakes", "4.5_hour.geojson"),
    ("past_hour_m25_earthquakes", "2.5_hour.geojson"),
    ("past_hour_m10_earthquakes", "1.0_hour.geojson"),
    ("past_hour_all_earthquakes", "all_hour.geojson"),
    ("past_day_significant_earthquakes", "significant_day.geojson"),
    ("past_day_m45_earthquakes", "4.5_day.geojson"),
    ("past_day_m25_earthquakes", "2.5_day.geojson"),
    ("past_day_m10_earthquakes", "1.0_day.geojson"),
    ("past_day_all_earthquakes", "all_day.geojson"),
    ("past_week_significant_earthquakes", "significant_week.geojson"),
    ("past_week_m45_earthquakes", "4.5_week.geojson"),
    ("past_week_m25_earthquakes", "2.5_week.geojson"),
    ("past_week_m10_earthquakes", "1.0_week.geojson"),
    ("past_week_all_earthquakes", "all_week.geojson"),
    ("past_month_significant_earthquakes", "significant_month.geojson"),
    ("past_month_m45_earthquakes", "4.5_month.geojson"),
    ("past_month_m25_earthquakes", "2.5_month.geojson"),
    ("past_month_m10_earthquakes", "1.0_month.geojson"),
    ("past_month_all_earthquakes", "all_month.geojson"),
];

/// All supported feed type names, in publication order.
pub fn feed_types() -> impl Iterator<Item = &'static str> {
    FEED_TYPES.iter().map(|(name, _)| *name)
}

/// Earthquake details published in each feature's properties.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct EarthquakeAttributes {
    pub place: Option<String>,
    pub magnitude: Option<f64>,
    /// Origin time.
    pub time: Option<DateTime<Utc>>,
    pub updated: Option<DateTime<Utc>>,
    /// PAGER alert level (green, yellow, orange, red).
    pub alert: Option<String>,
    #[serde(rename = "type")]
    pub event_type: Option<String>,
    /// `automatic` or `reviewed`.
    pub status: Option<String>,
}

impl HasMagnitude for EarthquakeAttributes {
    fn magnitude(&self) -> Option<f64> {
        self.magnitude
    }
}

impl EarthquakeAttributes {
    fn from_feature(feature: &Feature) -> Self {
        Self {
            place: feature.property_string("place"),
            magnitude: feature.property_f64("mag"),
            time: feature.property_i64("time").and_then(from_epoch_millis),
            updated: feature.property_i64("updated").and_then(from_epoch_millis),
            alert: feature.property_string("alert"),
            event_type: feature.property_string("type"),
            status: feature.property_string("status"),
        }
    }
}

fn from_epoch_millis(millis: i64) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp_millis(millis)
}

/// Extractor for one USGS summary feed.
#[derive(Debug, Clone)]
pub struct UsgsEarthquakeFeed {
    feed_type: &'static str,
    url: String,
}

impl UsgsEarthquakeFeed {
    /// # Errors
    ///
    /// Returns `FeedError::UnknownFeedType` if `feed_type` is not one of
    /// [`feed_types`].
    pub fn new(feed_type: &str) -> Result<Self, FeedError> {
        let (name, file) = FEED_TYPES
            .iter()
            .find(|(name, _)| *name == feed_type)
            .ok_or_else(|| FeedError::UnknownFeedType(feed_type.to_string()))?;
        Ok(Self {
            feed_type: *name,
            url: format!("{}{}", URL_PREFIX, file),
        })
    }

    pub fn feed_type(&self) -> &'static str {
        self.feed_type
    }
}

impl EntryExtractor for UsgsEarthquakeFeed {
    type Attributes = EarthquakeAttributes;

    fn name(&self) -> &'static str {
        "usgs_earthquakes"
    }

    fn url(&self) -> &str {
        &self.url
    }

    /// The document's `metadata.title`, shared by every entry.
    fn feed_attribution(&self, collection: &FeatureCollection) -> Option<String> {
        collection.metadata_str("title").map(str::to_string)
    }

    fn extract(
        &self,
        home: Coordinate,
        feature: &Feature,
        feed_attribution: Option<&str>,
    ) -> FeedEntry<EarthquakeAttributes> {
        let title = feature.property_string("title");
        let external_id = feature
            .id_string()
            .unwrap_or_else(|| resolve_external_id(feature, title.as_deref()));

        FeedEntry::new(
            home,
            external_id,
            feature.geometry.clone(),
            EarthquakeAttributes::from_feature(feature),
        )
        .with_title(title)
        .with_attribution(feed_attribution.map(str::to_string))
    }

    fn domain_filters(
        &self,
        settings: &FilterSettings,
    ) -> Vec<Box<dyn EntryFilter<EarthquakeAttributes>>> {
        magnitude_stage(settings).into_iter().collect()
    }
}

impl TimestampReducer<EarthquakeAttributes> for UsgsEarthquakeFeed {
    fn latest_timestamp(
        &self,
        entries: &[FeedEntry<EarthquakeAttributes>],
    ) -> Option<DateTime<Utc>> {
        latest_by(entries, |attributes| attributes.updated)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    #[test]
    fn test_feed_types() {
        assert_eq!(feed_types().count(), 20);
        assert!(feed_types().all(|name| name.starts_with("past_") && name.ends_with("_earthquakes")));
    }

    #[test]
    fn test_new_resolves_url() {
        let feed = UsgsEarthquakeFeed::new("past_hour_m25_earthquakes").unwrap();
        assert_eq!(feed.feed_type(), "past_hour_m25_earthquakes");
        assert_eq!(
            feed.url(),
            "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/2.5_hour.geojson"
        );

        let feed = UsgsEarthquakeFeed::new("past_month_significant_earthquakes").unwrap();
        assert_eq!(
            feed.url(),
            "https://earthquake.usgs.gov/earthquakes/feed/v1.0/summary/significant_month.geojson"
        );
    }

    #[test]
    fn test_new_with_unknown_feed_type() {
        let result = UsgsEarthquakeFeed::new("DOESNOTEXIST");
        assert!(matches!(result, Err(FeedError::UnknownFeedType(ref name)) if name == "DOESNOTEXIST"));
    }

    #[test]
    fn test_extract() {
        let feed = UsgsEarthquakeFeed::new("past_day_all_earthquakes").unwrap();
        let feature: Feature = serde_json::from_value(json!({
            "type": "Feature",
            "id": "1234",
            "geometry": {"type": "Point", "coordinates": [149.1234, -32.2345, 10.0]},
            "properties": {
                "title": "Title 1",
                "place": "Place 1",
                "mag": 3.0,
                "time": 1537603200000_i64,
                "updated": 1537605000000_i64,
                "alert": "Alert 1",
                "type": "Type 1",
                "status": "Status 1"
            }
        }))
        .unwrap();

        let entry = feed.extract(Coordinate::new(-31.0, 151.0), &feature, Some("Feed Title"));

        assert_eq!(entry.external_id, "1234");
        assert_eq!(entry.title.as_deref(), Some("Title 1"));
        assert_eq!(entry.attribution.as_deref(), Some("Feed Title"));
        assert!((entry.distance_to_home - 224.5).abs() < 0.1);
        let attrs = &entry.attributes;
        assert_eq!(attrs.place.as_deref(), Some("Place 1"));
        assert_eq!(attrs.magnitude, Some(3.0));
        assert_eq!(attrs.time, Utc.with_ymd_and_hms(2018, 9, 22, 8, 0, 0).single());
        assert_eq!(attrs.updated, Utc.with_ymd_and_hms(2018, 9, 22, 8, 30, 0).single());
        assert_eq!(attrs.alert.as_deref(), Some("Alert 1"));
        assert_eq!(attrs.event_type.as_deref(), Some("Type 1"));
        assert_eq!(attrs.status.as_deref(), Some("Status 1"));
    }

    #[test]
    fn test_missing_properties() {
        let feed = UsgsEarthquakeFeed::new("past_day_all_earthquakes").unwrap();
        let feature: Feature = serde_json::from_value(json!({
            "id": "5678",
            "geometry": null,
            "properties": {"mag": null}
        }))
        .unwrap();

        let entry = feed.extract(Coordinate::new(0.0, 0.0), &feature, None);
        assert_eq!(entry.attributes, EarthquakeAttributes::default());
        assert!(entry.attribution.is_none());
        assert!(entry.distance_to_home.is_infinite());
    }

    #[test]
    fn test_magnitude_stage_only_when_configured() {
        let feed = UsgsEarthquakeFeed::new("past_day_all_earthquakes").unwrap();
        assert!(feed.domain_filters(&FilterSettings::default()).is_empty());

        let stages = feed.domain_filters(&FilterSettings::default().with_minimum_magnitude(0.0));
        assert_eq!(stages.len(), 1);
        assert_eq!(stages[0].name(), "minimum_magnitude");
    }

    #[test]
    fn test_latest_timestamp_uses_updated() {
        let feed = UsgsEarthquakeFeed::new("past_day_all_earthquakes").unwrap();
        let home = Coordinate::new(0.0, 0.0);
        let at = |minute| Utc.with_ymd_and_hms(2018, 9, 22, 8, minute, 0).single();
        let entry = |id: &str, updated| {
            FeedEntry::new(
                home,
                id,
                None,
                EarthquakeAttributes {
                    time: at(0),
                    updated,
                    ..EarthquakeAttributes::default()
                },
            )
        };

        let entries = vec![entry("a", at(10)), entry("b", at(40)), entry("c", None)];
        assert_eq!(feed.latest_timestamp(&entries), at(40));
        assert_eq!(feed.latest_timestamp(&[]), None);
    }
}
