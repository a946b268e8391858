//! NSW Rural Fire Service major incidents feed.
//!
//! Incident details live in an HTML-ish `description` property of the form
//! `LOCATION: ... <br />COUNCIL AREA: ... <br />STATUS: ... <br />...`; the
//! individual fields are pulled out with one regex per label.

use std::sync::OnceLock;

use chrono::{DateTime, NaiveDateTime, Utc};
use geofeed_core::config::FilterSettings;
use geofeed_core::filter::{category_stage, Categorized, EntryFilter};
use geofeed_core::models::{Coordinate, Feature, FeedEntry};
use geofeed_core::source::{latest_by, EntryExtractor, TimestampReducer};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::generic::resolve_external_id;

pub const URL: &str = "https://www.rfs.nsw.gov.au/feeds/majorIncidents.json";

pub const ATTRIBUTION: &str = "State of New South Wales (NSW Rural Fire Service)";

/// Alert levels used by the `category` property.
pub const VALID_CATEGORIES: [&str; 4] =
    ["Emergency Warning", "Watch and Act", "Advice", "Not Applicable"];

/// Example: `15/09/2018 9:31:00 AM`, always UTC.
const PUB_DATE_FORMAT: &str = "%d/%m/%Y %I:%M:%S %p";

/// Labelled fields of the incident description.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DescriptionField {
    Location,
    CouncilArea,
    Status,
    Type,
    Fire,
    Size,
    ResponsibleAgency,
}

impl DescriptionField {
    const ALL: [DescriptionField; 7] = [
        DescriptionField::Location,
        DescriptionField::CouncilArea,
        DescriptionField::Status,
        DescriptionField::Type,
        DescriptionField::Fire,
        DescriptionField::Size,
        DescriptionField::ResponsibleAgency,
    ];

    fn label(self) -> &'static str {
        match self {
            DescriptionField::Location => "LOCATION",
            DescriptionField::CouncilArea => "COUNCIL AREA",
            DescriptionField::Status => "STATUS",
            DescriptionField::Type => "TYPE",
            DescriptionField::Fire => "FIRE",
            DescriptionField::Size => "SIZE",
            DescriptionField::ResponsibleAgency => "RESPONSIBLE AGENCY",
        }
    }

    fn pattern(self) -> &'static Regex {
        static PATTERNS: OnceLock<Vec<Regex>> = OnceLock::new();
        let patterns = PATTERNS.get_or_init(|| {
            DescriptionField::ALL
                .iter()
                .map(|field| {
                    // Labels are plain uppercase words; no escaping needed.
                    Regex::new(&format!("{}: (?P<value>[^<]+) <br", field.label()))
                        .expect("Valid regex")
                })
                .collect()
        });
        &patterns[self as usize]
    }

    fn find(self, description: &str) -> Option<String> {
        self.pattern()
            .captures(description)
            .and_then(|caps| caps.name("value"))
            .map(|value| value.as_str().to_string())
    }
}

/// Incident details for one feature.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FireIncidentAttributes {
    pub category: Option<String>,
    pub publication_date: Option<DateTime<Utc>>,
    pub description: Option<String>,
    pub location: Option<String>,
    pub council_area: Option<String>,
    pub status: Option<String>,
    #[serde(rename = "type")]
    pub incident_type: Option<String>,
    /// True only when the description says `FIRE: Yes`.
    pub fire: bool,
    pub size: Option<String>,
    pub responsible_agency: Option<String>,
}

impl Categorized for FireIncidentAttributes {
    fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }
}

impl FireIncidentAttributes {
    fn from_feature(feature: &Feature) -> Self {
        let description = feature.property_string("description");
        let field = |field: DescriptionField| description.as_deref().and_then(|d| field.find(d));

        Self {
            category: feature.property_string("category"),
            publication_date: feature.property_str("pubDate").and_then(parse_pub_date),
            location: field(DescriptionField::Location),
            council_area: field(DescriptionField::CouncilArea),
            status: field(DescriptionField::Status),
            incident_type: field(DescriptionField::Type),
            fire: field(DescriptionField::Fire).as_deref() == Some("Yes"),
            size: field(DescriptionField::Size),
            responsible_agency: field(DescriptionField::ResponsibleAgency),
            description,
        }
    }
}

fn parse_pub_date(raw: &str) -> Option<DateTime<Utc>> {
    match NaiveDateTime::parse_from_str(raw.trim(), PUB_DATE_FORMAT) {
        Ok(naive) => Some(naive.and_utc()),
        Err(err) => {
            debug!("Ignoring unparseable pubDate {:?}: {}", raw, err);
            None
        }
    }
}

/// Extractor for the fixed NSW RFS major incidents document.
#[derive(Debug, Clone, Copy, Default)]
pub struct NswRuralFireFeed;

impl NswRuralFireFeed {
    pub fn new() -> Self {
        Self
    }
}

impl EntryExtractor for NswRuralFireFeed {
    type Attributes = FireIncidentAttributes;

    fn name(&self) -> &'static str {
        "nsw_rural_fire"
    }

    fn url(&self) -> &str {
        URL
    }

    fn extract(
        &self,
        home: Coordinate,
        feature: &Feature,
        _feed_attribution: Option<&str>,
    ) -> FeedEntry<FireIncidentAttributes> {
        let title = feature.property_string("title");
        let external_id = feature
            .property_id("guid")
            .unwrap_or_else(|| resolve_external_id(feature, title.as_deref()));

        FeedEntry::new(
            home,
            external_id,
            feature.geometry.clone(),
            FireIncidentAttributes::from_feature(feature),
        )
        .with_title(title)
        .with_attribution(Some(ATTRIBUTION.to_string()))
    }

    fn domain_filters(
        &self,
        settings: &FilterSettings,
    ) -> Vec<Box<dyn EntryFilter<FireIncidentAttributes>>> {
        category_stage(settings).into_iter().collect()
    }
}

impl TimestampReducer<FireIncidentAttributes> for NswRuralFireFeed {
    fn latest_timestamp(
        &self,
        entries: &[FeedEntry<FireIncidentAttributes>],
    ) -> Option<DateTime<Utc>> {
        latest_by(entries, |attributes| attributes.publication_date)
    }
}
