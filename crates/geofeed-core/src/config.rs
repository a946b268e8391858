//! Configuration types for geofeed components.
//!
//! Feeds are declared in a TOML file (default `<config dir>/geofeed/feeds.toml`):
//!
//! ```toml
//! [home]
//! latitude = -33.87
//! longitude = 151.21
//!
//! [poll]
//! interval_secs = 300
//!
//! [[feeds]]
//! name = "quakes"
//! kind = "usgs_earthquakes"
//! feed_type = "past_day_m25_earthquakes"
//! radius = 500.0
//! minimum_magnitude = 3.0
//!
//! [[feeds]]
//! name = "fires"
//! kind = "nsw_rural_fire"
//! radius = 50.0
//! categories = ["Emergency Warning", "Watch and Act"]
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::FeedError;
use crate::models::Coordinate;

/// HTTP client configuration for feed fetches.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub user_agent: String,
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            user_agent: format!("geofeed/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Polling cadence used by the CLI.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
}

impl PollConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self { interval_secs: 300 }
    }
}

/// Entry filter settings.
///
/// `radius_km` feeds the distance stage of every feed. `categories` and
/// `minimum_magnitude` are only honoured by adapters whose entries carry
/// those attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FilterSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius_km: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_magnitude: Option<f64>,
}

impl FilterSettings {
    pub fn with_radius(mut self, radius_km: f64) -> Self {
        self.radius_km = Some(radius_km);
        self
    }

    pub fn with_categories<I, S>(mut self, categories: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.categories = Some(categories.into_iter().map(Into::into).collect());
        self
    }

    pub fn with_minimum_magnitude(mut self, minimum_magnitude: f64) -> Self {
        self.minimum_magnitude = Some(minimum_magnitude);
        self
    }

    /// Merges per-call overrides: every field set in `overrides` wins.
    ///
    /// # Examples
    ///
    /// ```
    /// use geofeed_core::FilterSettings;
    ///
    /// let defaults = FilterSettings::default().with_radius(50.0).with_minimum_magnitude(2.5);
    /// let overrides = FilterSettings::default().with_radius(200.0);
    /// let merged = defaults.with_overrides(&overrides);
    /// assert_eq!(merged.radius_km, Some(200.0));
    /// assert_eq!(merged.minimum_magnitude, Some(2.5));
    /// ```
    pub fn with_overrides(&self, overrides: &FilterSettings) -> FilterSettings {
        FilterSettings {
            radius_km: overrides.radius_km.or(self.radius_km),
            categories: overrides
                .categories
                .clone()
                .or_else(|| self.categories.clone()),
            minimum_magnitude: overrides.minimum_magnitude.or(self.minimum_magnitude),
        }
    }

    /// Rejects a non-positive or non-finite radius and a non-finite magnitude.
    pub fn validate(&self) -> Result<(), FeedError> {
        if let Some(radius) = self.radius_km {
            if !radius.is_finite() || radius <= 0.0 {
                return Err(FeedError::InvalidFilter(format!(
                    "radius must be a positive number of kilometres, got {}",
                    radius
                )));
            }
        }
        if let Some(magnitude) = self.minimum_magnitude {
            if !magnitude.is_finite() {
                return Err(FeedError::InvalidFilter(format!(
                    "minimum magnitude must be finite, got {}",
                    magnitude
                )));
            }
        }
        Ok(())
    }
}

/// Home coordinate as written in the feeds file.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HomeConfig {
    pub latitude: f64,
    pub longitude: f64,
}

impl HomeConfig {
    pub fn coordinate(&self) -> Result<Coordinate, FeedError> {
        Coordinate::try_new(self.latitude, self.longitude)
    }
}

/// Source dialect of a configured feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Generic,
    UsgsEarthquakes,
    NswRuralFire,
}

/// One `[[feeds]]` entry. Unknown keys are rejected so a misspelt filter
/// cannot silently disable itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    pub name: String,
    pub kind: FeedKind,
    /// Required for `generic` feeds.
    #[serde(default)]
    pub url: Option<String>,
    /// Required for `usgs_earthquakes` feeds.
    #[serde(default)]
    pub feed_type: Option<String>,
    /// Kilometres from home.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f64>,
    /// Allow-list, `nsw_rural_fire` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// Inclusive threshold, `usgs_earthquakes` only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum_magnitude: Option<f64>,
    #[serde(default = "default_enabled")]
    pub enabled: bool,
}

fn default_enabled() -> bool {
    true
}

impl FeedConfig {
    fn validate(&self) -> Result<(), FeedError> {
        if self.name.trim().is_empty() {
            return Err(FeedError::Config("feed name must not be empty".to_string()));
        }
        match self.kind {
            FeedKind::Generic if self.url.is_none() => {
                return Err(FeedError::Config(format!(
                    "feed '{}': generic feeds need a url",
                    self.name
                )));
            }
            FeedKind::UsgsEarthquakes if self.feed_type.is_none() => {
                return Err(FeedError::Config(format!(
                    "feed '{}': usgs_earthquakes feeds need a feed_type",
                    self.name
                )));
            }
            _ => {}
        }
        if self.categories.is_some() && self.kind != FeedKind::NswRuralFire {
            return Err(FeedError::Config(format!(
                "feed '{}': categories only apply to nsw_rural_fire feeds",
                self.name
            )));
        }
        if self.minimum_magnitude.is_some() && self.kind != FeedKind::UsgsEarthquakes {
            return Err(FeedError::Config(format!(
                "feed '{}': minimum_magnitude only applies to usgs_earthquakes feeds",
                self.name
            )));
        }
        self.filters().validate()
    }

    /// Filter settings declared for this feed.
    pub fn filters(&self) -> FilterSettings {
        FilterSettings {
            radius_km: self.radius,
            categories: self.categories.clone(),
            minimum_magnitude: self.minimum_magnitude,
        }
    }
}

/// Root of the feeds configuration file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedsConfig {
    #[serde(default)]
    pub home: Option<HomeConfig>,
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub feeds: Vec<FeedConfig>,
}

impl FeedsConfig {
    /// Parses and validates a TOML document.
    pub fn from_toml(text: &str) -> Result<Self, FeedError> {
        let config: FeedsConfig =
            toml::from_str(text).map_err(|e| FeedError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), FeedError> {
        if let Some(home) = &self.home {
            home.coordinate()?;
        }
        let mut names = HashSet::new();
        for feed in &self.feeds {
            feed.validate()?;
            if !names.insert(feed.name.as_str()) {
                return Err(FeedError::Config(format!(
                    "duplicate feed name '{}'",
                    feed.name
                )));
            }
        }
        Ok(())
    }

    pub fn enabled_feeds(&self) -> impl Iterator<Item = &FeedConfig> {
        self.feeds.iter().filter(|feed| feed.enabled)
    }

    pub fn find_feed(&self, name: &str) -> Option<&FeedConfig> {
        self.feeds.iter().find(|feed| feed.name == name)
    }
}

/// Default location of the feeds file, if the platform has a config dir.
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("geofeed").join("feeds.toml"))
}

/// Reads, parses and validates a feeds file.
///
/// # Errors
///
/// Returns `FeedError::ConfigNotFound` if the file does not exist,
/// `FeedError::Io` if it cannot be read, and `FeedError::Config` (or a more
/// specific configuration variant) if it is invalid.
pub fn load_feeds_config(path: &Path) -> Result<FeedsConfig, FeedError> {
    if !path.exists() {
        return Err(FeedError::ConfigNotFound(path.to_path_buf()));
    }
    let text = std::fs::read_to_string(path)?;
    FeedsConfig::from_toml(&text)
}
