//! Geofeed Core - Domain types, geometry, filtering and feed reconciliation.

pub mod config;
pub mod error;
pub mod filter;
pub mod geometry;
pub mod manager;
pub mod models;
pub mod snapshot;
pub mod source;
pub mod sync;

pub use config::{
    default_config_path, load_feeds_config, FeedConfig, FeedKind, FeedsConfig, FilterSettings,
    HomeConfig, HttpConfig, PollConfig,
};
pub use error::FeedError;
pub use filter::{Categorized, EntryFilter, FilterChain, HasMagnitude};
pub use geometry::{distance_to, extract_coordinates, haversine_km, EARTH_RADIUS_KM};
pub use manager::{CallbackHandler, EntityHandler, FeedManager};
pub use models::{Coordinate, Feature, FeatureCollection, FeedEntry, Geometry};
pub use snapshot::{FeedSnapshot, UpdateStatus};
pub use source::{latest_by, EntryExtractor, FeedSource, TimestampReducer};
pub use sync::{FeedPollResult, PollSummary, SyncOutcome, SyncReport, SyncStats};
