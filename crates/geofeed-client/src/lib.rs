//! Geofeed Client - GeoJSON feed transport and source adapters
//!
//! This crate provides:
//!
//! - [`feed`] - the HTTP-backed [`GeoJsonFeed`], generic over one source dialect
//! - [`generic`] - arbitrary GeoJSON documents
//! - [`usgs`] - U.S. Geological Survey earthquake summary feeds
//! - [`nsw_rfs`] - NSW Rural Fire Service major incidents
//!
//! # Overview
//!
//! A dialect implements `EntryExtractor` and `TimestampReducer` from
//! `geofeed-core`; wrapping it in a [`GeoJsonFeed`] yields a `FeedSource`
//! that a `FeedManager` can reconcile.

pub mod feed;
pub mod generic;
pub mod nsw_rfs;
pub mod usgs;

// Re-export main feed types
pub use feed::GeoJsonFeed;
pub use generic::{GenericAttributes, GenericFeed};
pub use nsw_rfs::{FireIncidentAttributes, NswRuralFireFeed};
pub use usgs::{EarthquakeAttributes, UsgsEarthquakeFeed};
