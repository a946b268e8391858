//! Geofeed CLI - Command-line interface for polling geospatial feeds
//!
//! This crate provides the CLI application that ties together all geofeed components.

pub mod config;
pub mod feeds;
pub mod output;

pub use config::{Command, Config, OutputFormat};
pub use feeds::{poll_round, poll_until, LoggingHandler, ManagedFeed};
pub use output::{render, EntryRecord};
