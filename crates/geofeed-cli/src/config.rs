use anyhow::{bail, Context};
use clap::{Parser, Subcommand, ValueEnum};
use geofeed_core::{default_config_path, Coordinate, FeedsConfig};
use std::path::PathBuf;

/// CLI configuration parsed from command line arguments and environment variables
#[derive(Parser, Debug)]
#[command(name = "geofeed")]
#[command(
    author,
    version,
    about = "Poll geospatial GeoJSON feeds and track incidents near home"
)]
#[command(after_help = "Examples:
  geofeed poll --once
  geofeed show --usgs past_day_m25_earthquakes --radius 500 --format json
  geofeed show --nsw-rfs --latitude -33.87 --longitude 151.21 --radius 100
  geofeed feed-types")]
pub struct Config {
    /// Home latitude in degrees (overrides [home] in the feeds file)
    #[arg(long, env = "GEOFEED_LATITUDE", global = true, allow_negative_numbers = true)]
    pub latitude: Option<f64>,

    /// Home longitude in degrees (overrides [home] in the feeds file)
    #[arg(long, env = "GEOFEED_LONGITUDE", global = true, allow_negative_numbers = true)]
    pub longitude: Option<f64>,

    /// Custom path to feeds.toml configuration file
    #[arg(short, long, value_name = "PATH", env = "GEOFEED_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl Config {
    /// Explicit `--config` path, else the platform default.
    pub fn feeds_path(&self) -> Option<PathBuf> {
        self.config.clone().or_else(default_config_path)
    }

    /// Home coordinate from the command line, else from the feeds file.
    pub fn home(&self, feeds: Option<&FeedsConfig>) -> anyhow::Result<Coordinate> {
        match (self.latitude, self.longitude) {
            (Some(latitude), Some(longitude)) => Coordinate::try_new(latitude, longitude)
                .context("Invalid --latitude/--longitude"),
            (None, None) => match feeds.and_then(|f| f.home) {
                Some(home) => home.coordinate().context("Invalid [home] in feeds file"),
                None => bail!(
                    "No home coordinate: pass --latitude and --longitude or add [home] to feeds.toml"
                ),
            },
            _ => bail!("--latitude and --longitude must be given together"),
        }
    }
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Poll the configured feeds and log entry lifecycle events
    #[command(after_help = "Examples:
  geofeed poll                          # Poll all enabled feeds until Ctrl-C
  geofeed poll --once                   # Run a single cycle and exit
  geofeed poll --feed quakes            # Poll one feed by name
  geofeed poll --interval 60            # Override the configured interval")]
    Poll {
        /// Run a single reconciliation cycle and exit
        #[arg(long)]
        once: bool,

        /// Seconds between cycles (default from the feeds file)
        #[arg(short, long, value_name = "SECS")]
        interval: Option<u64>,

        /// Poll a specific feed by name from config file
        #[arg(short, long, value_name = "NAME")]
        feed: Option<String>,
    },
    /// Fetch one snapshot and print its filtered entries
    #[command(after_help = "Examples:
  geofeed show https://example.org/incidents.geojson --radius 50
  geofeed show --usgs past_week_m45_earthquakes --minimum-magnitude 5.5
  geofeed show --nsw-rfs --category \"Emergency Warning\" --format csv")]
    Show {
        /// URL of a generic GeoJSON feed
        #[arg(
            value_name = "URL",
            required_unless_present_any = ["usgs", "nsw_rfs"],
            conflicts_with_all = ["usgs", "nsw_rfs"]
        )]
        url: Option<String>,

        /// USGS earthquake feed type (see `geofeed feed-types`)
        #[arg(long, value_name = "TYPE", conflicts_with = "nsw_rfs")]
        usgs: Option<String>,

        /// NSW Rural Fire Service major incidents
        #[arg(long)]
        nsw_rfs: bool,

        /// Keep only entries within this many kilometres of home
        #[arg(short, long, value_name = "KM")]
        radius: Option<f64>,

        /// Keep only earthquakes at or above this magnitude (USGS only)
        #[arg(short, long, value_name = "M")]
        minimum_magnitude: Option<f64>,

        /// Keep only incidents in this category (NSW RFS only, repeatable)
        #[arg(long = "category", value_name = "CATEGORY")]
        categories: Vec<String>,

        /// Output format for entries
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },
    /// List USGS earthquake feed types
    FeedTypes,
}

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Aligned columns for terminals
    Table,
    /// Standard JSON array format
    Json,
    /// JSON Lines format (one JSON object per line)
    Jsonl,
    /// CSV format (comma-separated values)
    Csv,
}
