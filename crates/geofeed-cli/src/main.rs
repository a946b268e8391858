use std::time::Duration;

use anyhow::{bail, Context};
use clap::Parser;
use dotenvy::dotenv;
use serde::Serialize;
use tracing::{error, info, Level};
use tracing_subscriber::FmtSubscriber;

use geofeed_cli::{
    poll_round, poll_until, render, Command, Config, EntryRecord, ManagedFeed, OutputFormat,
};
use geofeed_client::usgs::feed_types;
use geofeed_client::{GeoJsonFeed, GenericFeed, NswRuralFireFeed, UsgsEarthquakeFeed};
use geofeed_core::source::{EntryExtractor, TimestampReducer};
use geofeed_core::{
    load_feeds_config, Coordinate, FeedError, FeedSnapshot, FeedSource, FeedsConfig,
    FilterSettings, HttpConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenv().ok();

    // Parse command line arguments
    let config = Config::parse();

    // Setup logging (stderr to keep stdout clean for entry output)
    let level = if config.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let subscriber = FmtSubscriber::builder()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("setting default subscriber failed")?;

    // Execute command
    match &config.command {
        Command::Poll {
            once,
            interval,
            feed,
        } => {
            poll(&config, *once, *interval, feed.as_deref()).await?;
        }
        Command::Show {
            url,
            usgs,
            nsw_rfs,
            radius,
            minimum_magnitude,
            categories,
            format,
        } => {
            let mut settings = FilterSettings {
                radius_km: *radius,
                minimum_magnitude: *minimum_magnitude,
                ..FilterSettings::default()
            };
            if !categories.is_empty() {
                settings.categories = Some(categories.clone());
            }
            let source = match (url, usgs, nsw_rfs) {
                (Some(url), _, _) => ShowSource::Generic(url.clone()),
                (None, Some(feed_type), _) => ShowSource::Usgs(feed_type.clone()),
                _ => ShowSource::NswRfs,
            };
            show(&config, source, settings, *format).await?;
        }
        Command::FeedTypes => {
            for name in feed_types() {
                println!("{}", name);
            }
        }
    }

    Ok(())
}

/// Loads the feeds file; a missing file is only fatal when `required`.
fn load_feeds(config: &Config, required: bool) -> anyhow::Result<Option<FeedsConfig>> {
    let Some(path) = config.feeds_path() else {
        if required {
            bail!("No configuration directory found; pass --config <PATH>");
        }
        return Ok(None);
    };

    match load_feeds_config(&path) {
        Ok(feeds) => Ok(Some(feeds)),
        Err(FeedError::ConfigNotFound(_)) if !required => Ok(None),
        Err(e) => bail!(e.user_message()),
    }
}

/// Poll configured feeds until interrupted
async fn poll(
    config: &Config,
    once: bool,
    interval_override: Option<u64>,
    only: Option<&str>,
) -> anyhow::Result<()> {
    let feeds_config = load_feeds(config, true)?.unwrap_or_default();
    let home = config.home(Some(&feeds_config))?;

    let selected: Vec<_> = match only {
        Some(name) => {
            let feed = feeds_config
                .find_feed(name)
                .with_context(|| format!("Feed '{}' not found in config", name))?;
            vec![feed]
        }
        None => feeds_config.enabled_feeds().collect(),
    };
    if selected.is_empty() {
        bail!("No enabled feeds in config");
    }

    let mut feeds = selected
        .into_iter()
        .map(|feed| ManagedFeed::from_config(feed, home, &feeds_config.http))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;

    info!("Polling {} feed(s) around {}", feeds.len(), home);

    if once {
        poll_round(&mut feeds).await;
        return Ok(());
    }

    let period = interval_override
        .map(Duration::from_secs)
        .unwrap_or_else(|| feeds_config.poll.interval());
    if period.is_zero() {
        bail!("Poll interval must be at least one second");
    }

    poll_until(&mut feeds, period, async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            error!("Unable to listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
    })
    .await;
    info!("Interrupted, shutting down");

    Ok(())
}

enum ShowSource {
    Generic(String),
    Usgs(String),
    NswRfs,
}

/// Fetch one snapshot and print it
async fn show(
    config: &Config,
    source: ShowSource,
    settings: FilterSettings,
    format: OutputFormat,
) -> anyhow::Result<()> {
    let feeds_config = load_feeds(config, false)?;
    let home = config.home(feeds_config.as_ref())?;
    let http = feeds_config.map(|f| f.http).unwrap_or_default();

    let result = match source {
        ShowSource::Generic(url) => {
            let extractor = GenericFeed::new(&url).map_err(user_error)?;
            show_feed(home, extractor, settings, &http, format).await
        }
        ShowSource::Usgs(feed_type) => {
            let extractor = UsgsEarthquakeFeed::new(&feed_type).map_err(user_error)?;
            show_feed(home, extractor, settings, &http, format).await
        }
        ShowSource::NswRfs => {
            show_feed(home, NswRuralFireFeed::new(), settings, &http, format).await
        }
    };

    if let Err(e) = &result {
        error!("{:#}", e);
    }
    result
}

async fn show_feed<X>(
    home: Coordinate,
    extractor: X,
    settings: FilterSettings,
    http: &HttpConfig,
    format: OutputFormat,
) -> anyhow::Result<()>
where
    X: EntryExtractor + TimestampReducer<<X as EntryExtractor>::Attributes>,
    X::Attributes: Serialize,
{
    let feed = GeoJsonFeed::new(home, extractor, settings, http).map_err(user_error)?;
    info!("Fetching {}", feed);

    match feed.fetch_snapshot(None).await {
        FeedSnapshot::Ok {
            entries,
            latest_timestamp,
        } => {
            if entries.is_empty() {
                eprintln!("No entries matched the filters.");
                return Ok(());
            }
            if let Some(latest) = latest_timestamp {
                info!("Newest entry: {}", latest.format("%Y-%m-%dT%H:%M:%SZ"));
            }
            let records: Vec<EntryRecord> = entries.iter().map(EntryRecord::from_entry).collect();
            print!("{}", render(&records, format)?);
            info!("Printed {} entries", records.len());
            Ok(())
        }
        FeedSnapshot::OkNoData => {
            eprintln!("The feed reported no new data.");
            Ok(())
        }
        FeedSnapshot::Error(e) => Err(user_error(e)),
    }
}

fn user_error(e: FeedError) -> anyhow::Error {
    anyhow::anyhow!(e.user_message())
}
