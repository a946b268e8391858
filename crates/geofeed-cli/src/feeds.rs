//! Builds reconciliation engines from the feeds file.

use std::future::Future;
use std::time::Duration;

use futures::future::join_all;
use geofeed_client::{GeoJsonFeed, GenericFeed, NswRuralFireFeed, UsgsEarthquakeFeed};
use geofeed_core::{
    Coordinate, EntityHandler, FeedConfig, FeedError, FeedKind, FeedManager, FeedPollResult,
    HttpConfig, PollSummary, SyncReport,
};
use tokio::time::{interval, MissedTickBehavior};
use tracing::{debug, info, warn};

/// Logs every lifecycle transition of one feed.
#[derive(Debug, Clone)]
pub struct LoggingHandler {
    feed: String,
}

impl LoggingHandler {
    pub fn new(feed: impl Into<String>) -> Self {
        Self { feed: feed.into() }
    }
}

impl EntityHandler for LoggingHandler {
    fn on_create(&mut self, external_id: &str) {
        info!(feed = %self.feed, "+ {}", external_id);
    }

    fn on_update(&mut self, external_id: &str) {
        debug!(feed = %self.feed, "~ {}", external_id);
    }

    fn on_remove(&mut self, external_id: &str) {
        info!(feed = %self.feed, "- {}", external_id);
    }
}

type Manager<X> = FeedManager<GeoJsonFeed<X>, LoggingHandler>;

/// One configured feed with its engine.
pub enum ManagedFeed {
    Generic(Manager<GenericFeed>),
    UsgsEarthquakes(Manager<UsgsEarthquakeFeed>),
    NswRuralFire(Manager<NswRuralFireFeed>),
}

impl ManagedFeed {
    /// # Errors
    ///
    /// Returns a configuration error for a missing url or feed type, an
    /// unknown USGS feed type, or invalid filter settings.
    pub fn from_config(
        feed: &FeedConfig,
        home: Coordinate,
        http: &HttpConfig,
    ) -> Result<Self, FeedError> {
        let filters = feed.filters();
        let handler = LoggingHandler::new(&feed.name);

        let managed = match feed.kind {
            FeedKind::Generic => {
                let url = feed.url.as_deref().ok_or_else(|| {
                    FeedError::Config(format!("feed '{}': generic feeds need a url", feed.name))
                })?;
                let source = GeoJsonFeed::new(home, GenericFeed::new(url)?, filters, http)?;
                ManagedFeed::Generic(FeedManager::new(source, handler).with_name(&feed.name))
            }
            FeedKind::UsgsEarthquakes => {
                let feed_type = feed.feed_type.as_deref().ok_or_else(|| {
                    FeedError::Config(format!(
                        "feed '{}': usgs_earthquakes feeds need a feed_type",
                        feed.name
                    ))
                })?;
                let source =
                    GeoJsonFeed::new(home, UsgsEarthquakeFeed::new(feed_type)?, filters, http)?;
                ManagedFeed::UsgsEarthquakes(
                    FeedManager::new(source, handler).with_name(&feed.name),
                )
            }
            FeedKind::NswRuralFire => {
                let source = GeoJsonFeed::new(home, NswRuralFireFeed::new(), filters, http)?;
                ManagedFeed::NswRuralFire(FeedManager::new(source, handler).with_name(&feed.name))
            }
        };

        info!("Configured feed {}", managed.describe());
        Ok(managed)
    }

    pub fn name(&self) -> &str {
        match self {
            ManagedFeed::Generic(m) => m.name(),
            ManagedFeed::UsgsEarthquakes(m) => m.name(),
            ManagedFeed::NswRuralFire(m) => m.name(),
        }
    }

    /// Feed description including its URL and filters.
    pub fn describe(&self) -> String {
        match self {
            ManagedFeed::Generic(m) => format!("{} {}", m.name(), m.source()),
            ManagedFeed::UsgsEarthquakes(m) => format!("{} {}", m.name(), m.source()),
            ManagedFeed::NswRuralFire(m) => format!("{} {}", m.name(), m.source()),
        }
    }

    /// Number of entries currently managed.
    pub fn entry_count(&self) -> usize {
        match self {
            ManagedFeed::Generic(m) => m.feed_entries().len(),
            ManagedFeed::UsgsEarthquakes(m) => m.feed_entries().len(),
            ManagedFeed::NswRuralFire(m) => m.feed_entries().len(),
        }
    }

    pub async fn update(&mut self) -> SyncReport {
        match self {
            ManagedFeed::Generic(m) => m.update().await,
            ManagedFeed::UsgsEarthquakes(m) => m.update().await,
            ManagedFeed::NswRuralFire(m) => m.update().await,
        }
    }
}

/// Runs one cycle on every feed concurrently and logs the outcome.
pub async fn poll_round(feeds: &mut [ManagedFeed]) -> PollSummary {
    let results = join_all(feeds.iter_mut().map(|feed| async move {
        let report = feed.update().await;
        let tracked = feed.entry_count();
        (FeedPollResult::from_report(feed.name(), report), tracked)
    }))
    .await;

    let mut summary = PollSummary::new();
    for (result, tracked) in results {
        match &result.error {
            Some(err) => warn!(feed = %result.feed_name, "{}: {}", result.status, err),
            None if result.stats.total() == 0 => {
                debug!(feed = %result.feed_name, "{}: {} tracked", result.status, tracked)
            }
            None => info!(
                feed = %result.feed_name,
                "{}: {} created, {} updated, {} removed, {} tracked",
                result.status,
                result.stats.created,
                result.stats.updated,
                result.stats.removed,
                tracked
            ),
        }
        summary.add(result);
    }

    let totals = summary.totals();
    info!(
        "Poll complete: {} successful, {} failed out of {} feeds ({} created, {} updated, {} removed)",
        summary.successful_count(),
        summary.failed_count(),
        summary.total_feeds(),
        totals.created,
        totals.updated,
        totals.removed
    );
    summary
}

/// Polls every `period` until `shutdown` resolves and returns the number of
/// completed rounds. A round still in flight when `shutdown` fires is dropped.
pub async fn poll_until<F>(feeds: &mut [ManagedFeed], period: Duration, shutdown: F) -> usize
where
    F: Future<Output = ()>,
{
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    tokio::pin!(shutdown);

    let mut rounds = 0;
    loop {
        tokio::select! {
            _ = &mut shutdown => break,
            _ = async {
                ticker.tick().await;
                poll_round(&mut *feeds).await
            } => rounds += 1,
        }
    }
    rounds
}
