//! Feed reconciliation engine.
//!
//! [`FeedManager`] compares the entries it manages with each new snapshot
//! and tells the hosting application, through an [`EntityHandler`], which
//! external ids were removed, updated and created - in that order.
//!
//! Every method that mutates state takes `&mut self`: one manager must not be
//! updated concurrently or reentrantly. Independent managers share nothing.

use std::collections::{BTreeSet, HashMap};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::config::FilterSettings;
use crate::models::FeedEntry;
use crate::snapshot::FeedSnapshot;
use crate::source::FeedSource;
use crate::sync::{SyncOutcome, SyncReport, SyncStats};

/// Entry lifecycle notifications.
///
/// The manager calls each method at most once per id per cycle; handlers do
/// not need to deduplicate.
pub trait EntityHandler {
    fn on_create(&mut self, external_id: &str);
    fn on_update(&mut self, external_id: &str);
    fn on_remove(&mut self, external_id: &str);
}

impl<H: EntityHandler + ?Sized> EntityHandler for Box<H> {
    fn on_create(&mut self, external_id: &str) {
        (**self).on_create(external_id);
    }

    fn on_update(&mut self, external_id: &str) {
        (**self).on_update(external_id);
    }

    fn on_remove(&mut self, external_id: &str) {
        (**self).on_remove(external_id);
    }
}

/// [`EntityHandler`] backed by three closures.
///
/// # Examples
///
/// ```
/// use geofeed_core::manager::{CallbackHandler, EntityHandler};
///
/// let mut created = Vec::new();
/// let mut handler = CallbackHandler::new(
///     |id: &str| created.push(id.to_string()),
///     |_: &str| {},
///     |_: &str| {},
/// );
/// handler.on_create("us7000abcd");
/// drop(handler);
/// assert_eq!(created, vec!["us7000abcd"]);
/// ```
pub struct CallbackHandler<C, U, R> {
    on_create: C,
    on_update: U,
    on_remove: R,
}

impl<C, U, R> CallbackHandler<C, U, R>
where
    C: FnMut(&str),
    U: FnMut(&str),
    R: FnMut(&str),
{
    pub fn new(on_create: C, on_update: U, on_remove: R) -> Self {
        Self {
            on_create,
            on_update,
            on_remove,
        }
    }
}

impl<C, U, R> EntityHandler for CallbackHandler<C, U, R>
where
    C: FnMut(&str),
    U: FnMut(&str),
    R: FnMut(&str),
{
    fn on_create(&mut self, external_id: &str) {
        (self.on_create)(external_id);
    }

    fn on_update(&mut self, external_id: &str) {
        (self.on_update)(external_id);
    }

    fn on_remove(&mut self, external_id: &str) {
        (self.on_remove)(external_id);
    }
}

/// Keeps the entries of one feed and drives lifecycle callbacks.
///
/// The entry map and the managed id set always hold the same keys after a
/// cycle completes.
pub struct FeedManager<S: FeedSource, H> {
    name: String,
    source: S,
    handler: H,
    feed_entries: HashMap<String, FeedEntry<S::Attributes>>,
    managed_external_ids: BTreeSet<String>,
    last_update: Option<DateTime<Utc>>,
    last_timestamp: Option<DateTime<Utc>>,
}

impl<S, H> FeedManager<S, H>
where
    S: FeedSource,
    H: EntityHandler,
{
    pub fn new(source: S, handler: H) -> Self {
        Self {
            name: "feed".to_string(),
            source,
            handler,
            feed_entries: HashMap::new(),
            managed_external_ids: BTreeSet::new(),
            last_update: None,
            last_timestamp: None,
        }
    }

    /// Label used in log lines.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Fetches a snapshot from the source and reconciles against it.
    pub async fn update(&mut self) -> SyncReport {
        let snapshot = self.source.fetch_snapshot(None).await;
        self.apply(snapshot)
    }

    /// Like [`update`](Self::update), with per-call filter overrides.
    pub async fn update_with_overrides(&mut self, overrides: &FilterSettings) -> SyncReport {
        let snapshot = self.source.fetch_snapshot(Some(overrides)).await;
        self.apply(snapshot)
    }

    /// Reconciles the managed state against one snapshot.
    ///
    /// - `Ok`: the entry map is replaced, then ids that disappeared are
    ///   removed, ids still present are updated, and new ids are created.
    /// - `OkNoData`: nothing changes and no callback fires.
    /// - `Error`: every managed id is removed and all state is cleared;
    ///   the last successful update time is kept.
    pub fn apply(&mut self, snapshot: FeedSnapshot<S::Attributes>) -> SyncReport {
        let status = snapshot.status();
        let mut stats = SyncStats::new();

        match snapshot {
            FeedSnapshot::Ok {
                entries,
                latest_timestamp,
            } => {
                debug!(feed = %self.name, "Data retrieved: {} entries", entries.len());
                self.feed_entries = self.index_entries(entries);
                self.last_update = Some(Utc::now());
                self.last_timestamp = latest_timestamp;

                let feed_external_ids: BTreeSet<String> =
                    self.feed_entries.keys().cloned().collect();
                let remove_external_ids: Vec<String> = self
                    .managed_external_ids
                    .difference(&feed_external_ids)
                    .cloned()
                    .collect();
                let update_external_ids: Vec<String> = self
                    .managed_external_ids
                    .intersection(&feed_external_ids)
                    .cloned()
                    .collect();
                let create_external_ids: Vec<String> = feed_external_ids
                    .difference(&self.managed_external_ids)
                    .cloned()
                    .collect();

                self.remove_entities(remove_external_ids, &mut stats);
                self.update_entities(&update_external_ids, &mut stats);
                self.generate_new_entities(create_external_ids, &mut stats);

                info!(
                    feed = %self.name,
                    "Update complete: {} created, {} updated, {} removed",
                    stats.created, stats.updated, stats.removed
                );
                SyncReport::new(status, stats)
            }
            FeedSnapshot::OkNoData => {
                debug!(feed = %self.name, "Update successful, but no data received");
                SyncReport::new(status, stats)
            }
            FeedSnapshot::Error(err) => {
                warn!(feed = %self.name, "Update not successful, no data received: {}", err);
                let remove_external_ids: Vec<String> =
                    self.managed_external_ids.iter().cloned().collect();
                self.remove_entities(remove_external_ids, &mut stats);
                self.feed_entries.clear();
                self.managed_external_ids.clear();
                SyncReport::failed(stats, err.to_string())
            }
        }
    }

    /// Builds the id lookup. A later entry with an already seen id replaces
    /// the earlier one.
    fn index_entries(
        &self,
        entries: Vec<FeedEntry<S::Attributes>>,
    ) -> HashMap<String, FeedEntry<S::Attributes>> {
        let mut indexed = HashMap::with_capacity(entries.len());
        for entry in entries {
            let external_id = entry.external_id.clone();
            if let Some(replaced) = indexed.insert(external_id, entry) {
                warn!(
                    feed = %self.name,
                    external_id = %replaced.external_id,
                    "Duplicate external id in snapshot, keeping the later entry"
                );
            }
        }
        indexed
    }

    fn generate_new_entities(&mut self, external_ids: Vec<String>, stats: &mut SyncStats) {
        for external_id in external_ids {
            self.handler.on_create(&external_id);
            debug!(feed = %self.name, "New entity added {}", external_id);
            self.managed_external_ids.insert(external_id);
            stats.record(SyncOutcome::Created);
        }
    }

    fn update_entities(&mut self, external_ids: &[String], stats: &mut SyncStats) {
        for external_id in external_ids {
            debug!(feed = %self.name, "Existing entity found {}", external_id);
            self.handler.on_update(external_id);
            stats.record(SyncOutcome::Updated);
        }
    }

    fn remove_entities(&mut self, external_ids: Vec<String>, stats: &mut SyncStats) {
        for external_id in external_ids {
            debug!(feed = %self.name, "Entity not current anymore {}", external_id);
            self.handler.on_remove(&external_id);
            self.managed_external_ids.remove(&external_id);
            stats.record(SyncOutcome::Removed);
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Current entries by external id.
    pub fn feed_entries(&self) -> &HashMap<String, FeedEntry<S::Attributes>> {
        &self.feed_entries
    }

    pub fn entry(&self, external_id: &str) -> Option<&FeedEntry<S::Attributes>> {
        self.feed_entries.get(external_id)
    }

    /// Ids for which a creation callback fired and no removal since.
    pub fn managed_external_ids(&self) -> &BTreeSet<String> {
        &self.managed_external_ids
    }

    /// Time of the last `Ok` snapshot.
    pub fn last_update(&self) -> Option<DateTime<Utc>> {
        self.last_update
    }

    /// Newest entry timestamp of the last `Ok` snapshot, as derived by the source.
    pub fn last_timestamp(&self) -> Option<DateTime<Utc>> {
        self.last_timestamp
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn handler(&self) -> &H {
        &self.handler
    }

    pub fn handler_mut(&mut self) -> &mut H {
        &mut self.handler
    }
}
