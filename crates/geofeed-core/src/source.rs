//! Seams between the reconciliation engine and per-source adapters.
//!
//! An adapter is two free-standing capabilities: an [`EntryExtractor`] that
//! maps one decoded feature to a [`FeedEntry`], and a [`TimestampReducer`]
//! that derives the newest timestamp of a filtered entry list. A
//! [`FeedSource`] combines transport, decode, extraction and filtering into
//! a single snapshot producer.

use std::fmt::Debug;
use std::future::Future;

use chrono::{DateTime, Utc};

use crate::config::FilterSettings;
use crate::filter::EntryFilter;
use crate::models::{Coordinate, Feature, FeatureCollection, FeedEntry};
use crate::snapshot::FeedSnapshot;

/// Maps decoded features of one feed dialect to entries.
pub trait EntryExtractor: Send + Sync {
    type Attributes: Clone + Debug + Send + Sync + 'static;

    /// Short dialect name used in logs and `Display` output.
    fn name(&self) -> &'static str;

    /// Document URL for this feed.
    fn url(&self) -> &str;

    /// Feed-level attribution shared by every entry of one document.
    fn feed_attribution(&self, _collection: &FeatureCollection) -> Option<String> {
        None
    }

    /// Builds one entry. Must derive a deterministic `external_id`.
    fn extract(
        &self,
        home: Coordinate,
        feature: &Feature,
        feed_attribution: Option<&str>,
    ) -> FeedEntry<Self::Attributes>;

    /// Domain stages appended after the base filter stages.
    fn domain_filters(
        &self,
        _settings: &FilterSettings,
    ) -> Vec<Box<dyn EntryFilter<Self::Attributes>>> {
        Vec::new()
    }
}

/// Derives the newest timestamp of a filtered entry list.
pub trait TimestampReducer<A> {
    fn latest_timestamp(&self, entries: &[FeedEntry<A>]) -> Option<DateTime<Utc>>;
}

/// Maximum of a per-entry timestamp, skipping entries without one.
pub fn latest_by<A, F>(entries: &[FeedEntry<A>], timestamp: F) -> Option<DateTime<Utc>>
where
    F: Fn(&A) -> Option<DateTime<Utc>>,
{
    entries
        .iter()
        .filter_map(|entry| timestamp(&entry.attributes))
        .max()
}

/// Produces one snapshot per call.
///
/// `overrides` replaces the source's configured filter settings field by
/// field for this call only.
pub trait FeedSource {
    type Attributes;

    fn fetch_snapshot(
        &self,
        overrides: Option<&FilterSettings>,
    ) -> impl Future<Output = FeedSnapshot<Self::Attributes>> + Send;
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_latest_by_skips_missing_values() {
        let home = Coordinate::new(0.0, 0.0);
        let first = Utc.with_ymd_and_hms(2019, 7, 4, 8, 0, 0).unwrap();
        let second = Utc.with_ymd_and_hms(2019, 7, 3, 8, 0, 0).unwrap();
        let entries = vec![
            FeedEntry::new(home, "a", None, Some(second)),
            FeedEntry::new(home, "b", None, None),
            FeedEntry::new(home, "c", None, Some(first)),
        ];

        assert_eq!(latest_by(&entries, |ts| *ts), Some(first));
        assert_eq!(latest_by(&entries[1..2], |ts| *ts), None);
        assert_eq!(latest_by::<Option<DateTime<Utc>>, _>(&[], |ts| *ts), None);
    }
}
