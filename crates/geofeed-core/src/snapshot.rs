//! Outcome of one fetch-and-parse cycle.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::FeedError;
use crate::models::FeedEntry;

/// Coarse status of a snapshot, used for logging and reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UpdateStatus {
    Ok,
    OkNoData,
    Error,
}

impl fmt::Display for UpdateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            UpdateStatus::Ok => "OK",
            UpdateStatus::OkNoData => "OK_NO_DATA",
            UpdateStatus::Error => "ERROR",
        };
        f.write_str(label)
    }
}

/// Result of one fetch cycle, consumed once by the reconciliation engine.
#[derive(Debug)]
pub enum FeedSnapshot<A> {
    /// Filtered entries, in document order, and the source's newest timestamp.
    Ok {
        entries: Vec<FeedEntry<A>>,
        latest_timestamp: Option<DateTime<Utc>>,
    },
    /// The transport reported nothing new (e.g. HTTP 304).
    OkNoData,
    /// Transport or decode failure. The cause is kept for logging only.
    Error(FeedError),
}

impl<A> FeedSnapshot<A> {
    pub fn ok(entries: Vec<FeedEntry<A>>, latest_timestamp: Option<DateTime<Utc>>) -> Self {
        FeedSnapshot::Ok {
            entries,
            latest_timestamp,
        }
    }

    pub fn status(&self) -> UpdateStatus {
        match self {
            FeedSnapshot::Ok { .. } => UpdateStatus::Ok,
            FeedSnapshot::OkNoData => UpdateStatus::OkNoData,
            FeedSnapshot::Error(_) => UpdateStatus::Error,
        }
    }

    /// Entries of an `Ok` snapshot; empty otherwise.
    pub fn entries(&self) -> &[FeedEntry<A>] {
        match self {
            FeedSnapshot::Ok { entries, .. } => entries,
            _ => &[],
        }
    }

    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            FeedSnapshot::Ok {
                latest_timestamp, ..
            } => *latest_timestamp,
            _ => None,
        }
    }
}

impl<A> From<FeedError> for FeedSnapshot<A> {
    fn from(err: FeedError) -> Self {
        FeedSnapshot::Error(err)
    }
}
