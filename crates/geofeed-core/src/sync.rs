//! Reconciliation statistics and multi-feed poll summaries.
//!
//! Pure bookkeeping types, decoupled from the engine itself and from CLI
//! orchestration.

use crate::snapshot::UpdateStatus;

/// Lifecycle transition applied to one external id during a cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// First time this id is seen - creation callback fired
    Created,
    /// Id was already managed and is still present - update callback fired
    Updated,
    /// Id is no longer present (or the fetch failed) - removal callback fired
    Removed,
}

/// Counters for one reconciliation cycle.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SyncStats {
    pub created: usize,
    pub updated: usize,
    pub removed: usize,
}

impl SyncStats {
    /// Creates a new empty stats tracker.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records an outcome, incrementing the appropriate counter.
    pub fn record(&mut self, outcome: SyncOutcome) {
        match outcome {
            SyncOutcome::Created => self.created += 1,
            SyncOutcome::Updated => self.updated += 1,
            SyncOutcome::Removed => self.removed += 1,
        }
    }

    /// Returns the total number of callbacks fired.
    pub fn total(&self) -> usize {
        self.created + self.updated + self.removed
    }
}

/// What one `update()` call did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncReport {
    pub status: UpdateStatus,
    pub stats: SyncStats,
    /// Cause of an `Error` snapshot, rendered for display.
    pub error: Option<String>,
}

impl SyncReport {
    pub fn new(status: UpdateStatus, stats: SyncStats) -> Self {
        Self {
            status,
            stats,
            error: None,
        }
    }

    pub fn failed(stats: SyncStats, error: String) -> Self {
        Self {
            status: UpdateStatus::Error,
            stats,
            error: Some(error),
        }
    }

    pub fn is_success(&self) -> bool {
        self.status != UpdateStatus::Error
    }
}

// =============================================================================
// Multi-feed poll types
// =============================================================================

/// Result of polling a single feed in one round.
#[derive(Debug, Clone)]
pub struct FeedPollResult {
    /// Feed name identifier.
    pub feed_name: String,
    /// Status of the snapshot the feed produced.
    pub status: UpdateStatus,
    /// Reconciliation statistics for this feed.
    pub stats: SyncStats,
    /// Error message if the fetch failed, None otherwise.
    pub error: Option<String>,
}

impl FeedPollResult {
    pub fn from_report(name: impl Into<String>, report: SyncReport) -> Self {
        Self {
            feed_name: name.into(),
            status: report.status,
            stats: report.stats,
            error: report.error,
        }
    }

    /// Returns true if the feed produced `Ok` or `OkNoData`.
    pub fn is_success(&self) -> bool {
        self.status != UpdateStatus::Error
    }
}

/// Aggregated results from one round over several feeds.
#[derive(Debug, Clone, Default)]
pub struct PollSummary {
    pub results: Vec<FeedPollResult>,
}

impl PollSummary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, result: FeedPollResult) {
        self.results.push(result);
    }

    pub fn successful_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_success()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.results.iter().filter(|r| !r.is_success()).count()
    }

    /// Sum of per-feed stats.
    pub fn totals(&self) -> SyncStats {
        self.results.iter().fold(SyncStats::new(), |acc, r| SyncStats {
            created: acc.created + r.stats.created,
            updated: acc.updated + r.stats.updated,
            removed: acc.removed + r.stats.removed,
        })
    }

    pub fn total_feeds(&self) -> usize {
        self.results.len()
    }
}
