//! Change-feed publication.
//!
//! Feeds serve cursor-based, partitioned, ordered streams of aggregate
//! summaries built on the store's sequence and timestamp indexes. The
//! sequence feed is the synchronization primitive: strictly ascending,
//! exactly-once per document per write. The timestamp feed trades that
//! for human-friendly ordering and may repeat tied timestamps.

mod watch;

pub use watch::{ChangeEvent, ChangeHub, ChangeStream};

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::MonitoringId;
use crate::monitoring::{Monitoring, MonitoringStatus};
use crate::storage::{MonitoringStore, StorageError};

/// How many raw rows one filtered page pass scans at a time.
const SCAN_BATCH: usize = 256;

/// A named, independently cursored, filtered view over aggregates.
///
/// Membership is recomputed from the aggregate's current fields on every
/// read; nothing is cached on the aggregate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Partition {
    /// Production cases, hidden drafts/cancellations excluded.
    Real,
    /// Sandbox cases only.
    Test,
    /// Real and test together.
    All,
    /// Privileged: real including draft/cancelled cases.
    RealWithDraft,
    /// Privileged: test including draft/cancelled cases.
    TestWithDraft,
    /// Privileged: everything.
    AllWithDraft,
}

impl Partition {
    /// Stable kebab-case name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Real => "real",
            Self::Test => "test",
            Self::All => "all",
            Self::RealWithDraft => "real-with-draft",
            Self::TestWithDraft => "test-with-draft",
            Self::AllWithDraft => "all-with-draft",
        }
    }

    /// Draft/cancelled visibility of this partition.
    #[must_use]
    pub const fn includes_hidden(&self) -> bool {
        matches!(
            self,
            Self::RealWithDraft | Self::TestWithDraft | Self::AllWithDraft
        )
    }

    /// Returns true if `aggregate` currently belongs to this partition.
    #[must_use]
    pub fn contains(&self, aggregate: &Monitoring) -> bool {
        let visible = self.includes_hidden() || aggregate.status.is_public();
        let mode_matches = match self {
            Self::Real | Self::RealWithDraft => !aggregate.is_test,
            Self::Test | Self::TestWithDraft => aggregate.is_test,
            Self::All | Self::AllWithDraft => true,
        };
        visible && mode_matches
    }
}

impl fmt::Display for Partition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cursor into one partition's feed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", content = "value", rename_all = "snake_case")]
pub enum FeedCursor {
    /// Last-seen global write sequence.
    Sequence(u64),
    /// Last-seen modification timestamp.
    Timestamp(DateTime<Utc>),
}

/// Which feed ordering to serve.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedMode {
    /// Gap-free, exactly-once synchronization feed.
    Sequence,
    /// Dashboard feed ordered by modification time; ties may repeat.
    Timestamp,
}

/// Feed line item: enough to decide whether to fetch the full aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringSummary {
    /// Aggregate id.
    pub id: MonitoringId,
    /// Human-readable case number.
    pub case_number: String,
    /// The monitored tender.
    pub tender_id: String,
    /// Current status.
    pub status: MonitoringStatus,
    /// Last write instant.
    pub date_modified: DateTime<Utc>,
    /// Global write sequence of the last write.
    pub sequence: u64,
}

impl From<&Monitoring> for MonitoringSummary {
    fn from(aggregate: &Monitoring) -> Self {
        Self {
            id: aggregate.id,
            case_number: aggregate.case_number.clone(),
            tender_id: aggregate.tender_id.clone(),
            status: aggregate.status,
            date_modified: aggregate.date_modified,
            sequence: aggregate.sequence,
        }
    }
}

/// One page of a feed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedPage {
    /// Matching summaries in cursor order.
    pub items: Vec<MonitoringSummary>,
    /// Cursor to resume from; echoes the request cursor when no new
    /// items matched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub next_cursor: Option<FeedCursor>,
}

/// Serves feed pages over a store.
pub struct FeedPublisher {
    store: Arc<dyn MonitoringStore>,
    max_limit: usize,
}

impl FeedPublisher {
    /// Create a publisher with a page-size ceiling.
    #[must_use]
    pub fn new(store: Arc<dyn MonitoringStore>, max_limit: usize) -> Self {
        Self { store, max_limit }
    }

    /// Serves one page of `partition` in the requested mode.
    ///
    /// # Errors
    ///
    /// Propagates [`StorageError`] from the underlying scans.
    pub fn page(
        &self,
        partition: Partition,
        mode: FeedMode,
        cursor: Option<FeedCursor>,
        limit: usize,
    ) -> Result<FeedPage, StorageError> {
        let limit = limit.clamp(1, self.max_limit);
        match mode {
            FeedMode::Sequence => self.sequence_page(partition, cursor, limit),
            FeedMode::Timestamp => self.timestamp_page(partition, cursor, limit),
        }
    }

    fn sequence_page(
        &self,
        partition: Partition,
        cursor: Option<FeedCursor>,
        limit: usize,
    ) -> Result<FeedPage, StorageError> {
        let mut after = match cursor {
            Some(FeedCursor::Sequence(seq)) => seq,
            Some(FeedCursor::Timestamp(_)) | None => 0,
        };

        let mut items = Vec::with_capacity(limit);
        loop {
            let batch = self.store.scan_sequence(after, SCAN_BATCH)?;
            if batch.is_empty() {
                break;
            }
            for aggregate in &batch {
                after = aggregate.sequence;
                if partition.contains(aggregate) {
                    items.push(MonitoringSummary::from(aggregate));
                    if items.len() == limit {
                        break;
                    }
                }
            }
            if items.len() == limit {
                break;
            }
        }

        let next_cursor = items
            .last()
            .map(|item| FeedCursor::Sequence(item.sequence))
            .or(cursor);
        Ok(FeedPage { items, next_cursor })
    }

    fn timestamp_page(
        &self,
        partition: Partition,
        cursor: Option<FeedCursor>,
        limit: usize,
    ) -> Result<FeedPage, StorageError> {
        let since = match cursor {
            Some(FeedCursor::Timestamp(ts)) => ts,
            Some(FeedCursor::Sequence(_)) | None => DateTime::UNIX_EPOCH,
        };

        let mut items = Vec::with_capacity(limit);
        let mut scanned = 0usize;
        loop {
            // `scan_modified` always restarts at `since` (ties included),
            // so each pass widens the scan and skips the inspected prefix.
            let batch = self.store.scan_modified(since, scanned + SCAN_BATCH)?;
            if batch.len() <= scanned {
                break;
            }
            for aggregate in &batch[scanned..] {
                scanned += 1;
                if partition.contains(aggregate) {
                    items.push(MonitoringSummary::from(aggregate));
                    if items.len() == limit {
                        break;
                    }
                }
            }
            if items.len() == limit {
                break;
            }
        }

        let next_cursor = items
            .last()
            .map(|item| FeedCursor::Timestamp(item.date_modified))
            .or(cursor);
        Ok(FeedPage { items, next_cursor })
    }
}
