//! Abstract storage contract for monitoring aggregates.
//!
//! One aggregate is one consistency unit: the whole document is read and
//! written together, and a write succeeds only when the caller's revision
//! token still matches the stored one. Backends also own the shared
//! monotonic counters (feed sequence, case numbers).

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::ids::MonitoringId;
use crate::monitoring::Monitoring;
use crate::revision::RevisionToken;

/// Errors that can occur during storage operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// No aggregate stored under the id.
    #[error("Monitoring not found: {0}")]
    NotFound(MonitoringId),

    /// The conditional write matched zero rows: the caller's revision is
    /// stale. Re-read, recompute the patch, retry; all outside the store.
    #[error("Revision conflict on monitoring {id}")]
    Conflict {
        /// Aggregate whose revision check failed.
        id: String,
    },

    /// Serialization failed.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Backend error (poisoned lock, I/O, connection).
    #[error("Storage backend error: {0}")]
    Backend(String),
}

/// Storage for monitoring aggregates.
///
/// # Contract
/// - `save` is a single atomic conditional update; there is no partial
///   write and no server-side merge.
/// - Every successful `save` advances the global write sequence, stamps
///   the modification time, computes the successor revision token, and
///   appends the audit-log entry, all in the same write.
pub trait MonitoringStore: Send + Sync {
    /// Get an aggregate by id.
    fn get(&self, id: MonitoringId) -> Result<Monitoring, StorageError>;

    /// Conditionally writes `aggregate`.
    ///
    /// With `insert = false` the write succeeds only if the stored token
    /// equals `expected`; otherwise it fails with [`StorageError::Conflict`].
    /// With `insert = true` a missing id is created, and an existing id is
    /// the tolerated duplicate-create race: the stored aggregate is
    /// returned untouched.
    ///
    /// Returns the stored aggregate with its new token, sequence,
    /// modification time, and appended audit entry.
    fn save(
        &self,
        aggregate: Monitoring,
        expected: &RevisionToken,
        insert: bool,
        author: &str,
    ) -> Result<Monitoring, StorageError>;

    /// Atomically increments and returns the named shared counter.
    ///
    /// Counters are contended but O(1) per call and live outside any
    /// aggregate's revision space.
    fn next_named(&self, counter: &str) -> Result<u64, StorageError>;

    /// Aggregates with sequence strictly greater than `after`, ascending,
    /// at most `limit`.
    fn scan_sequence(&self, after: u64, limit: usize) -> Result<Vec<Monitoring>, StorageError>;

    /// Aggregates modified at or after `since`, ordered by
    /// `(date_modified, id)`, at most `limit`.
    fn scan_modified(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Monitoring>, StorageError>;
}
