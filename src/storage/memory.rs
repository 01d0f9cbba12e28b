//! In-memory storage backend.
//!
//! Thread-safe reference implementation of [`MonitoringStore`], intended
//! for embedded use and tests. All writes funnel through one lock, which
//! makes the compare-and-swap, the sequence bump, the modification stamp,
//! and the audit-log append a single atomic step exactly as the contract
//! requires.

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, RwLock};

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::clock::Clock;
use crate::ids::MonitoringId;
use crate::monitoring::Monitoring;
use crate::revision::{diff, Revision, RevisionToken};
use crate::storage::traits::{MonitoringStore, StorageError};

fn lock_err(context: &'static str) -> StorageError {
    StorageError::Backend(format!("poisoned lock: {context}"))
}

#[derive(Debug, Default)]
struct Inner {
    docs: HashMap<MonitoringId, Monitoring>,
    by_sequence: BTreeMap<u64, MonitoringId>,
    by_modified: BTreeMap<(DateTime<Utc>, MonitoringId), MonitoringId>,
    counters: HashMap<String, u64>,
    sequence: u64,
}

/// In-memory [`MonitoringStore`].
pub struct InMemoryMonitoringStore {
    inner: RwLock<Inner>,
    clock: Arc<dyn Clock>,
}

impl InMemoryMonitoringStore {
    /// Create an empty store stamping times from `clock`.
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            inner: RwLock::new(Inner::default()),
            clock,
        }
    }

    /// Number of stored aggregates.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the store lock is poisoned.
    pub fn len(&self) -> Result<usize, StorageError> {
        Ok(self.inner.read().map_err(|_| lock_err("store"))?.docs.len())
    }

    /// Returns true if nothing is stored.
    ///
    /// # Errors
    ///
    /// Returns a backend error if the store lock is poisoned.
    pub fn is_empty(&self) -> Result<bool, StorageError> {
        Ok(self.len()? == 0)
    }
}

impl MonitoringStore for InMemoryMonitoringStore {
    fn get(&self, id: MonitoringId) -> Result<Monitoring, StorageError> {
        let inner = self.inner.read().map_err(|_| lock_err("store"))?;
        inner
            .docs
            .get(&id)
            .cloned()
            .ok_or(StorageError::NotFound(id))
    }

    fn save(
        &self,
        mut aggregate: Monitoring,
        expected: &RevisionToken,
        insert: bool,
        author: &str,
    ) -> Result<Monitoring, StorageError> {
        let mut inner = self.inner.write().map_err(|_| lock_err("store"))?;
        let id = aggregate.id;

        let previous = match inner.docs.get(&id) {
            Some(existing) => {
                if insert {
                    // Tolerated duplicate-create race: first writer wins,
                    // the loser observes the stored aggregate.
                    return Ok(existing.clone());
                }
                if existing.rev != *expected {
                    return Err(StorageError::Conflict { id: id.to_string() });
                }
                Some(existing.clone())
            }
            None => {
                if !insert {
                    return Err(StorageError::Conflict { id: id.to_string() });
                }
                aggregate.rev = RevisionToken::initial();
                None
            }
        };

        let now = self.clock.now();
        inner.sequence += 1;
        aggregate.sequence = inner.sequence;
        aggregate.date_modified = now;

        // Token over the new body (still carrying the predecessor token),
        // then the diff over the stamped state so the log reflects exactly
        // what a reader of this revision observes.
        let body = serde_json::to_vec(&aggregate.audited_view())
            .map_err(|e| StorageError::Serialization(e.to_string()))?;
        let new_token = aggregate.rev.next(&body);
        aggregate.rev = new_token.clone();

        let old_view = previous.as_ref().map_or_else(
            || serde_json::Value::Object(serde_json::Map::new()),
            Monitoring::audited_view,
        );
        let changes = diff(&old_view, &aggregate.audited_view());
        aggregate.revisions.push(Revision {
            author: author.to_string(),
            date: now,
            rev: new_token,
            changes,
        });

        if let Some(old) = &previous {
            inner.by_sequence.remove(&old.sequence);
            inner.by_modified.remove(&(old.date_modified, id));
        }
        let sequence = aggregate.sequence;
        inner.by_sequence.insert(sequence, id);
        inner.by_modified.insert((now, id), id);
        inner.docs.insert(id, aggregate.clone());

        Ok(aggregate)
    }

    fn next_named(&self, counter: &str) -> Result<u64, StorageError> {
        let mut inner = self.inner.write().map_err(|_| lock_err("counters"))?;
        let slot = inner.counters.entry(counter.to_string()).or_insert(0);
        *slot += 1;
        Ok(*slot)
    }

    fn scan_sequence(&self, after: u64, limit: usize) -> Result<Vec<Monitoring>, StorageError> {
        let inner = self.inner.read().map_err(|_| lock_err("store"))?;
        Ok(inner
            .by_sequence
            .range(after + 1..)
            .take(limit)
            .filter_map(|(_, id)| inner.docs.get(id).cloned())
            .collect())
    }

    fn scan_modified(
        &self,
        since: DateTime<Utc>,
        limit: usize,
    ) -> Result<Vec<Monitoring>, StorageError> {
        let inner = self.inner.read().map_err(|_| lock_err("store"))?;
        let floor = (since, MonitoringId::from_uuid(Uuid::nil()));
        Ok(inner
            .by_modified
            .range(floor..)
            .take(limit)
            .filter_map(|(_, id)| inner.docs.get(id).cloned())
            .collect())
    }
}
