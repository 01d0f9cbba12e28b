//! Push notification stream layered over the feed.
//!
//! Polling the sequence feed is the reliable synchronization path; the
//! change stream is the low-latency complement. Subscribers get a bounded
//! channel of commit events for one partition; a subscriber that stops
//! draining is dropped rather than ever blocking the write path.

use std::sync::RwLock;
use std::time::Duration;

use chrono::{DateTime, Utc};
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use log::warn;
use serde::{Deserialize, Serialize};

use crate::ids::MonitoringId;
use crate::monitoring::{Monitoring, MonitoringStatus};

use super::Partition;

/// Event emitted after a write commits.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChangeEvent {
    /// Aggregate that changed.
    pub id: MonitoringId,
    /// Global write sequence of the commit.
    pub sequence: u64,
    /// Status after the commit.
    pub status: MonitoringStatus,
    /// Modification stamp of the commit.
    pub date_modified: DateTime<Utc>,
}

impl From<&Monitoring> for ChangeEvent {
    fn from(aggregate: &Monitoring) -> Self {
        Self {
            id: aggregate.id,
            sequence: aggregate.sequence,
            status: aggregate.status,
            date_modified: aggregate.date_modified,
        }
    }
}

struct Subscriber {
    partition: Partition,
    tx: Sender<ChangeEvent>,
}

/// Registry of change-stream subscribers.
pub struct ChangeHub {
    subscribers: RwLock<Vec<Subscriber>>,
    buffer: usize,
}

impl ChangeHub {
    /// Create a hub handing out channels of `buffer` capacity.
    #[must_use]
    pub fn new(buffer: usize) -> Self {
        Self {
            subscribers: RwLock::new(Vec::new()),
            buffer: buffer.max(1),
        }
    }

    /// Registers a subscriber for `partition`.
    #[must_use]
    pub fn subscribe(&self, partition: Partition) -> ChangeStream {
        let (tx, rx) = bounded(self.buffer);
        let mut guard = self
            .subscribers
            .write()
            .expect("change hub lock poisoned");
        guard.push(Subscriber { partition, tx });
        ChangeStream { rx }
    }

    /// Fans a committed write out to matching subscribers.
    ///
    /// Partition membership is evaluated against the just-written state.
    /// Full or disconnected subscribers are dropped.
    pub fn publish(&self, aggregate: &Monitoring) {
        let mut guard = self
            .subscribers
            .write()
            .expect("change hub lock poisoned");

        guard.retain(|subscriber| {
            if !subscriber.partition.contains(aggregate) {
                return true;
            }
            match subscriber.tx.try_send(ChangeEvent::from(aggregate)) {
                Ok(()) => true,
                Err(TrySendError::Full(_)) => {
                    warn!(
                        "dropping lagging change-stream subscriber on partition {}",
                        subscriber.partition
                    );
                    false
                }
                Err(TrySendError::Disconnected(_)) => false,
            }
        });
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.subscribers
            .read()
            .expect("change hub lock poisoned")
            .len()
    }
}

/// A subscription stream of commit events.
///
/// Dropping the stream disconnects it; the hub prunes the registration on
/// the next publish.
#[derive(Debug)]
pub struct ChangeStream {
    rx: Receiver<ChangeEvent>,
}

impl ChangeStream {
    /// Receive the next event (blocking).
    ///
    /// Returns `None` once the hub is gone.
    #[must_use]
    pub fn recv(&self) -> Option<ChangeEvent> {
        self.rx.recv().ok()
    }

    /// Receive the next event with a timeout.
    ///
    /// Returns `None` on timeout or disconnect.
    #[must_use]
    pub fn recv_timeout(&self, timeout: Duration) -> Option<ChangeEvent> {
        match self.rx.recv_timeout(timeout) {
            Ok(event) => Some(event),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Non-blocking poll.
    #[must_use]
    pub fn try_recv(&self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }
}
