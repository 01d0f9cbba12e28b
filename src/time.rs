//! Temporal types for lifecycle periods.
//!
//! A monitoring case carries two derived periods: the monitoring period
//! (stamped on activation) and the elimination period (stamped when a
//! conclusion is published). Both are closed `[start, end]` windows whose
//! end may be pushed out while a case is paused.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;

/// A closed time window `[start, end]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Period {
    /// Start of the window (inclusive).
    pub start_date: DateTime<Utc>,

    /// End of the window (inclusive).
    pub end_date: DateTime<Utc>,
}

impl Period {
    /// Creates a period from two timestamps.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidPeriod` if `start >= end`.
    pub fn new(start_date: DateTime<Utc>, end_date: DateTime<Utc>) -> Result<Self, ValidationError> {
        if start_date >= end_date {
            return Err(ValidationError::InvalidPeriod {
                start: start_date,
                end: end_date,
            });
        }
        Ok(Self {
            start_date,
            end_date,
        })
    }

    /// Returns true if the window contains the given instant.
    #[must_use]
    pub fn contains(&self, at: DateTime<Utc>) -> bool {
        at >= self.start_date && at <= self.end_date
    }

    /// Returns true if the window ended strictly before the given instant.
    #[must_use]
    pub fn has_ended_by(&self, at: DateTime<Utc>) -> bool {
        at > self.end_date
    }

    /// Pushes the end of the window out by `pause`.
    ///
    /// Used when a stopped case resumes: the remaining duration is
    /// preserved by extending the end with the paused interval.
    pub fn extend_by(&mut self, pause: Duration) {
        self.end_date += pause;
    }

    /// The total window duration.
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.end_date - self.start_date
    }
}

impl std::fmt::Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{} → {}]", self.start_date, self.end_date)
    }
}
