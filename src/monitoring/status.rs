//! Monitoring lifecycle statuses.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a monitoring case.
///
/// A case is born in `draft` and only moves along the pairs enumerated by
/// the transition table; terminal statuses are reachable states, never
/// erasure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MonitoringStatus {
    /// Being prepared by the oversight body; invisible to public feeds.
    Draft,
    /// Actively monitored.
    Active,
    /// Concluded with violations; elimination window open.
    Addressed,
    /// Concluded without violations.
    Declined,
    /// Violations case finished after the elimination window.
    Completed,
    /// No-violations case finished after the elimination window.
    Closed,
    /// Paused by a cancellation while active/addressed/declined.
    Stopped,
    /// Cancelled before activation.
    Cancelled,
}

impl MonitoringStatus {
    /// Stable lowercase name used on the wire and in error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Active => "active",
            Self::Addressed => "addressed",
            Self::Declined => "declined",
            Self::Completed => "completed",
            Self::Closed => "closed",
            Self::Stopped => "stopped",
            Self::Cancelled => "cancelled",
        }
    }

    /// All statuses, for exhaustive table checks.
    #[must_use]
    pub const fn all() -> [Self; 8] {
        [
            Self::Draft,
            Self::Active,
            Self::Addressed,
            Self::Declined,
            Self::Completed,
            Self::Closed,
            Self::Stopped,
            Self::Cancelled,
        ]
    }

    /// Statuses from which no further transition exists.
    #[must_use]
    pub const fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Closed | Self::Cancelled)
    }

    /// Draft and cancelled cases are hidden from the public partitions.
    #[must_use]
    pub const fn is_public(&self) -> bool {
        !matches!(self, Self::Draft | Self::Cancelled)
    }
}

impl fmt::Display for MonitoringStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
