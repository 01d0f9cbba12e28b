//! Identifier newtypes and the human-readable case-number format.
//!
//! Aggregate and sub-object ids are UUID newtypes. Case numbers are the
//! human-facing sequential identifiers (`UA-M-2026-08-08-000123`) drawn
//! from a shared monotonic counter outside any aggregate's revision space.

use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::ValidationError;

/// Unique identifier for a monitoring case.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MonitoringId(Uuid);

/// Unique identifier for a dialogue post.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PostId(Uuid);

/// Unique identifier for a party in the aggregate's party arena.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PartyId(Uuid);

/// Unique identifier for a document.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DocumentId(Uuid);

macro_rules! uuid_id {
    ($name:ident) => {
        impl $name {
            /// Create a new random id.
            #[must_use]
            pub fn new() -> Self {
                Self(Uuid::new_v4())
            }

            /// Wrap an existing UUID.
            #[must_use]
            pub const fn from_uuid(uuid: Uuid) -> Self {
                Self(uuid)
            }

            /// The wrapped UUID.
            #[must_use]
            pub const fn as_uuid(&self) -> Uuid {
                self.0
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                self.0.fmt(f)
            }
        }
    };
}

uuid_id!(MonitoringId);
uuid_id!(PostId);
uuid_id!(PartyId);
uuid_id!(DocumentId);

static CASE_NUMBER_RE: OnceLock<Regex> = OnceLock::new();

fn case_number_re() -> &'static Regex {
    CASE_NUMBER_RE.get_or_init(|| {
        Regex::new(r"^UA-M-\d{4}-\d{2}-\d{2}-\d{6}$").expect("case number regex is valid")
    })
}

/// Formats a case number from the allocation date and a counter value.
///
/// The counter comes from the store's shared named sequence; the date is
/// the allocation day in UTC.
#[must_use]
pub fn format_case_number(date: DateTime<Utc>, counter: u64) -> String {
    format!("UA-M-{}-{counter:06}", date.format("%Y-%m-%d"))
}

/// Validates a case number against the wire format.
///
/// # Errors
///
/// Returns `ValidationError::InvalidCaseNumber` when the value does not
/// match `UA-M-YYYY-MM-DD-NNNNNN`.
pub fn validate_case_number(value: &str) -> Result<(), ValidationError> {
    if case_number_re().is_match(value) {
        Ok(())
    } else {
        Err(ValidationError::InvalidCaseNumber {
            value: value.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_ids_are_unique() {
        assert_ne!(MonitoringId::new(), MonitoringId::new());
        assert_ne!(PostId::new(), PostId::new());
    }

    #[test]
    fn test_id_serde_is_transparent() {
        let id = MonitoringId::new();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, format!("\"{id}\""));
        let back: MonitoringId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_case_number_round_trip() {
        let date = Utc.with_ymd_and_hms(2026, 8, 8, 12, 0, 0).unwrap();
        let number = format_case_number(date, 123);
        assert_eq!(number, "UA-M-2026-08-08-000123");
        validate_case_number(&number).unwrap();
    }

    #[test]
    fn test_case_number_rejects_malformed() {
        assert!(validate_case_number("UA-M-2026-8-8-123").is_err());
        assert!(validate_case_number("UA-T-2026-08-08-000123").is_err());
        assert!(validate_case_number("").is_err());
    }
}
