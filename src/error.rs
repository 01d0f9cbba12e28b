//! Error types for the oversight core.
//!
//! All errors are strongly typed using thiserror. Every rejection is
//! recovered at the operation boundary and can be rendered as a structured
//! entry list (location, field, message); nothing is logged-and-swallowed.

use thiserror::Error;

use crate::monitoring::MonitoringStatus;
use crate::storage::StorageError;

/// Validation errors raised while checking an incoming payload or a
/// candidate aggregate. Each variant addresses a concrete field path.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Required field '{field}' is missing")]
    MissingField {
        field: String,
    },

    #[error("Field '{field}' cannot be empty")]
    EmptyField {
        field: String,
    },

    #[error("Unknown field '{field}'")]
    UnknownField {
        field: String,
    },

    #[error("Field '{field}' references unknown party '{reference}'")]
    UnresolvedPartyReference {
        field: String,
        reference: String,
    },

    #[error("Field '{field}' references unknown post '{reference}'")]
    UnresolvedPostReference {
        field: String,
        reference: String,
    },

    #[error("Post '{reference}' already has a reply")]
    DuplicateReply {
        field: String,
        reference: String,
    },

    #[error("Post author cannot reply to their own post '{reference}'")]
    SelfReply {
        field: String,
        reference: String,
    },

    #[error("Post '{reference}' is itself a reply; reply chains are limited to depth 1")]
    NestedReply {
        field: String,
        reference: String,
    },

    #[error("Field '{field}' is published and can no longer be modified")]
    PublishedImmutable {
        field: String,
    },

    #[error("Invalid content hash '{value}': expected 'md5:' followed by 32 hex digits")]
    InvalidContentHash {
        field: String,
        value: String,
    },

    #[error("Document '{id}' content identity (hash/url) cannot change; add a new document instead")]
    DocumentIdentityChanged {
        field: String,
        id: String,
    },

    #[error("Invalid case number '{value}'")]
    InvalidCaseNumber {
        value: String,
    },

    #[error("Invalid period: start {start} must precede end {end}")]
    InvalidPeriod {
        start: chrono::DateTime<chrono::Utc>,
        end: chrono::DateTime<chrono::Utc>,
    },

    #[error("Field '{field}' is malformed: {reason}")]
    Malformed {
        field: String,
        reason: String,
    },
}

impl ValidationError {
    /// The field path this error addresses, for structured reporting.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::MissingField { field }
            | Self::EmptyField { field }
            | Self::UnknownField { field }
            | Self::UnresolvedPartyReference { field, .. }
            | Self::UnresolvedPostReference { field, .. }
            | Self::DuplicateReply { field, .. }
            | Self::SelfReply { field, .. }
            | Self::NestedReply { field, .. }
            | Self::PublishedImmutable { field }
            | Self::InvalidContentHash { field, .. }
            | Self::DocumentIdentityChanged { field, .. }
            | Self::Malformed { field, .. } => field,
            Self::InvalidCaseNumber { .. } => "caseNumber",
            Self::InvalidPeriod { .. } => "period",
        }
    }
}

/// Illegal or guarded status changes. The stored status is never touched
/// when one of these is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("Status cannot change from '{from}' to '{to}'")]
    Illegal {
        from: MonitoringStatus,
        to: MonitoringStatus,
    },

    #[error("Cannot move from '{from}' to '{to}': {requirement}")]
    GuardNotMet {
        from: MonitoringStatus,
        to: MonitoringStatus,
        requirement: String,
    },
}

/// Write-whitelist and role-permission violations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    #[error("Field '{field}' cannot be updated in status '{status}'")]
    FieldNotWritable {
        field: String,
        status: MonitoringStatus,
    },

    #[error("Role '{role}' is not permitted to {operation}")]
    RoleDenied {
        role: String,
        operation: String,
    },
}

impl AccessError {
    /// The field path this error addresses, for structured reporting.
    #[must_use]
    pub fn field(&self) -> &str {
        match self {
            Self::FieldNotWritable { field, .. } => field,
            Self::RoleDenied { .. } => "role",
        }
    }
}

/// One structured boundary entry: where the problem is, which field, and
/// a human-readable message.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ErrorEntry {
    /// Coarse location of the offending input ("body", "url", "access").
    pub location: &'static str,
    /// Field path within the location.
    pub field: String,
    /// Human-readable description.
    pub message: String,
}

/// Top-level error type for the oversight core.
#[derive(Debug, Error)]
pub enum OversightError {
    /// One or more payload/business-rule violations; rejected before any write.
    #[error("Validation failed with {} error(s)", .0.len())]
    Validation(Vec<ValidationError>),

    /// Illegal status change; rejected, no state change.
    #[error("Transition error: {0}")]
    Transition(#[from] TransitionError),

    /// Whitelist or role-permission violation; rejected before any write.
    #[error("Access denied with {} error(s)", .0.len())]
    Access(Vec<AccessError>),

    /// Storage-layer failure, including the retryable stale-revision conflict.
    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    /// Invariant breakage inside the core itself.
    #[error("Internal error: {message}")]
    Internal {
        message: String,
    },
}

impl From<ValidationError> for OversightError {
    fn from(err: ValidationError) -> Self {
        Self::Validation(vec![err])
    }
}

impl From<AccessError> for OversightError {
    fn from(err: AccessError) -> Self {
        Self::Access(vec![err])
    }
}

impl OversightError {
    /// Creates an internal error.
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Returns true if this is a validation error.
    #[must_use]
    pub const fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }

    /// Returns true if this is a transition error.
    #[must_use]
    pub const fn is_transition(&self) -> bool {
        matches!(self, Self::Transition(_))
    }

    /// Returns true if this is an access error.
    #[must_use]
    pub const fn is_access(&self) -> bool {
        matches!(self, Self::Access(_))
    }

    /// Returns true if this is a stale-revision conflict.
    #[must_use]
    pub const fn is_conflict(&self) -> bool {
        matches!(self, Self::Storage(StorageError::Conflict { .. }))
    }

    /// Returns true if this is an unknown-id lookup failure.
    #[must_use]
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::Storage(StorageError::NotFound(_)))
    }

    /// Returns true if retrying the same operation may succeed.
    ///
    /// Only the stale-revision conflict is retryable, and the retry is a
    /// caller responsibility: re-read, recompute the patch, resubmit. The
    /// core never retries internally.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        self.is_conflict()
    }

    /// Flattens this error into structured boundary entries.
    #[must_use]
    pub fn entries(&self) -> Vec<ErrorEntry> {
        match self {
            Self::Validation(errors) => errors
                .iter()
                .map(|e| ErrorEntry {
                    location: "body",
                    field: e.field().to_string(),
                    message: e.to_string(),
                })
                .collect(),
            Self::Access(errors) => errors
                .iter()
                .map(|e| ErrorEntry {
                    location: "access",
                    field: e.field().to_string(),
                    message: e.to_string(),
                })
                .collect(),
            Self::Transition(e) => vec![ErrorEntry {
                location: "body",
                field: "status".to_string(),
                message: e.to_string(),
            }],
            Self::Storage(e) => vec![ErrorEntry {
                location: "url",
                field: "id".to_string(),
                message: e.to_string(),
            }],
            Self::Internal { message } => vec![ErrorEntry {
                location: "body",
                field: String::new(),
                message: message.clone(),
            }],
        }
    }
}

/// Result type alias for oversight operations.
pub type OversightResult<T> = Result<T, OversightError>;
