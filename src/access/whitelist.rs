//! Per-(status, role) write whitelist.
//!
//! The whitelist is a static pure table: which top-level fields an
//! incoming patch may carry given the aggregate's current status and the
//! caller's role. A patch with any field outside the set never reaches
//! the store; every offending field produces its own error.

use log::warn;

use crate::error::{AccessError, ValidationError};
use crate::identity::Role;
use crate::monitoring::MonitoringStatus;

/// Top-level patchable fields of the aggregate, by wire name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(missing_docs)]
pub enum MonitoringField {
    Status,
    Reasons,
    ProcuringStages,
    Confidential,
    Decision,
    Conclusion,
    Cancellation,
    EliminationReport,
    EliminationResolution,
    Appeal,
    Liabilities,
    Posts,
    Parties,
    Documents,
}

impl MonitoringField {
    /// Wire name of the field.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Status => "status",
            Self::Reasons => "reasons",
            Self::ProcuringStages => "procuringStages",
            Self::Confidential => "confidential",
            Self::Decision => "decision",
            Self::Conclusion => "conclusion",
            Self::Cancellation => "cancellation",
            Self::EliminationReport => "eliminationReport",
            Self::EliminationResolution => "eliminationResolution",
            Self::Appeal => "appeal",
            Self::Liabilities => "liabilities",
            Self::Posts => "posts",
            Self::Parties => "parties",
            Self::Documents => "documents",
        }
    }

    /// Parses a wire name.
    #[must_use]
    pub fn parse(name: &str) -> Option<Self> {
        ALL.iter().copied().find(|f| f.as_str() == name)
    }
}

const ALL: &[MonitoringField] = &[
    MonitoringField::Status,
    MonitoringField::Reasons,
    MonitoringField::ProcuringStages,
    MonitoringField::Confidential,
    MonitoringField::Decision,
    MonitoringField::Conclusion,
    MonitoringField::Cancellation,
    MonitoringField::EliminationReport,
    MonitoringField::EliminationResolution,
    MonitoringField::Appeal,
    MonitoringField::Liabilities,
    MonitoringField::Posts,
    MonitoringField::Parties,
    MonitoringField::Documents,
];

const NONE: &[MonitoringField] = &[];

const AUDITOR_DRAFT: &[MonitoringField] = &[
    MonitoringField::Status,
    MonitoringField::Reasons,
    MonitoringField::ProcuringStages,
    MonitoringField::Confidential,
    MonitoringField::Decision,
    MonitoringField::Cancellation,
    MonitoringField::Parties,
    MonitoringField::Documents,
];

const AUDITOR_ACTIVE: &[MonitoringField] = &[
    MonitoringField::Status,
    MonitoringField::Conclusion,
    MonitoringField::Cancellation,
    MonitoringField::Posts,
    MonitoringField::Parties,
    MonitoringField::Documents,
];

const AUDITOR_ADDRESSED: &[MonitoringField] = &[
    MonitoringField::Status,
    MonitoringField::EliminationResolution,
    MonitoringField::Cancellation,
    MonitoringField::Posts,
    MonitoringField::Parties,
    MonitoringField::Documents,
    MonitoringField::Liabilities,
];

const AUDITOR_DECLINED: &[MonitoringField] = &[
    MonitoringField::Status,
    MonitoringField::Cancellation,
    MonitoringField::Posts,
    MonitoringField::Parties,
    MonitoringField::Documents,
];

const AUDITOR_STOPPED: &[MonitoringField] = &[MonitoringField::Status];

const AUDITOR_COMPLETED: &[MonitoringField] =
    &[MonitoringField::Liabilities, MonitoringField::Posts];

const OWNER_ACTIVE: &[MonitoringField] = &[MonitoringField::Posts];

const OWNER_ADDRESSED: &[MonitoringField] = &[
    MonitoringField::EliminationReport,
    MonitoringField::Appeal,
    MonitoringField::Posts,
];

const OWNER_DECLINED: &[MonitoringField] = &[MonitoringField::Appeal, MonitoringField::Posts];

const OWNER_COMPLETED: &[MonitoringField] = &[MonitoringField::Appeal];

/// The set of fields `role` may patch while the aggregate sits in
/// `status`. Pure lookup, no hidden state.
#[must_use]
pub fn allowed_fields(status: MonitoringStatus, role: Role) -> &'static [MonitoringField] {
    match role {
        Role::Administrator => ALL,
        Role::Public => NONE,
        Role::Auditor => match status {
            MonitoringStatus::Draft => AUDITOR_DRAFT,
            MonitoringStatus::Active => AUDITOR_ACTIVE,
            MonitoringStatus::Addressed => AUDITOR_ADDRESSED,
            MonitoringStatus::Declined => AUDITOR_DECLINED,
            MonitoringStatus::Stopped => AUDITOR_STOPPED,
            MonitoringStatus::Completed => AUDITOR_COMPLETED,
            MonitoringStatus::Closed | MonitoringStatus::Cancelled => NONE,
        },
        Role::TenderOwner => match status {
            MonitoringStatus::Active => OWNER_ACTIVE,
            MonitoringStatus::Addressed => OWNER_ADDRESSED,
            MonitoringStatus::Declined => OWNER_DECLINED,
            MonitoringStatus::Completed => OWNER_COMPLETED,
            _ => NONE,
        },
    }
}

/// Splits a patch's top-level keys into resolvable fields, unknown-key
/// validation errors, and whitelist violations.
///
/// Unknown keys are validation errors (there is no such field); known
/// keys outside the whitelist are access errors, one per field.
pub fn validate_patch_keys<'a>(
    status: MonitoringStatus,
    role: Role,
    keys: impl Iterator<Item = &'a str>,
) -> (
    Vec<MonitoringField>,
    Vec<ValidationError>,
    Vec<AccessError>,
) {
    let allowed = allowed_fields(status, role);
    let mut fields = Vec::new();
    let mut unknown = Vec::new();
    let mut denied = Vec::new();

    for key in keys {
        match MonitoringField::parse(key) {
            None => unknown.push(ValidationError::UnknownField {
                field: key.to_string(),
            }),
            Some(field) if allowed.contains(&field) => fields.push(field),
            Some(field) => {
                warn!(
                    "write denied: role={role} field={} status={status}",
                    field.as_str()
                );
                denied.push(AccessError::FieldNotWritable {
                    field: field.as_str().to_string(),
                    status,
                });
            }
        }
    }

    (fields, unknown, denied)
}
