//! The monitoring aggregate: one case, one consistency unit.
//!
//! The aggregate embeds every sub-object (decision, conclusion, dialogue
//! posts, parties, documents, the audit log) and is read and written as a
//! whole through a single compare-and-swap token.

mod parts;
mod status;

pub use parts::{
    Appeal, Cancellation, Conclusion, Decision, EliminationReport, EliminationResolution,
    EliminationResult, Liability, Publishable,
};
pub use status::MonitoringStatus;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::document::Document;
use crate::ids::{MonitoringId, PartyId};
use crate::party::Party;
use crate::post::Post;
use crate::revision::{Revision, RevisionToken};
use crate::time::Period;

/// A monitoring case and all of its embedded sub-objects.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Monitoring {
    /// Aggregate id.
    pub id: MonitoringId,

    /// Human-readable sequential case number (`UA-M-…`).
    pub case_number: String,

    /// The monitored tender.
    pub tender_id: String,

    /// Owner identity of the case (the oversight body account).
    pub owner: String,

    /// Lifecycle status.
    pub status: MonitoringStatus,

    /// Why the monitoring was opened (risk indicators, media, …).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub reasons: Vec<String>,

    /// Procurement stages under scrutiny.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub procuring_stages: Vec<String>,

    /// Sandbox flag; test cases stay out of the real feed partitions.
    #[serde(default)]
    pub is_test: bool,

    /// Confidentiality flag driving read redaction.
    #[serde(default)]
    pub confidential: bool,

    /// Decision to open monitoring.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub decision: Option<Decision>,

    /// Monitoring conclusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conclusion: Option<Conclusion>,

    /// Cancellation/stop rationale.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cancellation: Option<Cancellation>,

    /// Owner's elimination report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elimination_report: Option<EliminationReport>,

    /// Oversight resolution on the elimination report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elimination_resolution: Option<EliminationResolution>,

    /// Owner's appeal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub appeal: Option<Appeal>,

    /// Liability records.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub liabilities: Vec<Liability>,

    /// Dialogue thread.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub posts: Vec<Post>,

    /// Party arena; referenced by id from sub-entities.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub parties: Vec<Party>,

    /// Case-level documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,

    /// Stamped on activation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub monitoring_period: Option<Period>,

    /// Stamped when a conclusion is published.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub elimination_period: Option<Period>,

    /// Set while the case is stopped; drives the resume extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_stopped: Option<DateTime<Utc>>,

    /// Creation instant.
    pub date_created: DateTime<Utc>,

    /// Stamped by the store on every successful write.
    pub date_modified: DateTime<Utc>,

    /// Global feed position, store-assigned on every write.
    #[serde(default)]
    pub sequence: u64,

    /// Compare-and-swap token of the stored version.
    #[serde(default = "RevisionToken::initial")]
    pub rev: RevisionToken,

    /// Append-only audit log; rides the same CAS write.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub revisions: Vec<Revision>,
}

impl Monitoring {
    /// Creates a fresh draft case.
    #[must_use]
    pub fn new(
        id: MonitoringId,
        tender_id: impl Into<String>,
        owner: impl Into<String>,
        case_number: impl Into<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            case_number: case_number.into(),
            tender_id: tender_id.into(),
            owner: owner.into(),
            status: MonitoringStatus::Draft,
            reasons: Vec::new(),
            procuring_stages: Vec::new(),
            is_test: false,
            confidential: false,
            decision: None,
            conclusion: None,
            cancellation: None,
            elimination_report: None,
            elimination_resolution: None,
            appeal: None,
            liabilities: Vec::new(),
            posts: Vec::new(),
            parties: Vec::new(),
            documents: Vec::new(),
            monitoring_period: None,
            elimination_period: None,
            date_stopped: None,
            date_created: now,
            date_modified: now,
            sequence: 0,
            rev: RevisionToken::initial(),
            revisions: Vec::new(),
        }
    }

    /// Serialized projection used for diffing and for feeds: the full
    /// document minus the audit log itself.
    ///
    /// # Panics
    ///
    /// Panics if the aggregate fails to serialize, which would be a bug in
    /// the type definitions rather than runtime input.
    #[must_use]
    pub fn audited_view(&self) -> Value {
        let mut value = serde_json::to_value(self).expect("aggregate serializes");
        if let Value::Object(map) = &mut value {
            map.remove("revisions");
        }
        value
    }

    /// Returns true if the party arena contains `id`.
    #[must_use]
    pub fn has_party(&self, id: PartyId) -> bool {
        self.parties.iter().any(|p| p.id == id)
    }

    /// Every `relatedParty` back-reference present in the aggregate,
    /// paired with the field path it came from.
    #[must_use]
    pub fn related_party_references(&self) -> Vec<(String, PartyId)> {
        let mut refs = Vec::new();

        let mut push = |field: &str, party: Option<PartyId>| {
            if let Some(id) = party {
                refs.push((field.to_string(), id));
            }
        };

        push(
            "decision.relatedParty",
            self.decision.as_ref().and_then(|p| p.related_party()),
        );
        push(
            "conclusion.relatedParty",
            self.conclusion.as_ref().and_then(|p| p.related_party()),
        );
        push(
            "cancellation.relatedParty",
            self.cancellation.as_ref().and_then(|p| p.related_party()),
        );
        push(
            "eliminationReport.relatedParty",
            self.elimination_report.as_ref().and_then(|p| p.related_party()),
        );
        push(
            "eliminationResolution.relatedParty",
            self.elimination_resolution
                .as_ref()
                .and_then(|p| p.related_party()),
        );
        push(
            "appeal.relatedParty",
            self.appeal.as_ref().and_then(|p| p.related_party()),
        );

        for (index, liability) in self.liabilities.iter().enumerate() {
            push(
                &format!("liabilities[{index}].relatedParty"),
                liability.related_party,
            );
        }

        refs
    }
}
