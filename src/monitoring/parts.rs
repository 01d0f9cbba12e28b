//! Companion sub-entities of a monitoring case.
//!
//! Each sub-entity becomes authoritative the moment a lifecycle transition
//! (or owner append) stamps its `datePublished`. A stamped object is
//! frozen: later patches to it are rejected, and the stamp itself is never
//! cleared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::document::Document;
use crate::ids::PartyId;

/// Behavior shared by publishable sub-entities.
pub trait Publishable {
    /// Publication stamp, if already authoritative.
    fn date_published(&self) -> Option<DateTime<Utc>>;

    /// Stamps the publication time. Never un-publishes: a second call with
    /// a later instant is ignored.
    fn publish(&mut self, at: DateTime<Utc>);

    /// Back-reference into the party arena, if any.
    fn related_party(&self) -> Option<PartyId>;
}

macro_rules! publishable {
    ($name:ident) => {
        impl Publishable for $name {
            fn date_published(&self) -> Option<DateTime<Utc>> {
                self.date_published
            }

            fn publish(&mut self, at: DateTime<Utc>) {
                if self.date_published.is_none() {
                    self.date_published = Some(at);
                }
            }

            fn related_party(&self) -> Option<PartyId> {
                self.related_party
            }
        }
    };
}

/// The decision to open monitoring; publishing it activates the case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Decision {
    /// Grounds for the decision.
    pub description: String,

    /// Date the decision was taken by the oversight body.
    pub date: DateTime<Utc>,

    /// Official who signed the decision.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_party: Option<PartyId>,

    /// Attached documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,

    /// Stamped on draft → active.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateTime<Utc>>,
}

publishable!(Decision);

/// How far the detected violations were eliminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EliminationResult {
    /// All violations eliminated.
    Completely,
    /// Part of the violations eliminated.
    Partly,
    /// Nothing eliminated.
    None,
}

/// The conclusion of the monitoring; publishing it addresses or declines
/// the case depending on whether a violation occurred.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Conclusion {
    /// Whether the monitoring found a violation.
    pub violation_occurred: bool,

    /// Classified violation types; required when a violation occurred.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub violation_types: Vec<String>,

    /// Free-form violation description when none of the types fit.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub other_violation_type: Option<String>,

    /// Narrative finding.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Official who signed the conclusion.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_party: Option<PartyId>,

    /// Attached documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,

    /// Stamped on active → addressed/declined.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateTime<Utc>>,
}

publishable!(Conclusion);

/// Cancellation/stop rationale. A fresh (unpublished) cancellation is the
/// precondition for draft → cancelled and for each stop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Cancellation {
    /// Rationale for cancelling or stopping the case.
    pub description: String,

    /// Official who signed the cancellation.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_party: Option<PartyId>,

    /// Attached documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,

    /// Stamped on draft → cancelled and on each stop.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateTime<Utc>>,
}

publishable!(Cancellation);

/// Tender owner's report on eliminating the violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EliminationReport {
    /// What was done about the violations.
    pub description: String,

    /// Signing official on the owner side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_party: Option<PartyId>,

    /// Attached documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,

    /// Stamped when the owner submits the report.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateTime<Utc>>,
}

publishable!(EliminationReport);

/// Oversight body's resolution on the elimination report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EliminationResolution {
    /// Overall elimination outcome.
    pub result: EliminationResult,

    /// Outcome per violation type.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub result_by_types: Vec<String>,

    /// Narrative assessment.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Signing official.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_party: Option<PartyId>,

    /// Attached documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,

    /// Stamped on addressed → completed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateTime<Utc>>,
}

publishable!(EliminationResolution);

/// Owner's appeal against the conclusion.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appeal {
    /// Appeal substance.
    pub description: String,

    /// Signing official on the owner side.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_party: Option<PartyId>,

    /// Attached documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,

    /// Stamped when the owner lodges the appeal.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateTime<Utc>>,
}

publishable!(Appeal);

/// Administrative-liability record tied to the case outcome.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Liability {
    /// Protocol/report number.
    pub report_number: String,

    /// Legislation articles the liability rests on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub legislation_articles: Vec<String>,

    /// Official the liability applies to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub related_party: Option<PartyId>,

    /// Attached documents.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub documents: Vec<Document>,

    /// Stamped when the liability record is appended.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateTime<Utc>>,
}

publishable!(Liability);
