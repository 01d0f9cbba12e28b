//! Boundary payloads: creating a case and patching it.
//!
//! A patch carries only top-level fields; which of them are acceptable is
//! the whitelist's decision, made on the raw keys before this type is
//! ever deserialized. Collection fields append; singleton sub-entities
//! replace while unpublished and freeze once published.

use serde::Deserialize;

use crate::document::Document;
use crate::monitoring::{
    Appeal, Cancellation, Conclusion, Decision, EliminationReport, EliminationResolution,
    Liability, MonitoringStatus,
};
use crate::party::Party;
use crate::post::Post;

/// Payload for creating a monitoring case.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMonitoring {
    /// The tender to monitor.
    pub tender_id: String,

    /// Why the monitoring is opened; at least one reason is required.
    pub reasons: Vec<String>,

    /// Procurement stages under scrutiny.
    #[serde(default)]
    pub procuring_stages: Vec<String>,

    /// Sandbox flag, settable only at creation.
    #[serde(default)]
    pub is_test: bool,

    /// Confidentiality flag.
    #[serde(default)]
    pub confidential: bool,

    /// Optional decision, allowing direct `draft → active` creation.
    #[serde(default)]
    pub decision: Option<Decision>,

    /// Initial party arena.
    #[serde(default)]
    pub parties: Vec<Party>,

    /// Initial case-level documents.
    #[serde(default)]
    pub documents: Vec<Document>,

    /// Requested initial status: `draft` (default) or `active` when the
    /// payload carries a publishable decision.
    #[serde(default)]
    pub status: Option<MonitoringStatus>,
}

/// Typed view of a patch body after the whitelist pass.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonitoringPatch {
    /// Requested status change.
    #[serde(default)]
    pub status: Option<MonitoringStatus>,

    /// Replaces the reason tags.
    #[serde(default)]
    pub reasons: Option<Vec<String>>,

    /// Replaces the stage tags.
    #[serde(default)]
    pub procuring_stages: Option<Vec<String>>,

    /// Flips the confidentiality flag.
    #[serde(default)]
    pub confidential: Option<bool>,

    /// Replaces the (unpublished) decision.
    #[serde(default)]
    pub decision: Option<Decision>,

    /// Replaces the (unpublished) conclusion.
    #[serde(default)]
    pub conclusion: Option<Conclusion>,

    /// Replaces the (unpublished) cancellation.
    #[serde(default)]
    pub cancellation: Option<Cancellation>,

    /// Submits the owner's elimination report; published on append.
    #[serde(default)]
    pub elimination_report: Option<EliminationReport>,

    /// Replaces the (unpublished) elimination resolution.
    #[serde(default)]
    pub elimination_resolution: Option<EliminationResolution>,

    /// Lodges the owner's appeal; published on append.
    #[serde(default)]
    pub appeal: Option<Appeal>,

    /// Liability records to append.
    #[serde(default)]
    pub liabilities: Option<Vec<Liability>>,

    /// Dialogue posts to append.
    #[serde(default)]
    pub posts: Option<Vec<Post>>,

    /// Parties to append to the arena.
    #[serde(default)]
    pub parties: Option<Vec<Party>>,

    /// Documents to append, or metadata edits for existing ids.
    #[serde(default)]
    pub documents: Option<Vec<Document>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn create_payload_minimal() {
        let payload: CreateMonitoring = serde_json::from_value(json!({
            "tenderId": "tender-9",
            "reasons": ["indicator"]
        }))
        .unwrap();

        assert_eq!(payload.tender_id, "tender-9");
        assert!(!payload.is_test);
        assert!(payload.status.is_none());
    }

    #[test]
    fn patch_deserializes_wire_names() {
        let patch: MonitoringPatch = serde_json::from_value(json!({
            "status": "active",
            "decision": {"description": "grounds", "date": "2026-08-08T10:00:00Z"}
        }))
        .unwrap();

        assert_eq!(patch.status, Some(MonitoringStatus::Active));
        assert_eq!(patch.decision.unwrap().description, "grounds");
    }

    #[test]
    fn empty_patch_is_valid() {
        let patch: MonitoringPatch = serde_json::from_value(json!({})).unwrap();
        assert!(patch.status.is_none());
        assert!(patch.posts.is_none());
    }
}
