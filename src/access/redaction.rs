//! Per-(role, confidentiality) read redaction.
//!
//! Redaction is a projection concern: it rewrites the serialized view
//! handed to a caller and never touches stored data. Two reads of the
//! same revision by different roles may legitimately differ.

use log::info;
use serde_json::Value;

use crate::identity::Role;

/// Fixed placeholder substituted for every masked string leaf.
pub const REDACTION_PLACEHOLDER: &str = "hidden";

const PUBLIC_MASK: &[&str] = &[
    "decision",
    "conclusion",
    "cancellation",
    "eliminationReport",
    "eliminationResolution",
    "appeal",
    "liabilities",
    "posts",
    "documents",
    "parties",
];

const OWNER_MASK: &[&str] = &["parties"];

/// Top-level fields masked for `role` on a confidentiality-flagged
/// aggregate. Privileged roles always read everything.
#[must_use]
pub fn masked_fields(role: Role, confidential: bool) -> &'static [&'static str] {
    if !confidential || role.is_privileged() {
        return &[];
    }
    match role {
        Role::Public => PUBLIC_MASK,
        Role::TenderOwner => OWNER_MASK,
        Role::Auditor | Role::Administrator => &[],
    }
}

fn mask_strings(value: &mut Value) {
    match value {
        Value::String(s) => *s = REDACTION_PLACEHOLDER.to_string(),
        Value::Array(items) => items.iter_mut().for_each(mask_strings),
        Value::Object(map) => map.values_mut().for_each(mask_strings),
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Redacts a serialized aggregate view in place for `role`.
///
/// Every string leaf under a masked top-level field becomes the
/// placeholder; structure, numbers, and booleans survive so consumers can
/// still count attachments and follow ids.
pub fn redact(view: &mut Value, role: Role, confidential: bool) {
    let masked = masked_fields(role, confidential);
    if masked.is_empty() {
        return;
    }

    info!("redacting {} field group(s) for role={role}", masked.len());
    if let Value::Object(map) = view {
        for field in masked {
            if let Some(slot) = map.get_mut(*field) {
                mask_strings(slot);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn confidential_view() -> Value {
        json!({
            "status": "active",
            "tenderId": "tender-7",
            "decision": {
                "description": "grounds",
                "documents": [{"title": "scan.pdf", "contentHash": "md5:aa"}]
            },
            "posts": [{"title": "q", "description": "why"}],
            "parties": [{"name": "official"}]
        })
    }

    #[test]
    fn test_privileged_roles_never_masked() {
        assert!(masked_fields(Role::Auditor, true).is_empty());
        assert!(masked_fields(Role::Administrator, true).is_empty());
    }

    #[test]
    fn test_unflagged_aggregate_never_masked() {
        for role in [Role::Public, Role::TenderOwner, Role::Auditor] {
            assert!(masked_fields(role, false).is_empty());
        }
    }

    #[test]
    fn test_public_read_is_masked_but_shaped() {
        let mut view = confidential_view();
        redact(&mut view, Role::Public, true);

        assert_eq!(
            view["decision"]["description"],
            json!(REDACTION_PLACEHOLDER)
        );
        assert_eq!(
            view["decision"]["documents"][0]["title"],
            json!(REDACTION_PLACEHOLDER)
        );
        assert_eq!(view["posts"][0]["title"], json!(REDACTION_PLACEHOLDER));
        // Unmasked top-level scalars survive.
        assert_eq!(view["tenderId"], json!("tender-7"));
        assert_eq!(view["status"], json!("active"));
        // Structure survives for counting.
        assert_eq!(view["decision"]["documents"].as_array().unwrap().len(), 1);
    }

    #[test]
    fn test_owner_sees_substance_but_not_parties() {
        let mut view = confidential_view();
        redact(&mut view, Role::TenderOwner, true);

        assert_eq!(view["decision"]["description"], json!("grounds"));
        assert_eq!(view["parties"][0]["name"], json!(REDACTION_PLACEHOLDER));
    }

    #[test]
    fn test_redaction_does_not_mutate_source_of_truth() {
        let original = confidential_view();
        let mut projection = original.clone();
        redact(&mut projection, Role::Public, true);
        // The caller's copy changed; the original is untouched.
        assert_ne!(projection, original);
        assert_eq!(original["decision"]["description"], json!("grounds"));
    }
}
