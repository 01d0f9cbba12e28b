//! Documents attached to a case and its sub-entities.
//!
//! A document's identity is its content reference (id + hash + signed
//! URL) and never changes. Metadata edits (title, format, description)
//! snapshot the previous metadata into the version list instead of
//! overwriting history.

use std::sync::OnceLock;

use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::DocumentId;

static CONTENT_HASH_RE: OnceLock<Regex> = OnceLock::new();

fn content_hash_re() -> &'static Regex {
    CONTENT_HASH_RE
        .get_or_init(|| Regex::new(r"^md5:[0-9a-f]{32}$").expect("content hash regex is valid"))
}

/// Snapshot of document metadata superseded by an edit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentVersion {
    /// Title at the time of the snapshot.
    pub title: String,
    /// MIME format at the time of the snapshot.
    pub format: String,
    /// Description at the time of the snapshot.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// When the snapshot was superseded.
    pub date_modified: DateTime<Utc>,
}

/// A stored document reference.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Document {
    /// Stable document id.
    #[serde(default)]
    pub id: DocumentId,

    /// Content hash (`md5:` + 32 hex digits); immutable identity.
    pub content_hash: String,

    /// Signed download URL from the custody service; immutable identity.
    pub url: String,

    /// Display title.
    pub title: String,

    /// MIME format.
    pub format: String,

    /// Free-form description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Stamped when the document first becomes visible.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_published: Option<DateTime<Utc>>,

    /// Last metadata change.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_modified: Option<DateTime<Utc>>,

    /// Superseded metadata snapshots, oldest first.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub versions: Vec<DocumentVersion>,
}

impl Document {
    /// Validates the content-hash wire format.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidContentHash` on a malformed hash.
    pub fn validate_hash(&self, field: &str) -> Result<(), ValidationError> {
        if content_hash_re().is_match(&self.content_hash) {
            Ok(())
        } else {
            Err(ValidationError::InvalidContentHash {
                field: field.to_string(),
                value: self.content_hash.clone(),
            })
        }
    }

    /// Stamps publication/modification when the document is first
    /// appended to an aggregate. Existing stamps are left alone.
    pub fn publish_on_append(&mut self, now: DateTime<Utc>) {
        if self.date_published.is_none() {
            self.date_published = Some(now);
        }
        if self.date_modified.is_none() {
            self.date_modified = Some(now);
        }
    }

    /// Applies a metadata edit, snapshotting the current metadata.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::DocumentIdentityChanged` if the edit
    /// carries a different hash or URL.
    pub fn apply_metadata_edit(
        &mut self,
        edit: &Document,
        field: &str,
        now: DateTime<Utc>,
    ) -> Result<(), ValidationError> {
        if edit.content_hash != self.content_hash || edit.url != self.url {
            return Err(ValidationError::DocumentIdentityChanged {
                field: field.to_string(),
                id: self.id.to_string(),
            });
        }

        self.versions.push(DocumentVersion {
            title: self.title.clone(),
            format: self.format.clone(),
            description: self.description.clone(),
            date_modified: now,
        });
        self.title = edit.title.clone();
        self.format = edit.format.clone();
        self.description = edit.description.clone();
        self.date_modified = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::custody::{DocumentCustody, NullCustody};

    fn sample() -> Document {
        let reference = NullCustody.upload(b"audit report", "application/pdf");
        Document {
            id: DocumentId::new(),
            content_hash: reference.content_hash,
            url: reference.url,
            title: "report.pdf".to_string(),
            format: "application/pdf".to_string(),
            description: None,
            date_published: None,
            date_modified: None,
            versions: Vec::new(),
        }
    }

    #[test]
    fn hash_format_accepts_custody_references() {
        sample().validate_hash("documents").unwrap();
    }

    #[test]
    fn hash_format_rejects_garbage() {
        let mut doc = sample();
        doc.content_hash = "sha256:abcd".to_string();
        assert!(doc.validate_hash("documents").is_err());
    }

    #[test]
    fn metadata_edit_snapshots_previous_version() {
        let mut doc = sample();
        let now = Utc::now();

        let mut edit = doc.clone();
        edit.title = "report-v2.pdf".to_string();
        edit.description = Some("amended".to_string());
        doc.apply_metadata_edit(&edit, "documents", now).unwrap();

        assert_eq!(doc.title, "report-v2.pdf");
        assert_eq!(doc.versions.len(), 1);
        assert_eq!(doc.versions[0].title, "report.pdf");
        assert_eq!(doc.date_modified, Some(now));
    }

    #[test]
    fn metadata_edit_cannot_change_identity() {
        let mut doc = sample();
        let mut edit = doc.clone();
        edit.content_hash = "md5:00000000000000000000000000000000".to_string();

        let err = doc
            .apply_metadata_edit(&edit, "documents", Utc::now())
            .unwrap_err();
        assert!(matches!(
            err,
            ValidationError::DocumentIdentityChanged { .. }
        ));
        assert!(doc.versions.is_empty());
    }

    #[test]
    fn document_serde_wire_names() {
        let doc = sample();
        let json = serde_json::to_value(&doc).unwrap();
        assert!(json.get("contentHash").is_some());
        assert!(json.get("datePublished").is_none());
    }
}
