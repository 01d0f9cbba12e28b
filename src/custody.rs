//! Document custody collaborator.
//!
//! Document bytes never enter the core: an external custody service signs
//! and stores content, handing back a URL plus content hash. The core
//! persists only that reference.

use serde::{Deserialize, Serialize};

/// Reference returned by the custody service after an upload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentReference {
    /// Signed download URL.
    pub url: String,
    /// Content hash in `md5:<32 hex>` form.
    pub content_hash: String,
}

/// External storage for document content.
pub trait DocumentCustody: Send + Sync {
    /// Stores `bytes` and returns the reference the core may persist.
    fn upload(&self, bytes: &[u8], content_type: &str) -> DocumentReference;

    /// Verifies a signed URL against its signature.
    fn verify(&self, url: &str, signature: &str) -> bool;
}

/// Deterministic in-process custody double.
///
/// Produces stable references derived from the content so tests can assert
/// on hashes without a storage service. `verify` accepts a signature equal
/// to the URL's trailing path segment.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullCustody;

impl DocumentCustody for NullCustody {
    fn upload(&self, bytes: &[u8], content_type: &str) -> DocumentReference {
        let digest = blake3::hash(bytes);
        let hex = digest.to_hex();
        // The wire format is md5-shaped; the double truncates a blake3
        // digest to the same width.
        let content_hash = format!("md5:{}", &hex.as_str()[..32]);
        let url = format!(
            "https://custody.invalid/{}/{}",
            content_type.replace('/', "-"),
            &hex.as_str()[..16]
        );
        DocumentReference { url, content_hash }
    }

    fn verify(&self, url: &str, signature: &str) -> bool {
        url.rsplit('/').next() == Some(signature)
    }
}
