//! Field access control.
//!
//! Two independent axes: a per-(status, role) write whitelist checked
//! before a patch touches anything, and per-(role, confidentiality) read
//! redaction applied only at serialization time.

mod redaction;
mod whitelist;

pub use redaction::{masked_fields, redact, REDACTION_PLACEHOLDER};
pub use whitelist::{allowed_fields, validate_patch_keys, MonitoringField};
