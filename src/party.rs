//! Parties involved in a monitoring case.
//!
//! Parties live in an append-only arena inside the aggregate and are
//! addressed by id from sub-entities via `relatedParty`. References are
//! validated against the arena; there are no cross-aggregate links.

use serde::{Deserialize, Serialize};

use crate::ids::PartyId;

/// One party (an organization or official) attached to a case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Party {
    /// Arena key; assigned by the core when the party is appended.
    #[serde(default)]
    pub id: PartyId,

    /// Display name.
    pub name: String,

    /// Legal identifier (registry code), when known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identifier: Option<String>,

    /// Postal address.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,

    /// Contact point (email/phone).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_point: Option<String>,

    /// Roles the party plays in the case ("sas", "expert", ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub roles: Vec<String>,
}

impl Party {
    /// Create a named party with a fresh id.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: PartyId::new(),
            name: name.into(),
            identifier: None,
            address: None,
            contact_point: None,
            roles: Vec::new(),
        }
    }
}
