//! Identity and role resolution collaborator.
//!
//! Inbound credentials are resolved to a role (plus owner identity) by an
//! external provider; the core trusts the result. The provider is the
//! seam where request auth plugs in.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

/// The caller's role with respect to a monitoring case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// The oversight body driving the case (case owner).
    Auditor,
    /// The owner of the monitored tender.
    TenderOwner,
    /// Operational administrator.
    Administrator,
    /// Anonymous read-only access.
    Public,
}

impl Role {
    /// Stable lowercase name for logging and error messages.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Auditor => "auditor",
            Self::TenderOwner => "tender_owner",
            Self::Administrator => "administrator",
            Self::Public => "public",
        }
    }

    /// Privileged roles always read unredacted projections.
    #[must_use]
    pub const fn is_privileged(&self) -> bool {
        matches!(self, Self::Auditor | Self::Administrator)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A resolved caller: role plus the identity string recorded as revision
/// author and compared against post authorship.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    /// Resolved role.
    pub role: Role,
    /// Owner token / account identity.
    pub identity: String,
}

impl Actor {
    /// Convenience constructor.
    #[must_use]
    pub fn new(role: Role, identity: impl Into<String>) -> Self {
        Self {
            role,
            identity: identity.into(),
        }
    }
}

/// Resolves an inbound credential to an actor.
pub trait IdentityProvider: Send + Sync {
    /// Returns the actor for a credential, or `None` for unknown ones.
    fn resolve(&self, credential: &str) -> Option<Actor>;
}

/// Fixed-map provider for embedded use and tests.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    actors: HashMap<String, Actor>,
}

impl StaticIdentityProvider {
    /// Create an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a credential → actor mapping.
    #[must_use]
    pub fn with_actor(mut self, credential: impl Into<String>, actor: Actor) -> Self {
        self.actors.insert(credential.into(), actor);
        self
    }
}

impl IdentityProvider for StaticIdentityProvider {
    fn resolve(&self, credential: &str) -> Option<Actor> {
        self.actors.get(credential).cloned()
    }
}
