//! # Oversight: procurement-monitoring audit core
//!
//! Oversight drives monitoring cases an oversight body opens against
//! public-procurement tenders: a fixed lifecycle (decision, conclusion,
//! elimination, resolution, appeal, cancellation) plus the dialogue and
//! documents exchanged with the tender owner along the way.
//!
//! ## Core Concepts
//!
//! - **Monitoring**: one case with all embedded sub-objects, read and
//!   written as a single compare-and-swap unit
//! - **Revision**: append-only structural diff log riding every write
//! - **Whitelist / Redaction**: per-(status, role) write control and
//!   per-(role, confidentiality) read masking
//! - **Feed**: cursor-based, partitioned replay of state transitions
//!
//! ## Usage
//!
//! ```rust,ignore
//! use oversight::{Actor, EngineConfig, OversightEngine, Role};
//!
//! let engine = OversightEngine::in_memory(EngineConfig::default());
//! let auditor = Actor::new(Role::Auditor, "sas");
//!
//! let case = engine.create_monitoring(
//!     serde_json::from_value(serde_json::json!({
//!         "tenderId": "UA-2026-08-08-000001",
//!         "reasons": ["indicator"],
//!     }))?,
//!     &auditor,
//! )?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Core types
pub mod calendar;
pub mod clock;
pub mod custody;
pub mod document;
pub mod error;
pub mod identity;
pub mod ids;
pub mod monitoring;
pub mod party;
pub mod post;
pub mod revision;
pub mod time;

// Access control, lifecycle, storage, and the engine
pub mod access;
pub mod engine;
pub mod feed;
pub mod lifecycle;
pub mod storage;

// Re-export primary types at crate root for convenience
pub use calendar::{Calendar, PlainCalendar};
pub use clock::{Clock, ManualClock, SystemClock};
pub use custody::{DocumentCustody, DocumentReference, NullCustody};
pub use document::{Document, DocumentVersion};
pub use engine::{CreateMonitoring, EngineConfig, MonitoringPatch, OversightEngine};
pub use error::{
    AccessError, ErrorEntry, OversightError, OversightResult, TransitionError, ValidationError,
};
pub use feed::{
    ChangeEvent, ChangeStream, FeedCursor, FeedMode, FeedPage, MonitoringSummary, Partition,
};
pub use identity::{Actor, IdentityProvider, Role, StaticIdentityProvider};
pub use ids::{DocumentId, MonitoringId, PartyId, PostId};
pub use monitoring::{
    Appeal, Cancellation, Conclusion, Decision, EliminationReport, EliminationResolution,
    EliminationResult, Liability, Monitoring, MonitoringStatus, Publishable,
};
pub use party::Party;
pub use post::Post;
pub use revision::{DiffOp, PatchOp, Revision, RevisionToken};
pub use storage::{InMemoryMonitoringStore, MonitoringStore, StorageError};
pub use time::Period;
