//! The oversight engine: boundary operations over injected collaborators.
//!
//! The engine is the only writer. Every accepted patch runs the same
//! pipeline (whitelist, typed patch application, transition guard,
//! derived stamps) against an in-memory candidate, and only a fully
//! valid candidate reaches the single CAS save. A conflict from that save
//! is returned to the caller as-is; the engine never replays a possibly
//! stale business decision on its own.

mod config;
mod patch;

pub use config::EngineConfig;
pub use patch::{CreateMonitoring, MonitoringPatch};

use std::sync::Arc;

use chrono::{DateTime, Utc};
use log::info;
use serde_json::Value;

use crate::access::{redact, validate_patch_keys};
use crate::calendar::Calendar;
use crate::clock::Clock;
use crate::custody::DocumentCustody;
use crate::document::Document;
use crate::error::{AccessError, OversightError, OversightResult, ValidationError};
use crate::feed::{ChangeHub, ChangeStream, FeedCursor, FeedMode, FeedPage, FeedPublisher, Partition};
use crate::identity::{Actor, Role};
use crate::ids::{format_case_number, MonitoringId};
use crate::lifecycle::{apply_transition, TransitionContext};
use crate::monitoring::{Monitoring, MonitoringStatus, Publishable};
use crate::post::validate_reply_chain;
use crate::revision::RevisionToken;
use crate::storage::MonitoringStore;

/// Named counter feeding human-readable case numbers.
const CASE_NUMBER_COUNTER: &str = "case-number";

/// The synchronous core engine.
///
/// All collaborators are constructor-injected; the engine holds no
/// ambient state and is cheap to share behind an `Arc`.
pub struct OversightEngine {
    store: Arc<dyn MonitoringStore>,
    clock: Arc<dyn Clock>,
    calendar: Arc<dyn Calendar>,
    custody: Arc<dyn DocumentCustody>,
    config: EngineConfig,
    publisher: FeedPublisher,
    hub: ChangeHub,
}

impl OversightEngine {
    /// Create an engine over the given collaborators.
    #[must_use]
    pub fn new(
        store: Arc<dyn MonitoringStore>,
        clock: Arc<dyn Clock>,
        calendar: Arc<dyn Calendar>,
        custody: Arc<dyn DocumentCustody>,
        config: EngineConfig,
    ) -> Self {
        let publisher = FeedPublisher::new(Arc::clone(&store), config.max_feed_limit);
        let hub = ChangeHub::new(config.watch_buffer);
        Self {
            store,
            clock,
            calendar,
            custody,
            config,
            publisher,
            hub,
        }
    }

    /// Engine over an in-memory store and system collaborators; intended
    /// for embedded use and tests.
    #[must_use]
    pub fn in_memory(config: EngineConfig) -> Self {
        let clock: Arc<dyn Clock> = Arc::new(crate::clock::SystemClock);
        let store: Arc<dyn MonitoringStore> = Arc::new(
            crate::storage::InMemoryMonitoringStore::new(Arc::clone(&clock)),
        );
        Self::new(
            store,
            clock,
            Arc::new(crate::calendar::PlainCalendar),
            Arc::new(crate::custody::NullCustody),
            config,
        )
    }

    fn transition_ctx(&self, now: DateTime<Utc>) -> TransitionContext<'_> {
        TransitionContext {
            now,
            calendar: self.calendar.as_ref(),
            durations: self.config.durations,
        }
    }

    /// Creates a monitoring case.
    ///
    /// Only the oversight body and administrators may create cases. The
    /// aggregate is born in `draft`, or directly in `active` when the
    /// payload carries a publishable decision and asks for it.
    ///
    /// # Errors
    ///
    /// Access, validation, transition, or storage errors per the boundary
    /// taxonomy.
    pub fn create_monitoring(
        &self,
        payload: CreateMonitoring,
        actor: &Actor,
    ) -> OversightResult<Monitoring> {
        if !actor.role.is_privileged() {
            return Err(AccessError::RoleDenied {
                role: actor.role.to_string(),
                operation: "create a monitoring".to_string(),
            }
            .into());
        }

        let mut errors = Vec::new();
        if payload.tender_id.trim().is_empty() {
            errors.push(ValidationError::EmptyField {
                field: "tenderId".to_string(),
            });
        }
        if payload.reasons.is_empty() {
            errors.push(ValidationError::EmptyField {
                field: "reasons".to_string(),
            });
        }
        let target_status = payload.status.unwrap_or(MonitoringStatus::Draft);
        if !matches!(
            target_status,
            MonitoringStatus::Draft | MonitoringStatus::Active
        ) {
            errors.push(ValidationError::Malformed {
                field: "status".to_string(),
                reason: "a case is created in draft or active".to_string(),
            });
        }
        if !errors.is_empty() {
            return Err(OversightError::Validation(errors));
        }

        let now = self.clock.now();
        let counter = self.store.next_named(CASE_NUMBER_COUNTER)?;
        let case_number = format_case_number(now, counter);

        let mut aggregate = Monitoring::new(
            MonitoringId::new(),
            payload.tender_id,
            actor.identity.clone(),
            case_number,
            now,
        );
        aggregate.reasons = payload.reasons;
        aggregate.procuring_stages = payload.procuring_stages;
        aggregate.is_test = payload.is_test;
        aggregate.confidential = payload.confidential;
        aggregate.decision = payload.decision;
        aggregate.parties = payload.parties;
        aggregate.documents = payload.documents;
        for document in &mut aggregate.documents {
            document.publish_on_append(now);
        }

        let errors = validate_aggregate(&aggregate);
        if !errors.is_empty() {
            return Err(OversightError::Validation(errors));
        }

        if target_status == MonitoringStatus::Active {
            apply_transition(&mut aggregate, MonitoringStatus::Active, &self.transition_ctx(now))?;
        }

        let saved = self
            .store
            .save(aggregate, &RevisionToken::initial(), true, &actor.identity)?;
        info!(
            "created monitoring {} for tender {} in {}",
            saved.case_number, saved.tender_id, saved.status
        );
        self.hub.publish(&saved);
        Ok(saved)
    }

    /// Patches a monitoring case under optimistic concurrency.
    ///
    /// `expected` is the revision token the caller read; a stale token
    /// surfaces as a retryable conflict. The patch body is raw JSON so
    /// the whitelist can judge exactly what the caller sent.
    ///
    /// # Errors
    ///
    /// Access, validation, transition, or storage errors per the boundary
    /// taxonomy; `Conflict` when `expected` is stale.
    pub fn patch_monitoring(
        &self,
        id: MonitoringId,
        expected: &RevisionToken,
        body: Value,
        actor: &Actor,
    ) -> OversightResult<Monitoring> {
        if actor.role == Role::Public {
            return Err(AccessError::RoleDenied {
                role: actor.role.to_string(),
                operation: "patch a monitoring".to_string(),
            }
            .into());
        }

        let current = self.store.get(id)?;

        let Value::Object(map) = body else {
            return Err(ValidationError::Malformed {
                field: "body".to_string(),
                reason: "the patch body must be a JSON object".to_string(),
            }
            .into());
        };
        if map.is_empty() {
            return Err(ValidationError::EmptyField {
                field: "body".to_string(),
            }
            .into());
        }

        let (_, unknown, denied) =
            validate_patch_keys(current.status, actor.role, map.keys().map(String::as_str));
        if !denied.is_empty() {
            return Err(OversightError::Access(denied));
        }
        if !unknown.is_empty() {
            return Err(OversightError::Validation(unknown));
        }

        let patch: MonitoringPatch =
            serde_json::from_value(Value::Object(map)).map_err(|e| ValidationError::Malformed {
                field: "body".to_string(),
                reason: e.to_string(),
            })?;

        let now = self.clock.now();
        let mut candidate = current.clone();
        let requested_status = apply_patch(&mut candidate, patch, actor, now)?;

        if let Some(to) = requested_status {
            if to != candidate.status {
                apply_transition(&mut candidate, to, &self.transition_ctx(now))?;
            }
        }

        let errors = validate_aggregate(&candidate);
        if !errors.is_empty() {
            return Err(OversightError::Validation(errors));
        }

        let saved = self.store.save(candidate, expected, false, &actor.identity)?;
        self.hub.publish(&saved);
        Ok(saved)
    }

    /// Reads a case as the given actor sees it.
    ///
    /// Privileged actors get the full document including the audit log;
    /// everyone else gets the audited view with confidentiality redaction
    /// applied at projection time.
    ///
    /// # Errors
    ///
    /// `NotFound` for unknown ids.
    pub fn get_monitoring(&self, id: MonitoringId, actor: &Actor) -> OversightResult<Value> {
        let current = self.store.get(id)?;

        if actor.role.is_privileged() {
            return serde_json::to_value(&current)
                .map_err(|e| OversightError::internal(e.to_string()));
        }

        // Drafts are the oversight body's workbench; to everyone else the
        // case does not exist yet.
        if current.status == MonitoringStatus::Draft {
            return Err(crate::storage::StorageError::NotFound(id).into());
        }

        let mut view = current.audited_view();
        redact(&mut view, actor.role, current.confidential);
        Ok(view)
    }

    /// Serves one page of a change-feed partition.
    ///
    /// # Errors
    ///
    /// Draft-inclusive partitions are restricted to privileged roles;
    /// storage errors propagate.
    pub fn feed(
        &self,
        partition: Partition,
        mode: FeedMode,
        cursor: Option<FeedCursor>,
        limit: usize,
        role: Role,
    ) -> OversightResult<FeedPage> {
        if partition.includes_hidden() && !role.is_privileged() {
            return Err(AccessError::RoleDenied {
                role: role.to_string(),
                operation: format!("read the {partition} feed"),
            }
            .into());
        }
        Ok(self.publisher.page(partition, mode, cursor, limit)?)
    }

    /// Subscribes to commit events for one partition.
    #[must_use]
    pub fn subscribe(&self, partition: Partition) -> ChangeStream {
        self.hub.subscribe(partition)
    }

    /// Stages a document through the custody collaborator.
    ///
    /// The returned document carries the custody reference and is ready
    /// to attach through a patch; the core never sees the bytes again.
    #[must_use]
    pub fn stage_document(
        &self,
        bytes: &[u8],
        content_type: &str,
        title: impl Into<String>,
    ) -> Document {
        let reference = self.custody.upload(bytes, content_type);
        Document {
            id: crate::ids::DocumentId::new(),
            content_hash: reference.content_hash,
            url: reference.url,
            title: title.into(),
            format: content_type.to_string(),
            description: None,
            date_published: None,
            date_modified: None,
            versions: Vec::new(),
        }
    }

    /// The engine's store, for wiring read-side extensions.
    #[must_use]
    pub fn store(&self) -> &Arc<dyn MonitoringStore> {
        &self.store
    }
}

/// Applies the non-status patch fields to the candidate.
///
/// Returns the requested status, if any. Collection fields append;
/// singleton sub-entities replace while unpublished and are frozen once
/// published. Owner-submitted parts (elimination report, appeal) publish
/// on append because the append itself is the authoritative act.
fn apply_patch(
    candidate: &mut Monitoring,
    patch: MonitoringPatch,
    actor: &Actor,
    now: DateTime<Utc>,
) -> Result<Option<MonitoringStatus>, OversightError> {
    let mut errors = Vec::new();

    if let Some(reasons) = patch.reasons {
        if reasons.is_empty() {
            errors.push(ValidationError::EmptyField {
                field: "reasons".to_string(),
            });
        } else {
            candidate.reasons = reasons;
        }
    }
    if let Some(stages) = patch.procuring_stages {
        candidate.procuring_stages = stages;
    }
    if let Some(confidential) = patch.confidential {
        candidate.confidential = confidential;
    }

    if let Some(decision) = patch.decision {
        replace_unpublished(&mut candidate.decision, decision, "decision", &mut errors);
    }
    if let Some(conclusion) = patch.conclusion {
        replace_unpublished(&mut candidate.conclusion, conclusion, "conclusion", &mut errors);
    }
    if let Some(cancellation) = patch.cancellation {
        replace_unpublished(
            &mut candidate.cancellation,
            cancellation,
            "cancellation",
            &mut errors,
        );
    }
    if let Some(resolution) = patch.elimination_resolution {
        replace_unpublished(
            &mut candidate.elimination_resolution,
            resolution,
            "eliminationResolution",
            &mut errors,
        );
    }

    if let Some(mut report) = patch.elimination_report {
        if candidate
            .elimination_report
            .as_ref()
            .and_then(|p| p.date_published())
            .is_some()
        {
            errors.push(ValidationError::PublishedImmutable {
                field: "eliminationReport".to_string(),
            });
        } else {
            report.publish(now);
            candidate.elimination_report = Some(report);
        }
    }
    if let Some(mut appeal) = patch.appeal {
        if candidate
            .appeal
            .as_ref()
            .and_then(|p| p.date_published())
            .is_some()
        {
            errors.push(ValidationError::PublishedImmutable {
                field: "appeal".to_string(),
            });
        } else {
            appeal.publish(now);
            candidate.appeal = Some(appeal);
        }
    }

    if let Some(mut liabilities) = patch.liabilities {
        for liability in &mut liabilities {
            liability.publish(now);
        }
        candidate.liabilities.extend(liabilities);
    }

    if let Some(mut posts) = patch.posts {
        for post in &mut posts {
            post.author = actor.identity.clone();
            post.date_published = Some(now);
        }
        errors.extend(validate_reply_chain(&candidate.posts, &posts));
        candidate.posts.extend(posts);
    }

    if let Some(parties) = patch.parties {
        candidate.parties.extend(parties);
    }

    if let Some(documents) = patch.documents {
        for incoming in documents {
            let existing = candidate
                .documents
                .iter_mut()
                .find(|d| d.id == incoming.id);
            match existing {
                Some(stored) => {
                    if let Err(err) = stored.apply_metadata_edit(&incoming, "documents", now) {
                        errors.push(err);
                    }
                }
                None => {
                    let mut fresh = incoming;
                    fresh.publish_on_append(now);
                    candidate.documents.push(fresh);
                }
            }
        }
    }

    if errors.is_empty() {
        Ok(patch.status)
    } else {
        Err(OversightError::Validation(errors))
    }
}

fn replace_unpublished<T: Publishable>(
    slot: &mut Option<T>,
    incoming: T,
    field: &str,
    errors: &mut Vec<ValidationError>,
) {
    if slot.as_ref().and_then(Publishable::date_published).is_some() {
        errors.push(ValidationError::PublishedImmutable {
            field: field.to_string(),
        });
    } else {
        *slot = Some(incoming);
    }
}

/// Whole-candidate invariants: every back-reference resolves inside the
/// aggregate and every document reference is well-formed.
fn validate_aggregate(candidate: &Monitoring) -> Vec<ValidationError> {
    let mut errors = Vec::new();

    for (field, party_id) in candidate.related_party_references() {
        if !candidate.has_party(party_id) {
            errors.push(ValidationError::UnresolvedPartyReference {
                field,
                reference: party_id.to_string(),
            });
        }
    }

    let mut check_docs = |field: &str, documents: &[Document]| {
        for (index, document) in documents.iter().enumerate() {
            if let Err(err) = document.validate_hash(&format!("{field}[{index}]")) {
                errors.push(err);
            }
        }
    };

    check_docs("documents", &candidate.documents);
    if let Some(decision) = &candidate.decision {
        check_docs("decision.documents", &decision.documents);
    }
    if let Some(conclusion) = &candidate.conclusion {
        check_docs("conclusion.documents", &conclusion.documents);
    }
    if let Some(cancellation) = &candidate.cancellation {
        check_docs("cancellation.documents", &cancellation.documents);
    }
    if let Some(report) = &candidate.elimination_report {
        check_docs("eliminationReport.documents", &report.documents);
    }
    if let Some(resolution) = &candidate.elimination_resolution {
        check_docs("eliminationResolution.documents", &resolution.documents);
    }
    if let Some(appeal) = &candidate.appeal {
        check_docs("appeal.documents", &appeal.documents);
    }
    for (index, liability) in candidate.liabilities.iter().enumerate() {
        check_docs(&format!("liabilities[{index}].documents"), &liability.documents);
    }
    for (index, post) in candidate.posts.iter().enumerate() {
        check_docs(&format!("posts[{index}].documents"), &post.documents);
    }

    errors
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn auditor() -> Actor {
        Actor::new(Role::Auditor, "sas")
    }

    fn engine() -> OversightEngine {
        OversightEngine::in_memory(EngineConfig::default())
    }

    fn create_payload() -> CreateMonitoring {
        serde_json::from_value(json!({
            "tenderId": "tender-1",
            "reasons": ["indicator"]
        }))
        .unwrap()
    }

    #[test]
    fn test_public_cannot_create() {
        let err = engine()
            .create_monitoring(create_payload(), &Actor::new(Role::Public, "anon"))
            .unwrap_err();
        assert!(err.is_access());
    }

    #[test]
    fn test_create_requires_tender_and_reasons() {
        let payload: CreateMonitoring =
            serde_json::from_value(json!({ "tenderId": " ", "reasons": [] })).unwrap();
        let err = engine().create_monitoring(payload, &auditor()).unwrap_err();

        let entries = err.entries();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].field, "tenderId");
        assert_eq!(entries[1].field, "reasons");
    }

    #[test]
    fn test_create_assigns_case_numbers_from_shared_counter() {
        let engine = engine();
        let first = engine
            .create_monitoring(create_payload(), &auditor())
            .unwrap();
        let second = engine
            .create_monitoring(create_payload(), &auditor())
            .unwrap();

        crate::ids::validate_case_number(&first.case_number).unwrap();
        assert!(first.case_number.ends_with("000001"));
        assert!(second.case_number.ends_with("000002"));
        assert_eq!(first.status, MonitoringStatus::Draft);
    }

    #[test]
    fn test_patch_rejects_whole_body_on_any_bad_field() {
        let engine = engine();
        let case = engine
            .create_monitoring(create_payload(), &auditor())
            .unwrap();

        let err = engine
            .patch_monitoring(
                case.id,
                &case.rev,
                json!({"reasons": ["media"], "conclusion": {"violationOccurred": false}}),
                &auditor(),
            )
            .unwrap_err();
        assert!(err.is_access());

        // Nothing was written.
        let stored = engine.store().get(case.id).unwrap();
        assert_eq!(stored, case);
    }

    #[test]
    fn test_patch_unknown_field_is_validation() {
        let engine = engine();
        let case = engine
            .create_monitoring(create_payload(), &auditor())
            .unwrap();

        let err = engine
            .patch_monitoring(case.id, &case.rev, json!({"rev": "1-abc"}), &auditor())
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn test_unresolved_related_party_is_rejected() {
        let engine = engine();
        let case = engine
            .create_monitoring(create_payload(), &auditor())
            .unwrap();

        let err = engine
            .patch_monitoring(
                case.id,
                &case.rev,
                json!({"decision": {
                    "description": "grounds",
                    "date": "2026-08-08T10:00:00Z",
                    "relatedParty": uuid::Uuid::new_v4()
                }}),
                &auditor(),
            )
            .unwrap_err();

        let entries = err.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].field, "decision.relatedParty");
    }

    #[test]
    fn test_stage_document_carries_custody_reference() {
        let engine = engine();
        let document = engine.stage_document(b"protocol", "application/pdf", "protocol.pdf");
        document.validate_hash("documents").unwrap();
        assert_eq!(document.format, "application/pdf");
    }
}
