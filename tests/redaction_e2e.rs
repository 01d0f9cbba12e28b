use serde_json::json;

use oversight::access::REDACTION_PLACEHOLDER;
use oversight::{Actor, EngineConfig, OversightEngine, Role};

fn auditor() -> Actor {
    Actor::new(Role::Auditor, "sas")
}

fn confidential_active_case(engine: &OversightEngine) -> oversight::Monitoring {
    let case = engine
        .create_monitoring(
            serde_json::from_value(json!({
                "tenderId": "tender-1",
                "reasons": ["indicator"],
                "confidential": true,
            }))
            .unwrap(),
            &auditor(),
        )
        .unwrap();

    engine
        .patch_monitoring(
            case.id,
            &case.rev,
            json!({
                "status": "active",
                "decision": {"description": "classified grounds", "date": "2026-08-01T09:00:00Z"}
            }),
            &auditor(),
        )
        .unwrap()
}

#[test]
fn same_revision_projects_differently_per_role() {
    let engine = OversightEngine::in_memory(EngineConfig::default());
    let case = confidential_active_case(&engine);

    let public_view = engine
        .get_monitoring(case.id, &Actor::new(Role::Public, "anon"))
        .unwrap();
    let privileged_view = engine.get_monitoring(case.id, &auditor()).unwrap();

    assert_eq!(
        public_view["decision"]["description"],
        json!(REDACTION_PLACEHOLDER)
    );
    assert_eq!(
        privileged_view["decision"]["description"],
        json!("classified grounds")
    );

    // Both projections come from the same stored revision.
    assert_eq!(public_view["rev"], privileged_view["rev"]);
}

#[test]
fn repeated_reads_never_mutate_stored_data() {
    let engine = OversightEngine::in_memory(EngineConfig::default());
    let case = confidential_active_case(&engine);
    let anon = Actor::new(Role::Public, "anon");

    let before = engine.store().get(case.id).unwrap();
    let first = engine.get_monitoring(case.id, &anon).unwrap();
    let second = engine.get_monitoring(case.id, &anon).unwrap();
    let after = engine.store().get(case.id).unwrap();

    assert_eq!(first, second);
    assert_eq!(before, after);
    assert_eq!(
        after.decision.as_ref().unwrap().description,
        "classified grounds"
    );
}

#[test]
fn unflagged_case_is_fully_public() {
    let engine = OversightEngine::in_memory(EngineConfig::default());
    let case = engine
        .create_monitoring(
            serde_json::from_value(json!({
                "tenderId": "tender-2",
                "reasons": ["media"],
            }))
            .unwrap(),
            &auditor(),
        )
        .unwrap();
    let case = engine
        .patch_monitoring(
            case.id,
            &case.rev,
            json!({
                "status": "active",
                "decision": {"description": "open grounds", "date": "2026-08-01T09:00:00Z"}
            }),
            &auditor(),
        )
        .unwrap();

    let view = engine
        .get_monitoring(case.id, &Actor::new(Role::Public, "anon"))
        .unwrap();
    assert_eq!(view["decision"]["description"], json!("open grounds"));
}

#[test]
fn audit_log_is_privileged_reading() {
    let engine = OversightEngine::in_memory(EngineConfig::default());
    let case = confidential_active_case(&engine);

    let privileged_view = engine.get_monitoring(case.id, &auditor()).unwrap();
    assert!(privileged_view["revisions"].is_array());

    let public_view = engine
        .get_monitoring(case.id, &Actor::new(Role::Public, "anon"))
        .unwrap();
    assert!(public_view.get("revisions").is_none());
}

#[test]
fn drafts_are_invisible_to_non_privileged_readers() {
    let engine = OversightEngine::in_memory(EngineConfig::default());
    let case = engine
        .create_monitoring(
            serde_json::from_value(json!({
                "tenderId": "tender-3",
                "reasons": ["indicator"],
            }))
            .unwrap(),
            &auditor(),
        )
        .unwrap();

    let err = engine
        .get_monitoring(case.id, &Actor::new(Role::Public, "anon"))
        .unwrap_err();
    assert!(err.is_not_found());

    // The case owner of the audit sees their own draft.
    engine.get_monitoring(case.id, &auditor()).unwrap();
}

#[test]
fn owner_sees_substance_but_not_the_party_arena() {
    let engine = OversightEngine::in_memory(EngineConfig::default());
    let case = confidential_active_case(&engine);

    let case = engine
        .patch_monitoring(
            case.id,
            &case.rev,
            json!({"parties": [{"name": "responsible official"}]}),
            &auditor(),
        )
        .unwrap();

    let owner_view = engine
        .get_monitoring(case.id, &Actor::new(Role::TenderOwner, "broker-7"))
        .unwrap();
    assert_eq!(
        owner_view["decision"]["description"],
        json!("classified grounds")
    );
    assert_eq!(
        owner_view["parties"][0]["name"],
        json!(REDACTION_PLACEHOLDER)
    );
}
