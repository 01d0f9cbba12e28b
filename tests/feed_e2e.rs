use std::collections::HashSet;
use std::time::Duration;

use serde_json::json;

use oversight::{
    Actor, EngineConfig, FeedCursor, FeedMode, MonitoringId, OversightEngine, Partition, Role,
};

fn auditor() -> Actor {
    Actor::new(Role::Auditor, "sas")
}

fn create_case(engine: &OversightEngine, index: usize, is_test: bool) -> oversight::Monitoring {
    engine
        .create_monitoring(
            serde_json::from_value(json!({
                "tenderId": format!("tender-{index}"),
                "reasons": ["indicator"],
                "isTest": is_test,
            }))
            .unwrap(),
            &auditor(),
        )
        .unwrap()
}

fn activate(engine: &OversightEngine, case: &oversight::Monitoring) -> oversight::Monitoring {
    engine
        .patch_monitoring(
            case.id,
            &case.rev,
            json!({
                "status": "active",
                "decision": {"description": "grounds", "date": "2026-08-01T09:00:00Z"}
            }),
            &auditor(),
        )
        .unwrap()
}

#[test]
fn sequence_feed_is_exactly_once_under_interleaved_writes() {
    let engine = OversightEngine::in_memory(EngineConfig::default());

    let mut active_ids = HashSet::new();
    for index in 0..7 {
        let case = create_case(&engine, index, false);
        let case = activate(&engine, &case);
        active_ids.insert(case.id);
    }

    // Page through "real" two at a time, writing unrelated aggregates
    // between pages.
    let mut cursor: Option<FeedCursor> = None;
    let mut seen: Vec<(MonitoringId, u64)> = Vec::new();
    let mut interleaved = 0usize;
    loop {
        let page = engine
            .feed(Partition::Real, FeedMode::Sequence, cursor, 2, Role::Public)
            .unwrap();
        if page.items.is_empty() {
            break;
        }
        for item in &page.items {
            seen.push((item.id, item.sequence));
        }
        cursor = page.next_cursor;

        // Interleave: new drafts (not in "real") and test cases must not
        // disturb the pagination.
        if interleaved < 3 {
            create_case(&engine, 100 + interleaved, interleaved % 2 == 0);
            interleaved += 1;
        }
    }

    let ids: HashSet<MonitoringId> = seen.iter().map(|(id, _)| *id).collect();
    assert_eq!(ids, active_ids, "every matching aggregate exactly once");
    assert_eq!(ids.len(), seen.len(), "no previously-returned item reappears");
    for pair in seen.windows(2) {
        assert!(pair[0].1 < pair[1].1, "strictly ascending by sequence");
    }
}

#[test]
fn rewritten_aggregate_moves_to_the_feed_tail() {
    let engine = OversightEngine::in_memory(EngineConfig::default());

    let a = activate(&engine, &create_case(&engine, 0, false));
    let b = activate(&engine, &create_case(&engine, 1, false));

    let page = engine
        .feed(Partition::Real, FeedMode::Sequence, None, 10, Role::Public)
        .unwrap();
    assert_eq!(
        page.items.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![a.id, b.id]
    );

    // Writing `a` again re-emits it after `b`.
    engine
        .patch_monitoring(
            a.id,
            &a.rev,
            json!({"posts": [{"title": "note", "description": "ping"}]}),
            &auditor(),
        )
        .unwrap();

    let page = engine
        .feed(Partition::Real, FeedMode::Sequence, None, 10, Role::Public)
        .unwrap();
    assert_eq!(
        page.items.iter().map(|i| i.id).collect::<Vec<_>>(),
        vec![b.id, a.id]
    );
}

#[test]
fn partitions_filter_by_status_and_mode() {
    let engine = OversightEngine::in_memory(EngineConfig::default());

    let draft = create_case(&engine, 0, false);
    let real = activate(&engine, &create_case(&engine, 1, false));
    let test = activate(&engine, &create_case(&engine, 2, true));

    let real_page = engine
        .feed(Partition::Real, FeedMode::Sequence, None, 10, Role::Public)
        .unwrap();
    assert_eq!(real_page.items.len(), 1);
    assert_eq!(real_page.items[0].id, real.id);

    let test_page = engine
        .feed(Partition::Test, FeedMode::Sequence, None, 10, Role::Public)
        .unwrap();
    assert_eq!(test_page.items.len(), 1);
    assert_eq!(test_page.items[0].id, test.id);

    let all_page = engine
        .feed(Partition::All, FeedMode::Sequence, None, 10, Role::Public)
        .unwrap();
    assert_eq!(all_page.items.len(), 2);

    let privileged = engine
        .feed(
            Partition::AllWithDraft,
            FeedMode::Sequence,
            None,
            10,
            Role::Auditor,
        )
        .unwrap();
    assert_eq!(privileged.items.len(), 3);
    assert!(privileged.items.iter().any(|i| i.id == draft.id));
}

#[test]
fn draft_inclusive_partitions_are_privileged() {
    let engine = OversightEngine::in_memory(EngineConfig::default());

    for role in [Role::Public, Role::TenderOwner] {
        let err = engine
            .feed(
                Partition::RealWithDraft,
                FeedMode::Sequence,
                None,
                10,
                role,
            )
            .unwrap_err();
        assert!(err.is_access());
    }

    engine
        .feed(
            Partition::RealWithDraft,
            FeedMode::Sequence,
            None,
            10,
            Role::Administrator,
        )
        .unwrap();
}

#[test]
fn timestamp_feed_serves_dashboards() {
    let engine = OversightEngine::in_memory(EngineConfig::default());

    for index in 0..4 {
        activate(&engine, &create_case(&engine, index, false));
    }

    let page = engine
        .feed(Partition::Real, FeedMode::Timestamp, None, 10, Role::Public)
        .unwrap();
    assert_eq!(page.items.len(), 4);
    for pair in page.items.windows(2) {
        assert!(pair[0].date_modified <= pair[1].date_modified);
    }

    // Resuming from the tied tail cursor may repeat the tail item; that
    // is the documented trade-off of the timestamp mode.
    let resumed = engine
        .feed(
            Partition::Real,
            FeedMode::Timestamp,
            page.next_cursor,
            10,
            Role::Public,
        )
        .unwrap();
    assert!(!resumed.items.is_empty());
}

#[test]
fn change_stream_delivers_matching_commits() {
    let engine = OversightEngine::in_memory(EngineConfig::default());
    let stream = engine.subscribe(Partition::Real);

    let case = create_case(&engine, 0, false); // draft: filtered out
    let case = activate(&engine, &case); // active: delivered

    let event = stream
        .recv_timeout(Duration::from_secs(1))
        .expect("activation event");
    assert_eq!(event.id, case.id);
    assert_eq!(event.sequence, case.sequence);
    assert!(stream.try_recv().is_none());
}
