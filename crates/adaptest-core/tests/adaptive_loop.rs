//! End-to-end tests of the adaptive loop driven through the session service.
//!
//! A deterministic simulated learner answers correctly exactly when their
//! true ability is at least the item difficulty.

use std::collections::HashSet;

use adaptest_core::config::EngineConfig;
use adaptest_core::engine::{CatEngine, NextStep, SessionOverrides};
use adaptest_core::model::{Item, KnowledgeLevel, KnowledgePoint, SessionStatus, Submission};
use adaptest_core::stopping::StopReason;
use adaptest_core::store::{InMemorySessionStore, SessionService};

fn make_service() -> SessionService<InMemorySessionStore> {
    SessionService::new(
        CatEngine::new(EngineConfig::default()).unwrap(),
        InMemorySessionStore::new(),
    )
}

fn make_pool() -> Vec<Item> {
    (0..120)
        .map(|i| {
            let difficulty = -3.0 + i as f64 * 0.05;
            let kp = ["counting", "addition", "fractions", "algebra"][i % 4];
            Item::new(format!("item-{i:03}"), difficulty, kp).with_discrimination(1.2)
        })
        .collect()
}

fn make_knowledge_points() -> Vec<KnowledgePoint> {
    let mut counting = KnowledgePoint::new("counting");
    counting.level = Some(KnowledgeLevel::Foundational);
    counting.is_core = true;
    let mut addition = KnowledgePoint::new("addition");
    addition.level = Some(KnowledgeLevel::Foundational);
    addition.prerequisites = vec!["counting".into()];
    let mut fractions = KnowledgePoint::new("fractions");
    fractions.level = Some(KnowledgeLevel::Applied);
    fractions.prerequisites = vec!["addition".into()];
    let mut algebra = KnowledgePoint::new("algebra");
    algebra.level = Some(KnowledgeLevel::Synthesis);
    algebra.importance = Some(0.8);
    algebra.prerequisites = vec!["fractions".into()];
    vec![counting, addition, fractions, algebra]
}

/// Run a session to completion, returning the administered item ids.
fn run_to_completion(
    service: &SessionService<InMemorySessionStore>,
    true_theta: f64,
    overrides: &SessionOverrides,
) -> (adaptest_core::model::SessionId, Vec<String>) {
    let pool = make_pool();
    let kps = make_knowledge_points();
    let id = service.start(overrides).unwrap().id();
    let mut administered = Vec::new();

    loop {
        let item = match service.next_item(id, &pool, &kps).unwrap() {
            NextStep::Item(selection) => selection.item.clone(),
            NextStep::Finished(_) => break,
        };
        let correct = true_theta >= item.difficulty;
        service
            .record_answer(id, &item, &Submission::new(&item.id, correct).with_time(20))
            .unwrap();
        administered.push(item.id);
        assert!(administered.len() <= 30, "session exceeded max_items");
    }

    (id, administered)
}

#[test]
fn estimate_tracks_true_ability() {
    let service = make_service();
    let mut estimates = Vec::new();
    for true_theta in [-1.5, 1.2] {
        let (id, administered) =
            run_to_completion(&service, true_theta, &SessionOverrides::default());
        let session = service.get(id).unwrap();
        assert_eq!(session.status(), SessionStatus::Completed);
        assert!(administered.len() >= 10);
        let theta = session.ability().theta;
        assert!(
            (theta - true_theta).abs() < 1.5,
            "true {true_theta}, estimated {theta}"
        );
        assert!(session.ability().standard_error < 1.0);
        estimates.push(theta);
    }
    assert!(estimates[0] < estimates[1]);
}

#[test]
fn no_item_is_administered_twice() {
    let service = make_service();
    let (_, administered) = run_to_completion(&service, 0.7, &SessionOverrides::default());
    let unique: HashSet<&String> = administered.iter().collect();
    assert_eq!(unique.len(), administered.len());
}

#[test]
fn every_knowledge_point_is_covered() {
    let service = make_service();
    let (id, _) = run_to_completion(&service, 0.3, &SessionOverrides::default());
    let report = service.finalize(id).unwrap();
    assert_eq!(report.knowledge_points.len(), 4);
    assert_eq!(report.average_time_seconds, Some(20.0));
}

#[test]
fn max_items_bounds_the_session() {
    let service = make_service();
    let overrides = SessionOverrides {
        min_items: Some(4),
        max_items: Some(6),
        target_precision: Some(0.05),
        ..Default::default()
    };
    let (id, administered) = run_to_completion(&service, 0.0, &overrides);
    assert_eq!(administered.len(), 6);
    let session = service.get(id).unwrap();
    assert_eq!(session.stop_reason(), Some(StopReason::MaxItemsReached));
}

#[test]
fn finalize_returns_the_stored_report() {
    let service = make_service();
    let (id, administered) = run_to_completion(&service, -0.4, &SessionOverrides::default());
    let first = service.finalize(id).unwrap();
    let second = service.finalize(id).unwrap();
    assert_eq!(first, second);
    assert_eq!(first.total, administered.len());
}

#[test]
fn sessions_are_independent() {
    let service = make_service();
    let pool = make_pool();
    let a = service.start(&SessionOverrides::default()).unwrap().id();
    let b = service.start(&SessionOverrides::default()).unwrap().id();

    let first_a = match service.next_item(a, &pool, &[]).unwrap() {
        NextStep::Item(s) => s.item.clone(),
        NextStep::Finished(_) => panic!("expected an item"),
    };
    service
        .record_answer(a, &first_a, &Submission::new(&first_a.id, true))
        .unwrap();

    let session_b = service.get(b).unwrap();
    assert!(session_b.responses().is_empty());
    assert!(!session_b.is_used(&first_a.id));
    match service.next_item(b, &pool, &[]).unwrap() {
        NextStep::Item(s) => assert_eq!(s.item.id, first_a.id),
        NextStep::Finished(_) => panic!("expected an item"),
    }
}
