//! Perception replies flowing through reconciliation, the session store,
//! the decision engine and the render planner.

mod common;

use std::sync::Arc;

use chrono::{TimeZone, Utc};
use common::{ScriptedGateway, frames};
use desk_tutor::{
    config::TutorConfig,
    decision::{Decision, DecisionConfig, DecisionEngine},
    gateway::ImageOptions,
    perception::{Reconciliation, RejectReason, reconcile},
    render::{DrawCommand, Point, plan},
    scheduler::{AnalysisCycle, CycleReport, SchedulerConfig},
    session::SessionStore,
};
use serde_json::{Value, json};

fn page_three() -> Value {
    json!({
        "page_id": "3",
        "active_problem_id": "1",
        "problems": [
            {"id": "1", "text": "3x=9", "bbox": [0.1, 0.1, 0.5, 0.2]},
            {"id": "2", "text": "2y+1=5", "bbox": [0.1, 0.4, 0.5, 0.5]}
        ],
        "dwell_seconds": 10,
        "is_writing": false,
        "answers": {"1": "x=3"}
    })
}

fn merged(result: Reconciliation) -> desk_tutor::perception::PerceptionSnapshot {
    match result {
        Reconciliation::Merged(snapshot) => snapshot,
        Reconciliation::Rejected(reason) => panic!("update rejected: {}", reason),
    }
}

fn cycle(gateway: Arc<ScriptedGateway>, store: Arc<SessionStore>) -> AnalysisCycle {
    let engine = DecisionEngine::new(gateway.clone(), DecisionConfig::default());
    AnalysisCycle::new(
        gateway,
        engine,
        store,
        ImageOptions::default(),
        &SchedulerConfig::default(),
    )
}

#[test]
fn test_check_mark_lands_under_problem_and_persists() {
    let at = Utc::now();
    let snapshot = merged(reconcile(None, Some(&page_three()), frames::DESK, at));
    assert_eq!(snapshot.page_id.as_deref(), Some("page3"));
    assert_eq!(snapshot.active_problem_id.as_deref(), Some("page3-problem1"));
    assert_eq!(snapshot.answer("page3-problem1"), Some("x=3"));

    let store = SessionStore::new();
    store.commit_perception(snapshot.clone());

    let gateway = ScriptedGateway::new([
        r#"{"checked_problems": [{"problem_id": "1", "is_correct": true}]}"#,
    ]);
    let engine = DecisionEngine::new(gateway.clone(), DecisionConfig::default());
    let verdict = engine.decide(&snapshot, &store.history_snapshot(), None, at);
    store.apply_verdict(verdict);
    assert!(matches!(store.current_decision(), Some(Decision::CheckAnswer { .. })));

    let expected = DrawCommand::Checkmark {
        at: Point { x: 64, y: 126 },
        size: 30,
        color: desk_tutor::render::Color::GREEN,
        thickness: 3,
    };
    assert!(plan(&store.view(), frames::DESK).contains(&expected));

    // Next pass: nothing pending, dwell short. The mark stays on the page.
    let verdict = engine.decide(&snapshot, &store.history_snapshot(), None, at);
    store.apply_verdict(verdict);
    assert_eq!(store.current_decision(), Some(Decision::no_interaction("dwell too short")));
    assert!(plan(&store.view(), frames::DESK).contains(&expected));
    assert_eq!(gateway.call_count(), 1);
}

#[test]
fn test_reconcile_is_idempotent() {
    let at = Utc.with_ymd_and_hms(2025, 3, 1, 9, 0, 0).unwrap();
    let raw = page_three();
    let once = merged(reconcile(None, Some(&raw), frames::DESK, at));
    let twice = merged(reconcile(Some(&once), Some(&raw), frames::DESK, at));
    assert_eq!(once, twice);
}

#[test]
fn test_answers_are_monotonic() {
    let at = Utc::now();
    let first = merged(reconcile(None, Some(&page_three()), frames::DESK, at));

    let later = json!({"answers": {"2": "y=2"}});
    let second = merged(reconcile(Some(&first), Some(&later), frames::DESK, at));
    assert_eq!(second.answer("page3-problem1"), Some("x=3"));
    assert_eq!(second.answer("page3-problem2"), Some("y=2"));

    let cleared = json!({"answers": {"1": null}});
    let third = merged(reconcile(Some(&second), Some(&cleared), frames::DESK, at));
    assert!(third.answers.contains_key("page3-problem1"));
    assert_eq!(third.answer("page3-problem1"), None);
}

#[test]
fn test_invalid_geometry_rejects_whole_update() {
    let at = Utc::now();
    let first = merged(reconcile(None, Some(&page_three()), frames::DESK, at));

    let bad = json!({
        "is_writing": true,
        "problems": [{"id": "1", "text": "3x=9", "bbox": [0.6, 0.1, 0.2, 0.3]}]
    });
    match reconcile(Some(&first), Some(&bad), frames::DESK, at) {
        Reconciliation::Rejected(RejectReason::InvalidGeometry { problem_id, .. }) => {
            assert_eq!(problem_id, "1");
        }
        other => panic!("expected geometry rejection, got {:?}", other),
    }
}

#[test]
fn test_cycle_keeps_snapshot_on_rejected_update() {
    let store = Arc::new(SessionStore::new());
    let gateway = ScriptedGateway::new([
        json!({
            "page_id": "1",
            "active_problem_id": "1",
            "problems": [{"id": "1", "text": "3x=9", "bbox": [0.1, 0.1, 0.5, 0.2]}],
            "dwell_seconds": 3,
            "is_writing": false
        })
        .to_string(),
        r#"{"problems": [{"id": "1", "bbox": [1.5, 0, 2, 1]}], "is_writing": true}"#.to_string(),
    ]);
    let cycle = cycle(gateway.clone(), store.clone());
    let frame = frames::solid(frames::DESK, 200, 1);

    let report = cycle.run(&frame);
    assert!(matches!(report, CycleReport::Decided { kind: "NO_INTERACTION", .. }));
    let before = store.view();

    let report = cycle.run(&frame);
    assert!(matches!(report, CycleReport::PerceptionRejected(_)));
    assert_eq!(store.view(), before);
    assert!(!store.perception_snapshot().unwrap().is_writing_now());
    assert!(gateway.calls().iter().all(|c| c.had_image));
}

#[test]
fn test_perception_failure_skips_decision() {
    let store = Arc::new(SessionStore::new());
    store.commit_decision(Decision::no_interaction("dwell too short"));
    let gateway = ScriptedGateway::new(Vec::<String>::new());
    let cycle = cycle(gateway.clone(), store.clone());

    let report = cycle.run(&frames::solid(frames::DESK, 10, 1));
    assert!(matches!(report, CycleReport::PerceptionFailed(_)));
    assert_eq!(gateway.call_count(), 1);
    assert_eq!(store.current_decision(), Some(Decision::no_interaction("dwell too short")));
}

#[test]
fn test_verification_feedback_reaches_next_perception_call() {
    let store = Arc::new(SessionStore::new());
    let gateway = ScriptedGateway::new([
        json!({"page_id": "1", "is_writing": false, "answers": {"1": "x=3"}}).to_string(),
        json!({
            "checked_problems": [{"problem_id": "1", "is_correct": true}],
            "perception_feedback": "problem 2 is below the fold"
        })
        .to_string(),
        json!({"is_writing": false}).to_string(),
    ]);
    let cycle = cycle(gateway.clone(), store.clone());
    let frame = frames::solid(frames::DESK, 90, 1);

    cycle.run(&frame);
    assert_eq!(store.perception_feedback().as_deref(), Some("problem 2 is below the fold"));

    cycle.run(&frame);
    let calls = gateway.calls();
    assert_eq!(calls.len(), 3);
    assert!(!calls[0].instruction.contains("below the fold"));
    assert!(calls[2].instruction.contains("problem 2 is below the fold"));
}

#[test]
fn test_config_drives_cycle_assembly() {
    let config = TutorConfig::from_lookup(|name| match name {
        "DASHSCOPE_API_KEY" => Some("sk-test-000000000000".to_string()),
        "TUTOR_MAX_TOKENS" => Some("512".to_string()),
        _ => None,
    })
    .unwrap();
    let gateway = ScriptedGateway::new([r#"{"is_writing": true}"#]);
    let cycle = desk_tutor::analysis_cycle(&config, gateway.clone());

    let report = cycle.run(&frames::solid(frames::DESK, 0, 1));
    assert!(matches!(report, CycleReport::Decided { kind: "CLEAR_PROJECTION", .. }));
    assert_eq!(gateway.calls()[0].max_output_tokens, 512);
}
