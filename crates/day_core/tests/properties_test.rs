use std::borrow::Cow;

use day_core::arc::{next_step, ArcContext, ArcDefinition, ArcStatus, ArcStep, UserArc};
use day_core::cause::Code;
use day_core::config::TraceConfig;
use day_core::storylet::{ContentPool, RunHistory, Storylet};
use day_core::trace::{ResourceTrace, TRACE_CAPACITY};
use day_core::{advance_day, apply_outcome, Allocation, DailyState, DayPlan, Requirement};
use proptest::prelude::*;
use serde_json::json;

proptest! {
    #[test]
    fn missing_outcome_never_changes_state(
        day in 0u32..365,
        energy in -50i32..150,
        stress in -50i32..150,
    ) {
        let state = DailyState::new(day, energy, stress);
        let (next, diff) = apply_outcome(&state, None, Code::ChoiceOutcome);
        prop_assert!(matches!(next, Cow::Borrowed(_)));
        prop_assert!(std::ptr::eq(next.as_ref(), &state));
        prop_assert!(diff.is_empty());
    }

    #[test]
    fn advanced_today_never_offers_a_step(
        day in 0u32..1_000,
        step_index in 0usize..3,
        started_offset in 0u32..50,
    ) {
        let definition = ArcDefinition {
            arc_id: "loop".into(),
            steps: vec![ArcStep::new("a"), ArcStep::new("b"), ArcStep::new("c")],
            payoff: None,
        };
        let pool = ContentPool::from_storylets(
            ["a", "b", "c"].into_iter().map(|slug| Storylet::new(slug, None)),
        )
        .expect("pool builds");
        let player = json!({});
        let history = RunHistory::new();
        let arc = UserArc {
            arc_id: "loop".into(),
            status: ArcStatus::Active,
            step_index,
            started_day_index: day.saturating_sub(started_offset),
            last_advanced_day_index: Some(day),
        };
        let ctx = ArcContext {
            current_day: day,
            pool: &pool,
            player_state: &player,
            history: &history,
            slots: None,
        };
        prop_assert!(next_step(&arc, &definition, &ctx).is_none());
    }
}

#[test]
fn empty_requirement_object_is_hidden() {
    let requirement: Requirement = serde_json::from_value(json!({})).expect("parses");
    assert!(!requirement.evaluate(&json!({"anything": true})));
}

#[test]
fn trace_buffers_are_isolated_and_bounded() {
    let mut trace = ResourceTrace::new(TraceConfig::enabled());
    let mut state = DailyState::new(0, 80, 10);
    let plan = DayPlan {
        allocation: Some(Allocation::new(30, 30, 10, 20, 10)),
        ..DayPlan::default()
    };
    for _ in 0..120 {
        state = advance_day(&state, &plan, Some(&mut trace)).next;
    }
    assert_eq!(trace.len(), TRACE_CAPACITY);
    assert_eq!(state.day_index, 120);
    assert!(ResourceTrace::new(TraceConfig::enabled()).is_empty());
}
