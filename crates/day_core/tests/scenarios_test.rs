use day_core::arc::{next_step, ArcContext, ArcDefinition, ArcStatus, ArcStep, UserArc};
use day_core::storylet::{ContentPool, RunHistory, Storylet};
use day_core::{
    apply_allocation_to_day_state, can_level_skill, resolve_end_of_day, skill_cost_for_level,
    Allocation, EndOfDay, Posture,
};
use serde_json::json;

const DAY_ALLOCATION: Allocation = Allocation::new(40, 20, 10, 20, 10);

#[test]
fn end_of_day_reference() {
    let resolved = resolve_end_of_day(70, 20, Some(&DAY_ALLOCATION));
    assert_eq!(
        resolved,
        EndOfDay {
            end_energy: 70,
            end_stress: 20,
            next_energy: 86,
            next_stress: 13,
        }
    );
    let value = serde_json::to_value(resolved).expect("serializes");
    assert_eq!(
        value,
        json!({"endEnergy": 70, "endStress": 20, "nextEnergy": 86, "nextStress": 13})
    );
}

#[test]
fn same_day_allocation_reference() {
    let meters = apply_allocation_to_day_state(70, 20, &DAY_ALLOCATION, Posture::Steady);
    assert_eq!((meters.energy, meters.stress), (61, 24));
}

#[test]
fn skill_curve_reference() {
    assert_eq!(skill_cost_for_level(1), 2);
    assert_eq!(skill_cost_for_level(2), 3);
    assert_eq!(skill_cost_for_level(3), 6);
    assert!(!can_level_skill(0, 1));
    assert!(can_level_skill(0, 2));
}

#[test]
fn arc_reference_single_advance_per_day() {
    let definition = ArcDefinition {
        arc_id: "first_week".into(),
        steps: vec![ArcStep::new("first_week_intro"), ArcStep::new("first_week_exam")],
        payoff: None,
    };
    let pool = ContentPool::from_storylets([Storylet::new("first_week_intro", None)])
        .expect("pool builds");
    let player = json!({});
    let history = RunHistory::new();

    let mut arc = UserArc {
        arc_id: "first_week".into(),
        status: ArcStatus::Active,
        step_index: 0,
        started_day_index: 2,
        last_advanced_day_index: None,
    };
    let day_two = ArcContext {
        current_day: 2,
        pool: &pool,
        player_state: &player,
        history: &history,
        slots: None,
    };
    let step = next_step(&arc, &definition, &day_two).expect("first step offered");
    assert_eq!(step.slug, "first_week_intro");

    arc.last_advanced_day_index = Some(3);
    let day_three = ArcContext {
        current_day: 3,
        ..day_two
    };
    assert!(next_step(&arc, &definition, &day_three).is_none());
}
