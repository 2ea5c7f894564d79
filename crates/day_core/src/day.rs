//! Day rollover pipeline.
//!
//! Runs the rules in the order a daily run resolves them:
//! allocation effects, chosen storylet outcomes, overnight recovery, tension
//! penalties, then vector growth. Each stage contributes to one aggregate
//! [`Diff`] and, when the trace is enabled, one trace event.

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::allocation::{allocation_diff, Allocation, Posture};
use crate::cause::Code;
use crate::diff::Diff;
use crate::end_of_day::{resolve_end_of_day, EndOfDay};
use crate::reduce::apply_outcome;
use crate::state::{DailyState, Outcome};
use crate::tension::{tension_diff, Baseline, UnresolvedTension};
use crate::trace::ResourceTrace;
use crate::vectors::{allocation_vector_deltas, flag_vector_deltas, ChoiceFlags};

/// End-of-day stress at or above this earns a chronicle line.
const HEAVY_STRESS_NOTE: i32 = 80;

/// Inputs gathered over one day of play.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayPlan {
    #[serde(default)]
    pub allocation: Option<Allocation>,
    #[serde(default)]
    pub posture: Posture,
    #[serde(default)]
    pub tensions: Vec<UnresolvedTension>,
    #[serde(default)]
    pub flags: Option<ChoiceFlags>,
    /// Outcomes of storylet choices made during the day, in play order.
    #[serde(default)]
    pub outcomes: Vec<Outcome>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct DayTransition {
    pub end: EndOfDay,
    pub next: DailyState,
    pub diff: Diff,
    pub chronicle: Vec<String>,
}

fn stage(
    trace: &mut Option<&mut ResourceTrace>,
    before: &DailyState,
    after: &DailyState,
    source: &str,
    diff: &Diff,
) {
    if let Some(trace) = trace.as_deref_mut() {
        trace.record(
            before.day_index,
            source,
            diff,
            before.resource_snapshot(),
            after.resource_snapshot(),
            Some(json!({
                "energy": [before.energy, after.energy],
                "stress": [before.stress, after.stress],
            })),
        );
    }
}

/// Resolve one day and produce the next day's starting state.
pub fn advance_day(
    state: &DailyState,
    plan: &DayPlan,
    mut trace: Option<&mut ResourceTrace>,
) -> DayTransition {
    let mut aggregate = Diff::default();
    let mut chronicle = Vec::new();
    let mut current = state.clamped();

    if let Some(allocation) = &plan.allocation {
        let (meters, diff) = allocation_diff(current.energy, current.stress, allocation, plan.posture);
        let before = current.clone();
        current.energy = meters.energy;
        current.stress = meters.stress;
        stage(&mut trace, &before, &current, "allocation", &diff);
        aggregate.merge(&diff);
    }

    for outcome in &plan.outcomes {
        let (next, diff) = apply_outcome(&current, Some(outcome), Code::ChoiceOutcome);
        if diff.is_empty() {
            continue;
        }
        let next = next.into_owned();
        stage(&mut trace, &current, &next, "choice", &diff);
        aggregate.merge(&diff);
        current = next;
    }

    let end = resolve_end_of_day(current.energy, current.stress, plan.allocation.as_ref());
    let overnight = end.diff();
    let before = current.clone();
    current.energy = end.next_energy;
    current.stress = end.next_stress;
    stage(&mut trace, &before, &current, "end_of_day", &overnight);
    aggregate.merge(&overnight);
    if end.end_stress >= HEAVY_STRESS_NOTE {
        chronicle.push(format!(
            "Day {} ended under heavy stress ({}).",
            state.day_index, end.end_stress
        ));
    }

    let (baseline, penalties) = tension_diff(
        Baseline {
            energy: current.energy,
            stress: current.stress,
        },
        &plan.tensions,
    );
    if !penalties.is_empty() {
        let before = current.clone();
        current.energy = baseline.energy;
        current.stress = baseline.stress;
        stage(&mut trace, &before, &current, "tension", &penalties);
        aggregate.merge(&penalties);
        chronicle.push(format!(
            "Unresolved tensions carried into day {}.",
            state.day_index.saturating_add(1)
        ));
    }

    let vector_sources = [
        (
            plan.allocation.as_ref().map(allocation_vector_deltas),
            Code::AllocationVector,
            "allocation_vectors",
        ),
        (
            Some(flag_vector_deltas(plan.flags.as_ref())),
            Code::ChoiceFlagVector,
            "flag_vectors",
        ),
    ];
    for (deltas, code, source) in vector_sources {
        let Some(vectors) = deltas.filter(|deltas| !deltas.is_empty()) else {
            continue;
        };
        let outcome = Outcome {
            vectors,
            ..Outcome::default()
        };
        let (next, diff) = apply_outcome(&current, Some(&outcome), code);
        let next = next.into_owned();
        stage(&mut trace, &current, &next, source, &diff);
        aggregate.merge(&diff);
        current = next;
    }

    current.day_index = state.day_index.saturating_add(1);

    DayTransition {
        end,
        next: current,
        diff: aggregate,
        chronicle,
    }
}
