use std::borrow::Cow;

use crate::cause::{Code, Entry};
use crate::diff::Diff;
use crate::fixed::{clamp_meter, commit_meter_delta};
use crate::state::{DailyState, Outcome};

/// Apply an optional outcome to `state`.
///
/// A missing outcome returns the borrowed input untouched together with an empty
/// [`Diff`]. Otherwise every requested delta is merged additively (missing map
/// keys start at zero) and each touched field is clamped to the meter range; the
/// returned diff holds the effective, post-clamp changes tagged with `code`.
/// Stored values outside the meter range are clamped before the delta lands.
pub fn apply_outcome<'a>(
    state: &'a DailyState,
    outcome: Option<&Outcome>,
    code: Code,
) -> (Cow<'a, DailyState>, Diff) {
    let Some(outcome) = outcome else {
        return (Cow::Borrowed(state), Diff::default());
    };

    let mut next = state.clone();
    let mut diff = Diff::default();

    let current = clamp_meter(next.energy);
    next.energy = commit_meter_delta(current, outcome.energy);
    if next.energy != current {
        diff.record_energy_delta(next.energy - current);
        diff.record_cause(Entry::new(
            "energy",
            code,
            Some(format!("requested={}", outcome.energy)),
        ));
    }

    let current = clamp_meter(next.stress);
    next.stress = commit_meter_delta(current, outcome.stress);
    if next.stress != current {
        diff.record_stress_delta(next.stress - current);
        diff.record_cause(Entry::new(
            "stress",
            code,
            Some(format!("requested={}", outcome.stress)),
        ));
    }

    for (key, delta) in &outcome.vectors {
        let current = clamp_meter(next.vector(*key));
        let value = commit_meter_delta(current, *delta);
        next.vectors.insert(*key, value);
        if value != current {
            diff.record_vector_delta(*key, value - current);
            diff.record_cause(Entry::new(format!("vector:{}", key), code, None));
        }
    }

    for (key, delta) in &outcome.resources {
        let current = clamp_meter(next.resource(*key));
        let value = commit_meter_delta(current, *delta);
        next.resources.insert(*key, value);
        if value != current {
            diff.record_resource_delta(*key, value - current);
            diff.record_cause(Entry::new(format!("resource:{}", key), code, None));
        }
    }

    (Cow::Owned(next), diff)
}

/// Replay an already-effective diff onto a state, clamping as a safety net.
pub fn apply_diff(state: &mut DailyState, diff: &Diff) {
    state.energy = commit_meter_delta(state.energy, diff.energy);
    state.stress = commit_meter_delta(state.stress, diff.stress);
    for entry in &diff.vectors {
        let current = state.vector(entry.key);
        state
            .vectors
            .insert(entry.key, commit_meter_delta(current, entry.delta));
    }
    for entry in &diff.resources {
        let current = state.resource(entry.key);
        state
            .resources
            .insert(entry.key, commit_meter_delta(current, entry.delta));
    }
}
