//! Lookup tables turning allocations and choice flags into vector deltas.

use std::collections::BTreeMap;

use crate::allocation::Allocation;
use crate::state::{VectorKey, VectorMap};

/// Boolean flags attached to a storylet choice, e.g. `{"research": true}`.
pub type ChoiceFlags = BTreeMap<String, bool>;

const STUDY_FOCUS_THRESHOLD: i32 = 40;
const WORK_AMBITION_THRESHOLD: i32 = 40;
const SOCIAL_THRESHOLD: i32 = 30;
const RESTORATIVE_STABILITY_THRESHOLD: i32 = 40;
const FUN_CURIOSITY_THRESHOLD: i32 = 30;

const FLAG_TABLE: &[(&str, &[(VectorKey, i32)])] = &[
    ("research", &[(VectorKey::Curiosity, 1), (VectorKey::Focus, 1)]),
    ("cautious", &[(VectorKey::Stability, 1)]),
    ("avoid", &[(VectorKey::Stability, 1), (VectorKey::Agency, -1)]),
    ("bold", &[(VectorKey::Agency, 1), (VectorKey::Ambition, 1)]),
    ("reflect", &[(VectorKey::Reflection, 1)]),
    ("reach_out", &[(VectorKey::Social, 1)]),
    ("network", &[(VectorKey::Social, 1), (VectorKey::Ambition, 1)]),
];

/// Sparse vector deltas triggered by the day's allocation. Vectors whose
/// threshold was not met are absent from the map.
pub fn allocation_vector_deltas(allocation: &Allocation) -> VectorMap {
    let mut deltas = VectorMap::new();
    if allocation.study >= STUDY_FOCUS_THRESHOLD {
        *deltas.entry(VectorKey::Focus).or_insert(0) += 1;
    }
    if allocation.work >= WORK_AMBITION_THRESHOLD {
        *deltas.entry(VectorKey::Ambition).or_insert(0) += 1;
    }
    if allocation.social >= SOCIAL_THRESHOLD {
        *deltas.entry(VectorKey::Social).or_insert(0) += 1;
    }
    if allocation.health.saturating_add(allocation.fun) >= RESTORATIVE_STABILITY_THRESHOLD {
        *deltas.entry(VectorKey::Stability).or_insert(0) += 1;
    }
    if allocation.fun >= FUN_CURIOSITY_THRESHOLD {
        *deltas.entry(VectorKey::Curiosity).or_insert(0) += 1;
    }
    deltas
}

/// Vector deltas for every flag set to `true`, summed per vector.
pub fn flag_vector_deltas(flags: Option<&ChoiceFlags>) -> VectorMap {
    let mut deltas = VectorMap::new();
    let Some(flags) = flags else {
        return deltas;
    };
    for (flag, effects) in FLAG_TABLE {
        if flags.get(*flag).copied().unwrap_or(false) {
            for (key, delta) in *effects {
                *deltas.entry(*key).or_insert(0) += *delta;
            }
        }
    }
    deltas.retain(|_, delta| *delta != 0);
    deltas
}
