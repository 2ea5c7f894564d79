//! `proptest` strategies for the core value types.

use proptest::prelude::*;

use crate::allocation::{Allocation, Posture};
use crate::state::{DailyState, VectorKey};
use crate::tension::{UnresolvedTension, FATIGUE, UNFINISHED_ASSIGNMENT};

/// Allocations whose buckets sum to exactly 100.
pub fn allocation() -> impl Strategy<Value = Allocation> {
    (0i32..=100, 0i32..=100, 0i32..=100, 0i32..=100).prop_map(|(a, b, c, d)| {
        let mut cuts = [a, b, c, d];
        cuts.sort_unstable();
        Allocation::new(
            cuts[0],
            cuts[1] - cuts[0],
            cuts[2] - cuts[1],
            cuts[3] - cuts[2],
            100 - cuts[3],
        )
    })
}

pub fn posture() -> impl Strategy<Value = Posture> {
    prop_oneof![Just(Posture::Steady), Just(Posture::Push)]
}

pub fn vector_key() -> impl Strategy<Value = VectorKey> {
    proptest::sample::select(VectorKey::ALL.to_vec())
}

pub fn daily_state() -> impl Strategy<Value = DailyState> {
    (
        0u32..365,
        0i32..=100,
        0i32..=100,
        proptest::collection::btree_map(vector_key(), 0i32..=100, 0..4),
    )
        .prop_map(|(day_index, energy, stress, vectors)| {
            let mut state = DailyState::new(day_index, energy, stress);
            state.vectors = vectors;
            state
        })
}

/// Tensions drawn from the recognized keys plus one unknown key.
pub fn tension() -> impl Strategy<Value = UnresolvedTension> {
    (
        prop_oneof![
            Just(FATIGUE.to_string()),
            Just(UNFINISHED_ASSIGNMENT.to_string()),
            Just("unknown_tension".to_string()),
        ],
        proptest::option::of(0i32..5),
    )
        .prop_map(|(key, severity)| UnresolvedTension::new(key, severity))
}
