//! Carry-over penalties from unresolved narrative tensions.

use serde::{Deserialize, Serialize};

use crate::cause::{Code, Entry};
use crate::diff::Diff;
use crate::fixed::clamp_meter;

pub const FATIGUE: &str = "fatigue";
pub const UNFINISHED_ASSIGNMENT: &str = "unfinished_assignment";

const PENALTY_PER_SEVERITY: i32 = 5;

/// A narrative condition that keeps applying penalties until resolved elsewhere.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedTension {
    pub key: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub severity: Option<i32>,
}

impl UnresolvedTension {
    pub fn new(key: impl Into<String>, severity: Option<i32>) -> Self {
        Self {
            key: key.into(),
            severity,
        }
    }

    pub fn severity(&self) -> i32 {
        self.severity.unwrap_or(1).max(0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    pub energy: i32,
    pub stress: i32,
}

/// Apply every recognized tension to the baseline, clamping once at the end.
///
/// Penalties are summed before clamping so the result does not depend on the
/// order of `tensions`. Unrecognized keys are skipped.
pub fn apply_tension_penalties(baseline: Baseline, tensions: &[UnresolvedTension]) -> Baseline {
    let (energy_penalty, stress_penalty) = tension_totals(tensions);
    Baseline {
        energy: clamp_meter(baseline.energy.saturating_sub(energy_penalty)),
        stress: clamp_meter(baseline.stress.saturating_add(stress_penalty)),
    }
}

/// Summed penalties. Every term is non-negative, so saturating keeps the sum
/// order-independent.
fn tension_totals(tensions: &[UnresolvedTension]) -> (i32, i32) {
    let mut energy_penalty: i32 = 0;
    let mut stress_penalty: i32 = 0;
    for tension in tensions {
        let penalty = PENALTY_PER_SEVERITY.saturating_mul(tension.severity());
        match tension.key.as_str() {
            FATIGUE => energy_penalty = energy_penalty.saturating_add(penalty),
            UNFINISHED_ASSIGNMENT => stress_penalty = stress_penalty.saturating_add(penalty),
            _ => {}
        }
    }
    (energy_penalty, stress_penalty)
}

/// Apply penalties and describe the effective change.
pub fn tension_diff(baseline: Baseline, tensions: &[UnresolvedTension]) -> (Baseline, Diff) {
    let next = apply_tension_penalties(baseline, tensions);
    let mut diff = Diff::default();
    let energy_delta = next.energy - clamp_meter(baseline.energy);
    if energy_delta != 0 {
        diff.record_energy_delta(energy_delta);
        diff.record_cause(Entry::new(
            "energy",
            Code::TensionFatigue,
            Some(format!("delta={}", energy_delta)),
        ));
    }
    let stress_delta = next.stress - clamp_meter(baseline.stress);
    if stress_delta != 0 {
        diff.record_stress_delta(stress_delta);
        diff.record_cause(Entry::new(
            "stress",
            Code::TensionUnfinishedAssignment,
            Some(format!("delta={}", stress_delta)),
        ));
    }
    (next, diff)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn baseline() -> Baseline {
        Baseline {
            energy: 80,
            stress: 30,
        }
    }

    #[test]
    fn fatigue_and_assignment_apply() {
        let tensions = vec![
            UnresolvedTension::new(FATIGUE, Some(2)),
            UnresolvedTension::new(UNFINISHED_ASSIGNMENT, None),
        ];
        let next = apply_tension_penalties(baseline(), &tensions);
        assert_eq!(next, Baseline { energy: 70, stress: 35 });
    }

    #[test]
    fn penalties_commute() {
        let forward = vec![
            UnresolvedTension::new(FATIGUE, Some(2)),
            UnresolvedTension::new(UNFINISHED_ASSIGNMENT, Some(1)),
        ];
        let reversed: Vec<_> = forward.iter().rev().cloned().collect();
        assert_eq!(
            apply_tension_penalties(baseline(), &forward),
            apply_tension_penalties(baseline(), &reversed)
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let tensions = vec![UnresolvedTension::new("lost_keys", Some(9))];
        assert_eq!(apply_tension_penalties(baseline(), &tensions), baseline());
    }

    #[test]
    fn penalties_accumulate_before_clamping() {
        let low = Baseline { energy: 8, stress: 97 };
        let tensions = vec![
            UnresolvedTension::new(FATIGUE, Some(1)),
            UnresolvedTension::new(FATIGUE, Some(1)),
            UnresolvedTension::new(UNFINISHED_ASSIGNMENT, Some(3)),
        ];
        let (next, diff) = tension_diff(low, &tensions);
        assert_eq!(next, Baseline { energy: 0, stress: 100 });
        assert_eq!(diff.energy, -8);
        assert_eq!(diff.stress, 3);
    }

    #[test]
    fn extreme_severities_saturate() {
        let tensions = vec![
            UnresolvedTension::new(FATIGUE, Some(i32::MAX)),
            UnresolvedTension::new(FATIGUE, Some(i32::MAX)),
            UnresolvedTension::new(UNFINISHED_ASSIGNMENT, Some(i32::MAX)),
        ];
        let (next, diff) = tension_diff(baseline(), &tensions);
        assert_eq!(next, Baseline { energy: 0, stress: 100 });
        assert_eq!(diff.energy, -80);
        assert_eq!(diff.stress, 70);

        let wild = Baseline {
            energy: i32::MIN,
            stress: i32::MAX,
        };
        assert_eq!(
            apply_tension_penalties(wild, &tensions),
            Baseline { energy: 0, stress: 100 }
        );
    }

    proptest! {
        #[test]
        fn any_severity_and_baseline_stays_in_bounds(
            severities in proptest::collection::vec((any::<bool>(), proptest::option::of(any::<i32>())), 0..8),
            energy in any::<i32>(),
            stress in any::<i32>(),
        ) {
            let tensions: Vec<_> = severities
                .iter()
                .map(|(fatigue, severity)| {
                    let key = if *fatigue { FATIGUE } else { UNFINISHED_ASSIGNMENT };
                    UnresolvedTension::new(key, *severity)
                })
                .collect();
            let mut reversed = tensions.clone();
            reversed.reverse();
            let start = Baseline { energy, stress };
            let (next, _) = tension_diff(start, &tensions);
            prop_assert!((0..=100).contains(&next.energy));
            prop_assert!((0..=100).contains(&next.stress));
            prop_assert_eq!(next, apply_tension_penalties(start, &reversed));
        }

        #[test]
        fn order_never_matters(
            severities in proptest::collection::vec((any::<bool>(), proptest::option::of(-2i32..6)), 0..8),
            energy in 0i32..=100,
            stress in 0i32..=100,
        ) {
            let tensions: Vec<_> = severities
                .iter()
                .map(|(fatigue, severity)| {
                    let key = if *fatigue { FATIGUE } else { UNFINISHED_ASSIGNMENT };
                    UnresolvedTension::new(key, *severity)
                })
                .collect();
            let mut reversed = tensions.clone();
            reversed.reverse();
            let start = Baseline { energy, stress };
            prop_assert_eq!(
                apply_tension_penalties(start, &tensions),
                apply_tension_penalties(start, &reversed)
            );
        }
    }
}
