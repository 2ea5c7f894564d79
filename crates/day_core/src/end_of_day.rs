//! Overnight recovery: turns end-of-day meters into next-day baselines.

use serde::{Deserialize, Serialize};

use crate::allocation::Allocation;
use crate::cause::{Code, Entry};
use crate::diff::Diff;
use crate::fixed::{clamp_meter, commit_meter_delta, round_div_wide};

// Formula weights in tenths of a point.
const BASE_RECOVERY_TENTHS: i32 = 100;
const RECOVERY_PER_HEALTH: i32 = 3;
const RECOVERY_PER_FUN: i32 = 2;
const RECOVERY_STRESS_PENALTY: i32 = 1;
const DECAY_PER_STRESS: i32 = 2;
const DECAY_PER_HEALTH: i32 = 1;
const DECAY_PER_FUN: i32 = 1;
const TENTHS: i64 = 10;

fn weigh(weight: i32, value: i32) -> i64 {
    i64::from(weight) * i64::from(value)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EndOfDay {
    pub end_energy: i32,
    pub end_stress: i32,
    pub next_energy: i32,
    pub next_stress: i32,
}

/// Energy regained overnight. May be negative when the day ended very stressed.
pub fn overnight_recovery(end_stress: i32, allocation: Option<&Allocation>) -> i32 {
    let a = allocation.map(Allocation::sanitized).unwrap_or_default();
    round_div_wide(
        i64::from(BASE_RECOVERY_TENTHS)
            + weigh(RECOVERY_PER_HEALTH, a.health)
            + weigh(RECOVERY_PER_FUN, a.fun)
            - weigh(RECOVERY_STRESS_PENALTY, end_stress),
        TENTHS,
    )
}

/// Stress shed overnight.
pub fn stress_decay(end_stress: i32, allocation: Option<&Allocation>) -> i32 {
    let a = allocation.map(Allocation::sanitized).unwrap_or_default();
    round_div_wide(
        weigh(DECAY_PER_STRESS, end_stress)
            + weigh(DECAY_PER_HEALTH, a.health)
            + weigh(DECAY_PER_FUN, a.fun),
        TENTHS,
    )
}

/// Resolve raw end-of-day meters into clamped next-day baselines.
///
/// A missing allocation contributes nothing beyond the base recovery rate.
pub fn resolve_end_of_day(energy: i32, stress: i32, allocation: Option<&Allocation>) -> EndOfDay {
    let end_energy = clamp_meter(energy);
    let end_stress = clamp_meter(stress);
    let recovery = overnight_recovery(end_stress, allocation);
    let decay = stress_decay(end_stress, allocation);
    EndOfDay {
        end_energy,
        end_stress,
        next_energy: commit_meter_delta(end_energy, recovery),
        next_stress: commit_meter_delta(end_stress, decay.saturating_neg()),
    }
}

impl EndOfDay {
    /// Effective overnight change from the end-of-day meters to the baselines.
    pub fn diff(&self) -> Diff {
        let mut diff = Diff::default();
        let energy_delta = self.next_energy - self.end_energy;
        if energy_delta != 0 {
            diff.record_energy_delta(energy_delta);
            diff.record_cause(Entry::new(
                "energy",
                Code::OvernightRecovery,
                Some(format!("delta={}", energy_delta)),
            ));
        }
        let stress_delta = self.next_stress - self.end_stress;
        if stress_delta != 0 {
            diff.record_stress_delta(stress_delta);
            diff.record_cause(Entry::new(
                "stress",
                Code::StressDecay,
                Some(format!("delta={}", stress_delta)),
            ));
        }
        diff
    }
}
