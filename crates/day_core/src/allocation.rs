//! Same-day effects of a time allocation.
//!
//! Work and study drain energy and build stress; health and fun recover.
//! Weights are expressed in hundredths of a point per allocated percent and the
//! combined delta is rounded once, so identical inputs always produce identical
//! outputs.

use serde::{Deserialize, Serialize};

use crate::cause::{Code, Entry};
use crate::diff::Diff;
use crate::fixed::{clamp_meter, commit_meter_delta, round_div_wide};

/// Percentages of the day assigned to each bucket. Callers keep the total at
/// 100; the engine never renormalizes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    #[serde(default)]
    pub study: i32,
    #[serde(default)]
    pub work: i32,
    #[serde(default)]
    pub social: i32,
    #[serde(default)]
    pub health: i32,
    #[serde(default)]
    pub fun: i32,
}

impl Allocation {
    pub const fn new(study: i32, work: i32, social: i32, health: i32, fun: i32) -> Self {
        Self {
            study,
            work,
            social,
            health,
            fun,
        }
    }

    pub fn total(&self) -> i32 {
        [self.work, self.social, self.health, self.fun]
            .into_iter()
            .fold(self.study, i32::saturating_add)
    }

    /// Copy with every bucket floored at zero.
    pub fn sanitized(&self) -> Self {
        Self {
            study: self.study.max(0),
            work: self.work.max(0),
            social: self.social.max(0),
            health: self.health.max(0),
            fun: self.fun.max(0),
        }
    }
}

/// Player stance modulating how hard the day's work hits.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Posture {
    #[default]
    Steady,
    Push,
}

impl Posture {
    /// Multiplier applied to drain and stress-gain terms, as a `(num, den)` pair.
    const fn load_factor(self) -> (i32, i32) {
        match self {
            Posture::Steady => (1, 1),
            Posture::Push => (5, 4),
        }
    }
}

const ENERGY_DRAIN_STUDY: i32 = 15;
const ENERGY_DRAIN_WORK: i32 = 25;
const ENERGY_DRAIN_SOCIAL: i32 = 10;
const ENERGY_RECOVER_HEALTH: i32 = 10;
const ENERGY_RECOVER_FUN: i32 = 10;

const STRESS_GAIN_STUDY: i32 = 10;
const STRESS_GAIN_WORK: i32 = 15;
const STRESS_RELIEF_HEALTH: i32 = 10;
const STRESS_RELIEF_FUN: i32 = 10;

const HUNDREDTHS: i64 = 100;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayMeters {
    pub energy: i32,
    pub stress: i32,
}

/// Energy/stress deltas (in whole points) for an allocation under `posture`.
pub fn allocation_deltas(allocation: &Allocation, posture: Posture) -> (i32, i32) {
    let a = allocation.sanitized();
    let (num, den) = posture.load_factor();
    let (num, den) = (i64::from(num), i64::from(den));
    let weigh = |weight: i32, bucket: i32| i64::from(weight) * i64::from(bucket);

    let drain = weigh(ENERGY_DRAIN_STUDY, a.study)
        + weigh(ENERGY_DRAIN_WORK, a.work)
        + weigh(ENERGY_DRAIN_SOCIAL, a.social);
    let recover = weigh(ENERGY_RECOVER_HEALTH, a.health) + weigh(ENERGY_RECOVER_FUN, a.fun);
    let energy_hundredths = recover - drain * num / den;

    let gain = weigh(STRESS_GAIN_STUDY, a.study) + weigh(STRESS_GAIN_WORK, a.work);
    let relief = weigh(STRESS_RELIEF_HEALTH, a.health) + weigh(STRESS_RELIEF_FUN, a.fun);
    let stress_hundredths = gain * num / den - relief;

    (
        round_div_wide(energy_hundredths, HUNDREDTHS),
        round_div_wide(stress_hundredths, HUNDREDTHS),
    )
}

/// Apply the same-day allocation effects to the current meters.
///
/// Out-of-range meters are clamped before the deltas are added.
pub fn apply_allocation_to_day_state(
    energy: i32,
    stress: i32,
    allocation: &Allocation,
    posture: Posture,
) -> DayMeters {
    let (energy_delta, stress_delta) = allocation_deltas(allocation, posture);
    DayMeters {
        energy: commit_meter_delta(clamp_meter(energy), energy_delta),
        stress: commit_meter_delta(clamp_meter(stress), stress_delta),
    }
}

/// Same as [`apply_allocation_to_day_state`] but also returns the effective
/// changes as a [`Diff`].
pub fn allocation_diff(
    energy: i32,
    stress: i32,
    allocation: &Allocation,
    posture: Posture,
) -> (DayMeters, Diff) {
    let meters = apply_allocation_to_day_state(energy, stress, allocation, posture);
    let mut diff = Diff::default();
    let posture_note = match posture {
        Posture::Steady => "posture=steady",
        Posture::Push => "posture=push",
    };
    let energy_delta = meters.energy - clamp_meter(energy);
    if energy_delta != 0 {
        diff.record_energy_delta(energy_delta);
        let code = if energy_delta < 0 {
            Code::AllocationDrain
        } else {
            Code::AllocationRecovery
        };
        diff.record_cause(Entry::new("energy", code, Some(posture_note.to_string())));
    }
    let stress_delta = meters.stress - clamp_meter(stress);
    if stress_delta != 0 {
        diff.record_stress_delta(stress_delta);
        let code = if stress_delta > 0 {
            Code::AllocationDrain
        } else {
            Code::AllocationRecovery
        };
        diff.record_cause(Entry::new("stress", code, Some(posture_note.to_string())));
    }
    (meters, diff)
}
