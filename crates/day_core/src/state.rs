use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fixed::clamp_meter;

/// Personality/trend dimensions tracked per player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorKey {
    Reflection,
    Focus,
    Ambition,
    Social,
    Stability,
    Curiosity,
    Agency,
}

impl VectorKey {
    pub const ALL: [VectorKey; 7] = [
        VectorKey::Reflection,
        VectorKey::Focus,
        VectorKey::Ambition,
        VectorKey::Social,
        VectorKey::Stability,
        VectorKey::Curiosity,
        VectorKey::Agency,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Reflection => "reflection",
            Self::Focus => "focus",
            Self::Ambition => "ambition",
            Self::Social => "social",
            Self::Stability => "stability",
            Self::Curiosity => "curiosity",
            Self::Agency => "agency",
        }
    }
}

impl fmt::Display for VectorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Named entries of the player resource pool.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ResourceKey {
    Knowledge,
    CashOnHand,
    SocialLeverage,
    PhysicalResilience,
    Morale,
}

impl ResourceKey {
    pub const ALL: [ResourceKey; 5] = [
        ResourceKey::Knowledge,
        ResourceKey::CashOnHand,
        ResourceKey::SocialLeverage,
        ResourceKey::PhysicalResilience,
        ResourceKey::Morale,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Knowledge => "knowledge",
            Self::CashOnHand => "cashOnHand",
            Self::SocialLeverage => "socialLeverage",
            Self::PhysicalResilience => "physicalResilience",
            Self::Morale => "morale",
        }
    }
}

impl fmt::Display for ResourceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub type VectorMap = BTreeMap<VectorKey, i32>;

/// Amounts held in the resource pool. Keys that were never touched are absent.
pub type ResourceSnapshot = BTreeMap<ResourceKey, i32>;

/// Per-player state for a single day. A new day supersedes the previous value
/// instead of editing it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyState {
    pub day_index: u32,
    pub energy: i32,
    pub stress: i32,
    #[serde(default)]
    pub vectors: VectorMap,
    #[serde(default)]
    pub resources: ResourceSnapshot,
}

impl DailyState {
    pub fn new(day_index: u32, energy: i32, stress: i32) -> Self {
        Self {
            day_index,
            energy: clamp_meter(energy),
            stress: clamp_meter(stress),
            vectors: VectorMap::new(),
            resources: ResourceSnapshot::new(),
        }
    }

    pub fn vector(&self, key: VectorKey) -> i32 {
        self.vectors.get(&key).copied().unwrap_or(0)
    }

    pub fn resource(&self, key: ResourceKey) -> i32 {
        self.resources.get(&key).copied().unwrap_or(0)
    }

    /// Copy with every meter, vector and resource pulled into the meter range.
    pub fn clamped(&self) -> Self {
        Self {
            day_index: self.day_index,
            energy: clamp_meter(self.energy),
            stress: clamp_meter(self.stress),
            vectors: clamp_all(&self.vectors),
            resources: clamp_all(&self.resources),
        }
    }

    /// Copy of the resource pool used for trace before/after records.
    pub fn resource_snapshot(&self) -> ResourceSnapshot {
        self.resources.clone()
    }
}

fn clamp_all<K: Ord + Copy>(map: &BTreeMap<K, i32>) -> BTreeMap<K, i32> {
    map.iter()
        .map(|(key, value)| (*key, clamp_meter(*value)))
        .collect()
}

impl Default for DailyState {
    fn default() -> Self {
        Self::new(0, 100, 0)
    }
}

/// A numeric effect requested by a storylet choice, a disposition cost or an arc
/// payoff. Fields left at zero (or absent from the maps) have no effect.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    #[serde(default)]
    pub energy: i32,
    #[serde(default)]
    pub stress: i32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub vectors: VectorMap,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub resources: ResourceSnapshot,
}

impl Outcome {
    pub fn energy(delta: i32) -> Self {
        Self {
            energy: delta,
            ..Self::default()
        }
    }

    pub fn stress(delta: i32) -> Self {
        Self {
            stress: delta,
            ..Self::default()
        }
    }

    pub fn with_vector(mut self, key: VectorKey, delta: i32) -> Self {
        let entry = self.vectors.entry(key).or_insert(0);
        *entry = entry.saturating_add(delta);
        self
    }

    pub fn with_resource(mut self, key: ResourceKey, delta: i32) -> Self {
        let entry = self.resources.entry(key).or_insert(0);
        *entry = entry.saturating_add(delta);
        self
    }

    pub fn is_noop(&self) -> bool {
        self.energy == 0
            && self.stress == 0
            && self.vectors.values().all(|delta| *delta == 0)
            && self.resources.values().all(|delta| *delta == 0)
    }
}
