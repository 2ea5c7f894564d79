use std::cmp::Ordering;

use serde::ser::{SerializeMap, SerializeStruct};
use serde::Serialize;

use crate::cause::Entry;
use crate::state::{ResourceKey, VectorKey};

/// Applied-delta record returned next to every state transition.
///
/// Deltas are the *effective* changes after clamping, so replaying a diff on the
/// `before` state reproduces the `after` state exactly. Keyed entries are kept
/// sorted by key and entries that cancel out are removed, which keeps the record
/// sparse and its serialization stable.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Diff {
    pub energy: i32,
    pub stress: i32,
    pub vectors: Vec<KeyedDelta<VectorKey>>,
    pub resources: Vec<KeyedDelta<ResourceKey>>,
    pub causes: Vec<Entry>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct KeyedDelta<K> {
    pub key: K,
    pub delta: i32,
}

impl Diff {
    pub fn record_energy_delta(&mut self, delta: i32) {
        self.energy = self.energy.saturating_add(delta);
    }

    pub fn record_stress_delta(&mut self, delta: i32) {
        self.stress = self.stress.saturating_add(delta);
    }

    pub fn record_vector_delta(&mut self, key: VectorKey, delta: i32) {
        if delta == 0 {
            return;
        }
        Self::insert_delta(&mut self.vectors, key, delta);
    }

    pub fn record_resource_delta(&mut self, key: ResourceKey, delta: i32) {
        if delta == 0 {
            return;
        }
        Self::insert_delta(&mut self.resources, key, delta);
    }

    pub fn vector_delta(&self, key: VectorKey) -> i32 {
        self.vectors
            .binary_search_by_key(&key, |entry| entry.key)
            .map(|idx| self.vectors[idx].delta)
            .unwrap_or(0)
    }

    pub fn resource_delta(&self, key: ResourceKey) -> i32 {
        self.resources
            .binary_search_by_key(&key, |entry| entry.key)
            .map(|idx| self.resources[idx].delta)
            .unwrap_or(0)
    }

    /// Insert a cause entry while maintaining a deterministic ordering by
    /// `(target, code, note)`.
    pub fn record_cause(&mut self, cause: Entry) {
        let position =
            self.causes
                .binary_search_by(|existing| match existing.target.cmp(&cause.target) {
                    Ordering::Equal => match existing.code.cmp(&cause.code) {
                        Ordering::Equal => existing.note.cmp(&cause.note),
                        other => other,
                    },
                    other => other,
                });
        match position {
            Ok(idx) => self.causes.insert(idx + 1, cause),
            Err(idx) => self.causes.insert(idx, cause),
        }
    }

    pub fn merge(&mut self, other: &Diff) {
        self.record_energy_delta(other.energy);
        self.record_stress_delta(other.stress);
        for delta in &other.vectors {
            Self::insert_delta(&mut self.vectors, delta.key, delta.delta);
        }
        for delta in &other.resources {
            Self::insert_delta(&mut self.resources, delta.key, delta.delta);
        }
        for cause in other.causes.iter().cloned() {
            self.record_cause(cause);
        }
    }

    /// True when no numeric change was recorded. Causes alone do not count.
    pub fn is_empty(&self) -> bool {
        self.energy == 0 && self.stress == 0 && self.vectors.is_empty() && self.resources.is_empty()
    }

    fn insert_delta<K: Ord + Copy>(target: &mut Vec<KeyedDelta<K>>, key: K, delta: i32) {
        match target.binary_search_by_key(&key, |entry| entry.key) {
            Ok(idx) => {
                let entry = &mut target[idx];
                entry.delta = entry.delta.saturating_add(delta);
                if entry.delta == 0 {
                    target.remove(idx);
                }
            }
            Err(idx) if delta != 0 => target.insert(idx, KeyedDelta { key, delta }),
            Err(_) => {}
        }
    }
}

impl Serialize for Diff {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let field_count = usize::from(self.energy != 0)
            + usize::from(self.stress != 0)
            + usize::from(!self.vectors.is_empty())
            + usize::from(!self.resources.is_empty())
            + usize::from(!self.causes.is_empty());
        let mut state = serializer.serialize_struct("Diff", field_count)?;
        if self.energy != 0 {
            state.serialize_field("energy", &self.energy)?;
        }
        if self.stress != 0 {
            state.serialize_field("stress", &self.stress)?;
        }
        if !self.vectors.is_empty() {
            state.serialize_field("vectors", &KeyedDeltas(&self.vectors))?;
        }
        if !self.resources.is_empty() {
            state.serialize_field("resources", &KeyedDeltas(&self.resources))?;
        }
        if !self.causes.is_empty() {
            state.serialize_field("causes", &self.causes)?;
        }
        state.end()
    }
}

struct KeyedDeltas<'a, K>(&'a [KeyedDelta<K>]);

impl<'a, K: Serialize> Serialize for KeyedDeltas<'a, K> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for entry in self.0 {
            map.serialize_entry(&entry.key, &entry.delta)?;
        }
        map.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cause::Code;

    #[test]
    fn cancelling_deltas_are_dropped() {
        let mut diff = Diff::default();
        diff.record_vector_delta(VectorKey::Focus, 2);
        diff.record_vector_delta(VectorKey::Agency, -1);

        let mut other = Diff::default();
        other.record_vector_delta(VectorKey::Focus, -2);
        diff.merge(&other);

        assert_eq!(diff.vector_delta(VectorKey::Focus), 0);
        assert_eq!(diff.vector_delta(VectorKey::Agency), -1);
        assert_eq!(diff.vectors.len(), 1);
    }

    #[test]
    fn serialization_omits_empty_fields() {
        let mut diff = Diff::default();
        diff.record_stress_delta(4);
        diff.record_resource_delta(ResourceKey::CashOnHand, -3);
        diff.record_cause(Entry::new("stress", Code::AllocationDrain, None));

        let value = serde_json::to_value(&diff).expect("diff serializes");
        let map = value.as_object().expect("diff is object");
        assert!(!map.contains_key("energy"));
        assert!(!map.contains_key("vectors"));
        assert_eq!(map.get("stress").and_then(|v| v.as_i64()), Some(4));
        assert_eq!(
            value
                .pointer("/resources/cashOnHand")
                .and_then(|v| v.as_i64()),
            Some(-3)
        );
        assert_eq!(
            value.pointer("/causes/0/code").and_then(|v| v.as_str()),
            Some("allocation_drain")
        );
    }

    #[test]
    fn causes_are_ordered_by_target() {
        let mut diff = Diff::default();
        diff.record_cause(Entry::new("stress", Code::StressDecay, None));
        diff.record_cause(Entry::new("energy", Code::OvernightRecovery, None));
        let targets: Vec<_> = diff.causes.iter().map(|c| c.target.as_str()).collect();
        assert_eq!(targets, ["energy", "stress"]);
    }
}
