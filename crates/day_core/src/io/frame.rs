use std::collections::BTreeMap;

use serde::Serialize;

use crate::arc::{ArcStatus, UserArc};
use crate::diff::Diff;
use crate::end_of_day::EndOfDay;
use crate::state::{DailyState, ResourceSnapshot, VectorMap};

#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct FrameState {
    pub energy: i32,
    pub stress: i32,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub vectors: VectorMap,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub resources: ResourceSnapshot,
}

impl From<&DailyState> for FrameState {
    fn from(state: &DailyState) -> Self {
        Self {
            energy: state.energy,
            stress: state.stress,
            vectors: state.vectors.clone(),
            resources: state.resources.clone(),
        }
    }
}

/// Arc progress as shown in a frame.
#[derive(Clone, Debug, Serialize, PartialEq, Eq)]
pub struct ArcMark {
    pub arc_id: String,
    pub status: ArcStatus,
    pub step_index: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub played: Option<String>,
}

impl ArcMark {
    pub fn new(arc: &UserArc, played: Option<String>) -> Self {
        Self {
            arc_id: arc.arc_id.clone(),
            status: arc.status,
            step_index: arc.step_index,
            played,
        }
    }
}

/// One resolved day, serialized as a single NDJSON line.
#[derive(Clone, Debug, Serialize)]
pub struct Frame {
    pub day: u32,
    pub end: EndOfDay,
    pub next: FrameState,
    #[serde(skip_serializing_if = "Diff::is_empty")]
    pub diff: Diff,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub arcs: Vec<ArcMark>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty", default)]
    pub experiments: BTreeMap<String, String>,
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub chronicle: Vec<String>,
}

pub fn make_frame(
    day: u32,
    end: EndOfDay,
    next: &DailyState,
    diff: Diff,
    arcs: Vec<ArcMark>,
    experiments: BTreeMap<String, String>,
    chronicle: Vec<String>,
) -> Frame {
    Frame {
        day,
        end,
        next: FrameState::from(next),
        diff,
        arcs,
        experiments,
        chronicle,
    }
}

impl Frame {
    pub fn to_ndjson(&self) -> serde_json::Result<String> {
        let mut json = serde_json::to_string(self)?;
        json.push('\n');
        Ok(json)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::VectorKey;

    fn end() -> EndOfDay {
        EndOfDay {
            end_energy: 61,
            end_stress: 24,
            next_energy: 77,
            next_stress: 16,
        }
    }

    #[test]
    fn empty_sections_are_omitted() {
        let next = DailyState::new(3, 77, 16);
        let frame = make_frame(2, end(), &next, Diff::default(), Vec::new(), BTreeMap::new(), Vec::new());
        let json_line = frame.to_ndjson().expect("frame serializes");
        assert!(json_line.ends_with('\n'));
        let value: serde_json::Value =
            serde_json::from_str(json_line.trim_end()).expect("valid json");
        let map = value.as_object().expect("frame is object");
        assert!(!map.contains_key("diff"));
        assert!(!map.contains_key("arcs"));
        assert!(!map.contains_key("chronicle"));
        assert_eq!(value.pointer("/end/nextEnergy").and_then(|v| v.as_i64()), Some(77));
        assert!(value.pointer("/next/vectors").is_none());
    }

    #[test]
    fn vectors_and_diff_serialize_by_name() {
        let mut next = DailyState::new(3, 77, 16);
        next.vectors.insert(VectorKey::Focus, 1);
        let mut diff = Diff::default();
        diff.record_vector_delta(VectorKey::Focus, 1);
        let frame = make_frame(2, end(), &next, diff, Vec::new(), BTreeMap::new(), Vec::new());
        let value = serde_json::to_value(&frame).expect("frame serializes");
        assert_eq!(value.pointer("/next/vectors/focus").and_then(|v| v.as_i64()), Some(1));
        assert_eq!(value.pointer("/diff/vectors/focus").and_then(|v| v.as_i64()), Some(1));
    }
}
