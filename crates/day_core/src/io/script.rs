use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::day::DayPlan;
use crate::io::content::ContentBundle;
use crate::state::DailyState;

/// A recorded or hand-written sequence of days replayed by `daystep`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunScript {
    pub name: String,
    #[serde(default = "default_user_id")]
    pub user_id: String,
    pub initial: DailyState,
    #[serde(default)]
    pub days: Vec<DayPlan>,
    #[serde(default)]
    pub content: ContentBundle,
    /// Nested player state that storylet requirements are evaluated against.
    #[serde(default)]
    pub player_state: Value,
    /// Daily attention budget for arc steps. Absent means unlimited.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub slots_per_day: Option<u32>,
}

fn default_user_id() -> String {
    "local".to_string()
}

impl RunScript {
    /// Load a run script JSON document from disk.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open run script {:?}", path))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Deserialize a run script from an arbitrary reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).context("invalid run script json")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::allocation::Posture;

    #[test]
    fn minimal_script_fills_defaults() {
        let raw = r#"{
            "name": "minimal",
            "initial": {"day_index": 0, "energy": 80, "stress": 10},
            "days": [
                {"allocation": {"study": 50, "work": 10, "social": 10, "health": 20, "fun": 10},
                 "posture": "push"},
                {}
            ]
        }"#;
        let script = RunScript::from_reader(raw.as_bytes()).expect("script parses");
        assert_eq!(script.user_id, "local");
        assert_eq!(script.days.len(), 2);
        assert_eq!(script.days[0].posture, Posture::Push);
        assert!(script.days[1].allocation.is_none());
        assert!(script.content.storylets.is_empty());
        assert!(script.player_state.is_null());
    }
}
