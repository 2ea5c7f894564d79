use std::collections::{BTreeMap, BTreeSet};
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::arc::ArcDefinition;
use crate::error::ContentError;
use crate::experiment::ExperimentDefinition;
use crate::storylet::{ContentPool, Storylet};

/// Authored content as stored on disk.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ContentBundle {
    #[serde(default)]
    pub storylets: Vec<Storylet>,
    #[serde(default)]
    pub arcs: Vec<ArcDefinition>,
    #[serde(default)]
    pub experiments: Vec<ExperimentDefinition>,
}

/// Content that passed validation, indexed for lookups.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Content {
    pub pool: ContentPool,
    pub arcs: BTreeMap<String, ArcDefinition>,
    pub experiments: Vec<ExperimentDefinition>,
}

impl ContentBundle {
    /// Load a content JSON document from disk.
    pub fn load_from_path(path: &Path) -> Result<Self> {
        let file =
            File::open(path).with_context(|| format!("failed to open content file {:?}", path))?;
        Self::from_reader(BufReader::new(file))
    }

    /// Deserialize a content document from an arbitrary reader.
    pub fn from_reader<R: Read>(reader: R) -> Result<Self> {
        serde_json::from_reader(reader).context("invalid content json")
    }

    pub fn validate(self) -> Result<Content, ContentError> {
        let pool = ContentPool::from_storylets(self.storylets)?;

        let mut arcs = BTreeMap::new();
        for arc in self.arcs {
            arc.validate()?;
            if arcs.contains_key(&arc.arc_id) {
                return Err(ContentError::DuplicateArc(arc.arc_id));
            }
            arcs.insert(arc.arc_id.clone(), arc);
        }

        let mut seen = BTreeSet::new();
        for experiment in &self.experiments {
            if experiment.id.trim().is_empty() {
                return Err(ContentError::EmptyExperimentId);
            }
            if !seen.insert(experiment.id.as_str()) {
                return Err(ContentError::DuplicateExperiment(experiment.id.clone()));
            }
        }

        Ok(Content {
            pool,
            arcs,
            experiments: self.experiments,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUNDLE: &str = r#"{
        "storylets": [
            {"slug": "library_shift"},
            {"slug": "mentor_call", "requirement": {"path": "flags.met_mentor", "equals": true}}
        ],
        "arcs": [
            {"arc_id": "mentor", "steps": [{"slug": "mentor_call", "min_day_gap": 1}],
             "payoff": {"stress": -4, "vectors": {"agency": 1}}}
        ],
        "experiments": [{"id": "exp:reflection_copy", "variants": ["short", "long"]}]
    }"#;

    #[test]
    fn bundle_parses_and_validates() {
        let bundle = ContentBundle::from_reader(BUNDLE.as_bytes()).expect("bundle parses");
        let content = bundle.validate().expect("bundle validates");
        assert_eq!(content.pool.len(), 2);
        assert_eq!(content.arcs["mentor"].steps[0].min_day_gap, Some(1));
        assert_eq!(content.experiments.len(), 1);
    }

    #[test]
    fn duplicate_experiments_are_rejected() {
        let bundle = ContentBundle {
            experiments: vec![
                ExperimentDefinition::new("exp", ["a"]),
                ExperimentDefinition::new("exp", ["b"]),
            ],
            ..ContentBundle::default()
        };
        assert_eq!(
            bundle.validate().unwrap_err(),
            ContentError::DuplicateExperiment("exp".into())
        );
    }

    #[test]
    fn unknown_vector_keys_fail_to_load() {
        let raw = r#"{"arcs": [{"arc_id": "a", "steps": [{"slug": "s"}], "payoff": {"vectors": {"charm": 1}}}]}"#;
        assert!(ContentBundle::from_reader(raw.as_bytes()).is_err());
    }
}
