//! Experiment variant assignment and percentage rollouts.
//!
//! Assignments are derived on demand from `(user_id, key)` and never stored.

use serde::{Deserialize, Serialize};

use crate::hash::bucket;

/// Label returned when an experiment declares no variants.
pub const DEFAULT_VARIANT: &str = "control";

/// Whether `user_id` falls inside a `pct`% rollout of `key`.
///
/// Eligibility is monotonic in `pct`: once a user is in, raising the percentage
/// never removes them.
pub fn pct_in_rollout(user_id: &str, key: &str, pct: i32) -> bool {
    if pct <= 0 {
        return false;
    }
    if pct >= 100 {
        return true;
    }
    let slot = bucket(user_id, key, 100);
    i64::from(slot) < i64::from(pct)
}

/// Pick one of `variants` for the user, or [`DEFAULT_VARIANT`] when empty.
pub fn choose_variant<'a, S: AsRef<str>>(
    user_id: &str,
    experiment_id: &str,
    variants: &'a [S],
) -> &'a str {
    if variants.is_empty() {
        return DEFAULT_VARIANT;
    }
    let buckets = u32::try_from(variants.len()).unwrap_or(u32::MAX);
    let index = bucket(user_id, experiment_id, buckets) as usize;
    variants
        .get(index)
        .map(AsRef::as_ref)
        .unwrap_or(DEFAULT_VARIANT)
}

/// Static experiment declaration as authored in content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExperimentDefinition {
    pub id: String,
    #[serde(default)]
    pub variants: Vec<String>,
    /// Optional gate: only users inside this rollout percentage are enrolled.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rollout_pct: Option<i32>,
}

/// Result of assigning a user to an experiment.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Assignment {
    pub experiment_id: String,
    pub variant: String,
    pub enrolled: bool,
}

impl ExperimentDefinition {
    pub fn new<I, S>(id: impl Into<String>, variants: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            variants: variants.into_iter().map(Into::into).collect(),
            rollout_pct: None,
        }
    }

    /// Assign `user_id`. Users outside the rollout gate receive the default
    /// variant and `enrolled == false`.
    pub fn assign(&self, user_id: &str) -> Assignment {
        let enrolled = self
            .rollout_pct
            .map_or(true, |pct| pct_in_rollout(user_id, &self.id, pct));
        let variant = if enrolled {
            choose_variant(user_id, &self.id, &self.variants)
        } else {
            DEFAULT_VARIANT
        };
        Assignment {
            experiment_id: self.id.clone(),
            variant: variant.to_string(),
            enrolled,
        }
    }
}
