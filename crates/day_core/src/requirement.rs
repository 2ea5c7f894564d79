//! Boolean eligibility expressions evaluated against arbitrary player state.
//!
//! Content authors write requirements as JSON:
//!
//! ```json
//! {"all": [{"path": "flags.met_mentor", "equals": true},
//!          {"not": {"path": "flags.dropped_class", "equals": true}}]}
//! ```
//!
//! Anything that does not match one of the four shapes deserializes to
//! [`Requirement::Unrecognized`] and evaluates to `false`, hiding the content
//! rather than showing it on malformed data.

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Requirement {
    All { all: Vec<Requirement> },
    Any { any: Vec<Requirement> },
    Not { not: Box<Requirement> },
    Path { path: String, equals: bool },
    Unrecognized(Value),
}

impl Requirement {
    pub fn all(children: impl IntoIterator<Item = Requirement>) -> Self {
        Self::All {
            all: children.into_iter().collect(),
        }
    }

    pub fn any(children: impl IntoIterator<Item = Requirement>) -> Self {
        Self::Any {
            any: children.into_iter().collect(),
        }
    }

    pub fn negate(child: Requirement) -> Self {
        Self::Not {
            not: Box::new(child),
        }
    }

    pub fn path(path: impl Into<String>, equals: bool) -> Self {
        Self::Path {
            path: path.into(),
            equals,
        }
    }

    pub fn evaluate(&self, state: &Value) -> bool {
        evaluate(self, state)
    }

    /// False if any node in the tree is [`Requirement::Unrecognized`].
    ///
    /// Evaluation is per node, so `{"not": {}}` is `true`; content loaders use
    /// this check to reject such trees before they reach players.
    pub fn is_well_formed(&self) -> bool {
        match self {
            Requirement::All { all } => all.iter().all(Requirement::is_well_formed),
            Requirement::Any { any } => any.iter().all(Requirement::is_well_formed),
            Requirement::Not { not } => not.is_well_formed(),
            Requirement::Path { .. } => true,
            Requirement::Unrecognized(_) => false,
        }
    }
}

/// Evaluate `requirement` against `state`.
pub fn evaluate(requirement: &Requirement, state: &Value) -> bool {
    match requirement {
        Requirement::All { all } => all.iter().all(|child| evaluate(child, state)),
        Requirement::Any { any } => any.iter().any(|child| evaluate(child, state)),
        Requirement::Not { not } => !evaluate(not, state),
        Requirement::Path { path, equals } => {
            matches!(resolve_path(state, path), Some(Value::Bool(found)) if found == equals)
        }
        Requirement::Unrecognized(_) => false,
    }
}

/// Walk a dotted path through nested objects. Missing keys and non-object
/// intermediates resolve to `None`.
pub fn resolve_path<'a>(state: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.')
        .try_fold(state, |node, segment| node.as_object()?.get(segment))
}
