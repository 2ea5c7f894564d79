//! The content pool storylets are drawn from, and what a run has already used.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::ContentError;
use crate::requirement::Requirement;
use crate::state::Outcome;
use crate::vectors::ChoiceFlags;

/// A discrete narrative unit. The core only decides whether it is eligible.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Storylet {
    pub slug: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub requirement: Option<Requirement>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub choices: Vec<Choice>,
}

/// A selectable option inside a storylet.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Choice {
    pub id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub flags: ChoiceFlags,
}

impl Storylet {
    pub fn new(slug: impl Into<String>, requirement: Option<Requirement>) -> Self {
        Self {
            slug: slug.into(),
            requirement,
            choices: Vec::new(),
        }
    }

    /// Storylets without a requirement are always eligible.
    pub fn is_eligible(&self, state: &Value) -> bool {
        self.requirement
            .as_ref()
            .map_or(true, |requirement| requirement.evaluate(state))
    }

    pub fn choice(&self, id: &str) -> Option<&Choice> {
        self.choices.iter().find(|choice| choice.id == id)
    }
}

/// The storylets currently active for a player, keyed by slug.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContentPool {
    storylets: BTreeMap<String, Storylet>,
}

impl ContentPool {
    /// Build a pool, rejecting duplicate slugs and malformed requirements.
    pub fn from_storylets<I>(storylets: I) -> Result<Self, ContentError>
    where
        I: IntoIterator<Item = Storylet>,
    {
        let mut pool = BTreeMap::new();
        for storylet in storylets {
            if let Some(requirement) = &storylet.requirement {
                if !requirement.is_well_formed() {
                    return Err(ContentError::MalformedRequirement(storylet.slug));
                }
            }
            if pool.contains_key(&storylet.slug) {
                return Err(ContentError::DuplicateStorylet(storylet.slug));
            }
            pool.insert(storylet.slug.clone(), storylet);
        }
        Ok(Self { storylets: pool })
    }

    pub fn get(&self, slug: &str) -> Option<&Storylet> {
        self.storylets.get(slug)
    }

    pub fn contains(&self, slug: &str) -> bool {
        self.storylets.contains_key(slug)
    }

    pub fn len(&self) -> usize {
        self.storylets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.storylets.is_empty()
    }

    /// Present in the pool and passing its requirement.
    pub fn is_eligible(&self, slug: &str, state: &Value) -> bool {
        self.get(slug)
            .map_or(false, |storylet| storylet.is_eligible(state))
    }

    /// Slugs of every eligible storylet, in slug order.
    pub fn eligible_slugs(&self, state: &Value) -> Vec<&str> {
        self.storylets
            .values()
            .filter(|storylet| storylet.is_eligible(state))
            .map(|storylet| storylet.slug.as_str())
            .collect()
    }
}

/// Slugs already consumed in the player's runs.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunHistory {
    consumed: BTreeSet<String>,
}

impl RunHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn consume(&mut self, slug: impl Into<String>) {
        self.consumed.insert(slug.into());
    }

    pub fn is_consumed(&self, slug: &str) -> bool {
        self.consumed.contains(slug)
    }
}

impl<S: Into<String>> FromIterator<S> for RunHistory {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self {
            consumed: iter.into_iter().map(Into::into).collect(),
        }
    }
}
