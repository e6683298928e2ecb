use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

/// How long a technique takes, ordered by complexity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TimeRequirement {
    Quick,
    Moderate,
    Slow,
    Ceremonial,
}

impl TimeRequirement {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Quick => "quick",
            Self::Moderate => "moderate",
            Self::Slow => "slow",
            Self::Ceremonial => "ceremonial",
        }
    }
}

/// A cooking technique from a cuisine's technique pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Technique {
    /// Display name, e.g. "Ember Braising".
    pub name: String,
    /// Past-participle form used in prose, e.g. "ember-braised".
    pub prepared: String,
    pub category: String,
    pub time: TimeRequirement,
    #[serde(default)]
    pub cultural_significance: f32,
    /// Dish types this technique can be used for.
    pub dish_types: FxHashSet<String>,
    /// Added to the difficulty score on top of the time requirement.
    #[serde(default)]
    pub difficulty_modifier: i32,
}

impl Technique {
    pub fn applies_to(&self, dish_type: &str) -> bool {
        self.dish_types.contains(dish_type)
    }

    pub fn is_ceremonial(&self) -> bool {
        self.time == TimeRequirement::Ceremonial
    }
}
