use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use std::fmt;

/// The categorical slot an ingredient fills in a dish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    Main,
    Vegetable,
    Seasoning,
    Garnish,
    Fruit,
    Liquid,
    Protein,
    Spice,
    Base,
    Sauce,
}

impl Role {
    pub const ALL: [Role; 10] = [
        Role::Main,
        Role::Vegetable,
        Role::Seasoning,
        Role::Garnish,
        Role::Fruit,
        Role::Liquid,
        Role::Protein,
        Role::Spice,
        Role::Base,
        Role::Sauce,
    ];

    /// Lower-case name used in logs and error messages (e.g., "vegetable").
    pub fn name(&self) -> &'static str {
        match self {
            Self::Main => "main",
            Self::Vegetable => "vegetable",
            Self::Seasoning => "seasoning",
            Self::Garnish => "garnish",
            Self::Fruit => "fruit",
            Self::Liquid => "liquid",
            Self::Protein => "protein",
            Self::Spice => "spice",
            Self::Base => "base",
            Self::Sauce => "sauce",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Rarity tier. Totally ordered: common < uncommon < rare < legendary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Legendary,
}

impl Default for Rarity {
    fn default() -> Self {
        Self::Common
    }
}

impl Rarity {
    pub const ALL: [Rarity; 4] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Legendary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Common => "common",
            Self::Uncommon => "uncommon",
            Self::Rare => "rare",
            Self::Legendary => "legendary",
        }
    }

    /// Rare and legendary ingredients always get the myth-led treatment.
    pub fn is_storied(&self) -> bool {
        *self >= Self::Rare
    }
}

/// A single entry in a cuisine's ingredient pool.
///
/// Ingredients are static data: they are loaded once, never mutated, and
/// dishes hold references into the pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ingredient {
    pub name: String,
    pub role: Role,
    #[serde(default)]
    pub rarity: Rarity,
    #[serde(default = "default_weight")]
    pub cultural_weight: f32,
    #[serde(default)]
    pub sacred: bool,
    /// Explicit legendary flag for ingredients that are mythic without being
    /// of legendary rarity.
    #[serde(default)]
    pub legendary: bool,
    /// Dietary/cultural tags used by exclusion filters (e.g., "meat", "dairy").
    #[serde(default)]
    pub tags: FxHashSet<String>,
    #[serde(default)]
    pub emoji: Option<String>,
}

fn default_weight() -> f32 {
    1.0
}

impl Ingredient {
    pub fn new(name: &str, role: Role, rarity: Rarity) -> Self {
        Self {
            name: name.to_string(),
            role,
            rarity,
            cultural_weight: default_weight(),
            sacred: false,
            legendary: false,
            tags: FxHashSet::default(),
            emoji: None,
        }
    }

    pub fn is_sacred(&self) -> bool {
        self.sacred
    }

    /// Legendary either by explicit flag or by rarity tier.
    pub fn is_legendary(&self) -> bool {
        self.legendary || self.rarity == Rarity::Legendary
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains(tag)
    }

    pub fn has_any_tag(&self, tags: &[String]) -> bool {
        tags.iter().any(|t| self.tags.contains(t))
    }
}
