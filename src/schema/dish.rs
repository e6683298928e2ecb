use serde::{Deserialize, Serialize};

use super::ingredient::{Ingredient, Rarity, Role};
use super::technique::Technique;
use crate::core::template::TemplateKind;

/// Difficulty bucket derived from ingredient rarity and technique time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Difficulty {
    Simple,
    Moderate,
    Complex,
    Masterful,
}

impl Difficulty {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Simple => "simple",
            Self::Moderate => "moderate",
            Self::Complex => "complex",
            Self::Masterful => "masterful",
        }
    }
}

/// A finished dish. Created once per generation call and never mutated.
///
/// Ingredients and technique are references into the cuisine's static pools.
#[derive(Debug, Clone, Serialize)]
pub struct GeneratedDish<'p> {
    pub name: String,
    pub description: String,
    pub lore: Option<String>,
    pub dish_type: String,
    /// Grouped by role, in the order the composition rules declare roles.
    pub ingredients: Vec<&'p Ingredient>,
    pub technique: &'p Technique,
    pub template: TemplateKind,
    pub serving_size: u32,
    pub difficulty: Difficulty,
    pub benefit: String,
}

impl<'p> GeneratedDish<'p> {
    pub fn ingredient_names(&self) -> Vec<&str> {
        self.ingredients.iter().map(|i| i.name.as_str()).collect()
    }

    pub fn count_role(&self, role: Role) -> usize {
        self.ingredients.iter().filter(|i| i.role == role).count()
    }

    pub fn max_rarity(&self) -> Rarity {
        max_rarity(&self.ingredients)
    }

    pub fn sacred_count(&self) -> usize {
        self.ingredients.iter().filter(|i| i.is_sacred()).count()
    }

    pub fn legendary_count(&self) -> usize {
        self.ingredients.iter().filter(|i| i.is_legendary()).count()
    }
}

/// Highest rarity among a selection; common for an empty selection.
pub fn max_rarity(ingredients: &[&Ingredient]) -> Rarity {
    ingredients
        .iter()
        .map(|i| i.rarity)
        .max()
        .unwrap_or_default()
}
