use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use super::ingredient::Ingredient;
use super::rules::CompositionRules;
use super::technique::Technique;

#[derive(Debug, Error)]
pub enum CuisineError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// The fictional nation a cuisine belongs to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Nation {
    pub name: String,
    /// Adjective form, e.g. "Ember Coast" → "Emberine".
    pub demonym: String,
    #[serde(default)]
    pub festivals: Vec<String>,
    /// Honorifics for cooks and elders, used by lore fragments.
    #[serde(default)]
    pub honorifics: Vec<String>,
}

/// A complete static data table for one nation: ingredient pool, technique
/// pool, and per-dish-type composition rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Cuisine {
    pub nation: Nation,
    pub ingredients: Vec<Ingredient>,
    pub techniques: Vec<Technique>,
    pub dish_rules: FxHashMap<String, CompositionRules>,
}

impl Cuisine {
    /// Load a cuisine from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<Cuisine, CuisineError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a cuisine from a RON string.
    pub fn parse_ron(input: &str) -> Result<Cuisine, CuisineError> {
        let mut cuisine: Cuisine = ron::from_str(input)?;
        // The table key is authoritative for the dish type.
        for (dish_type, rules) in cuisine.dish_rules.iter_mut() {
            rules.dish_type = dish_type.clone();
        }
        Ok(cuisine)
    }

    pub fn rules_for(&self, dish_type: &str) -> Option<&CompositionRules> {
        self.dish_rules.get(dish_type)
    }

    /// Dish types in sorted order, for stable iteration.
    pub fn dish_types(&self) -> Vec<&str> {
        let mut types: Vec<&str> = self.dish_rules.keys().map(String::as_str).collect();
        types.sort_unstable();
        types
    }

    pub fn ingredient(&self, name: &str) -> Option<&Ingredient> {
        self.ingredients.iter().find(|i| i.name == name)
    }
}
