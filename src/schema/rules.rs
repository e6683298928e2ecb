use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use super::ingredient::{Ingredient, Role};

/// Per-dish-type composition constraints.
///
/// Built once per generation request from the cuisine's rule table and read
/// without mutation while ingredients are drawn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositionRules {
    /// Filled from the rule table key when loaded from a cuisine file.
    #[serde(default)]
    pub dish_type: String,
    /// Roles that must appear at least once, in draw order.
    pub required_roles: Vec<Role>,
    /// Roles used to pad the dish up to the minimum count, in priority order.
    #[serde(default)]
    pub optional_roles: Vec<Role>,
    /// Maximum ingredients per role. Roles without an entry default to 1.
    #[serde(default)]
    pub max_per_role: FxHashMap<Role, usize>,
    #[serde(default = "default_cap")]
    pub max_sacred: usize,
    #[serde(default = "default_cap")]
    pub max_legendary: usize,
    /// Minimum mean cultural weight of the final selection.
    #[serde(default)]
    pub min_average_weight: f32,
    /// Inclusive (min, max) total ingredient count.
    pub ingredient_count: (usize, usize),
    #[serde(default)]
    pub excluded_ingredients: Vec<String>,
    #[serde(default)]
    pub excluded_tags: Vec<String>,
}

fn default_cap() -> usize {
    1
}

impl CompositionRules {
    /// A rule set with the given required roles and count range; every other
    /// constraint starts permissive.
    pub fn new(dish_type: &str, required_roles: &[Role], ingredient_count: (usize, usize)) -> Self {
        Self {
            dish_type: dish_type.to_string(),
            required_roles: required_roles.to_vec(),
            optional_roles: Vec::new(),
            max_per_role: FxHashMap::default(),
            max_sacred: default_cap(),
            max_legendary: default_cap(),
            min_average_weight: 0.0,
            ingredient_count,
            excluded_ingredients: Vec::new(),
            excluded_tags: Vec::new(),
        }
    }

    pub fn with_max(mut self, role: Role, max: usize) -> Self {
        self.max_per_role.insert(role, max);
        self
    }

    pub fn with_optional(mut self, roles: &[Role]) -> Self {
        self.optional_roles = roles.to_vec();
        self
    }

    pub fn max_for(&self, role: Role) -> usize {
        self.max_per_role.get(&role).copied().unwrap_or(1)
    }

    pub fn min_count(&self) -> usize {
        self.ingredient_count.0
    }

    pub fn max_count(&self) -> usize {
        self.ingredient_count.1
    }

    /// Whether an ingredient survives the name and tag exclusion filters.
    pub fn permits(&self, ingredient: &Ingredient) -> bool {
        !self
            .excluded_ingredients
            .iter()
            .any(|name| name.eq_ignore_ascii_case(&ingredient.name))
            && !ingredient.has_any_tag(&self.excluded_tags)
    }

    /// Position of a role in the dish's grouping order: required roles first,
    /// then optional roles, then anything else.
    pub fn role_rank(&self, role: Role) -> usize {
        self.required_roles
            .iter()
            .chain(self.optional_roles.iter())
            .position(|r| *r == role)
            .unwrap_or(usize::MAX)
    }
}
