/// Composition rule engine: draws a rule-valid ingredient set and a technique.
///
/// Required roles are drawn first (between one and the role maximum each),
/// optional roles pad the dish up to the minimum count in priority order, and
/// the final selection is validated against every rule. A selection that
/// breaks a rule is rejected, never truncated.
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::Rng;
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::core::error::{CompositionError, ConfigurationError, GenerationError};
use crate::core::recency::RecencyCache;
use crate::schema::ingredient::{Ingredient, Rarity, Role};
use crate::schema::rules::CompositionRules;
use crate::schema::technique::Technique;

/// Preset rarity weighting curves. A curve's weight for a rarity is how many
/// copies of each ingredient of that rarity go into the draw pool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RarityCurve {
    CommonHeavy,
    Balanced,
    RareLeaning,
}

impl RarityCurve {
    pub const ALL: [RarityCurve; 3] = [
        RarityCurve::CommonHeavy,
        RarityCurve::Balanced,
        RarityCurve::RareLeaning,
    ];

    pub fn weight(&self, rarity: Rarity) -> usize {
        match (self, rarity) {
            (Self::CommonHeavy, Rarity::Common) => 8,
            (Self::CommonHeavy, Rarity::Uncommon) => 3,
            (Self::CommonHeavy, Rarity::Rare) => 1,
            (Self::CommonHeavy, Rarity::Legendary) => 1,
            (Self::Balanced, Rarity::Common) => 4,
            (Self::Balanced, Rarity::Uncommon) => 3,
            (Self::Balanced, Rarity::Rare) => 2,
            (Self::Balanced, Rarity::Legendary) => 1,
            (Self::RareLeaning, Rarity::Common) => 2,
            (Self::RareLeaning, Rarity::Uncommon) => 3,
            (Self::RareLeaning, Rarity::Rare) => 3,
            (Self::RareLeaning, Rarity::Legendary) => 2,
        }
    }

    pub fn random(rng: &mut StdRng) -> Self {
        Self::ALL[rng.gen_range(0..Self::ALL.len())]
    }
}

impl Default for RarityCurve {
    fn default() -> Self {
        Self::Balanced
    }
}

/// The drawn ingredients and technique for one dish.
#[derive(Debug, Clone)]
pub struct Composition<'p> {
    /// Grouped by role in rule declaration order.
    pub ingredients: Vec<&'p Ingredient>,
    pub technique: &'p Technique,
    pub curve: RarityCurve,
}

impl<'p> Composition<'p> {
    /// First ingredient of the first required role.
    pub fn primary(&self) -> Result<&'p Ingredient, CompositionError> {
        self.ingredients
            .first()
            .copied()
            .ok_or(CompositionError::InsufficientIngredients {
                selected: 0,
                minimum: 1,
            })
    }

    pub fn max_rarity(&self) -> Rarity {
        crate::schema::dish::max_rarity(&self.ingredients)
    }

    pub fn any_sacred_or_legendary(&self) -> bool {
        self.ingredients
            .iter()
            .any(|i| i.is_sacred() || i.is_legendary())
    }
}

/// Check the rules and pools for setup bugs before anything is drawn.
pub fn check_configuration(
    ingredients: &[Ingredient],
    techniques: &[Technique],
    rules: &CompositionRules,
) -> Result<(), ConfigurationError> {
    if ingredients.is_empty() {
        return Err(ConfigurationError::EmptyIngredientPool);
    }
    if techniques.is_empty() {
        return Err(ConfigurationError::EmptyTechniquePool);
    }
    let (min, max) = rules.ingredient_count;
    if max == 0 || min > max {
        return Err(ConfigurationError::InvalidCountRange { min, max });
    }
    // An empty dish never validates.
    if rules.required_roles.is_empty() && (min == 0 || rules.optional_roles.is_empty()) {
        return Err(ConfigurationError::NothingToDraw {
            dish_type: rules.dish_type.clone(),
        });
    }
    if rules.required_roles.len() > max {
        return Err(ConfigurationError::RequiredRolesExceedMaximum {
            required: rules.required_roles.len(),
            max,
        });
    }
    for role in &rules.required_roles {
        if !ingredients
            .iter()
            .any(|i| i.role == *role && rules.permits(i))
        {
            return Err(ConfigurationError::NoEligibleIngredients {
                role: *role,
                dish_type: rules.dish_type.clone(),
            });
        }
    }
    if !techniques.iter().any(|t| t.applies_to(&rules.dish_type)) {
        return Err(ConfigurationError::NoApplicableTechnique {
            dish_type: rules.dish_type.clone(),
        });
    }
    Ok(())
}

/// Draw a complete composition: ingredients first, then a technique.
///
/// Techniques in `recent_techniques` are avoided when another applicable
/// technique exists.
pub fn select_composition<'p>(
    ingredients: &'p [Ingredient],
    techniques: &'p [Technique],
    rules: &CompositionRules,
    curve: RarityCurve,
    recent_techniques: &RecencyCache,
    rng: &mut StdRng,
) -> Result<Composition<'p>, GenerationError> {
    check_configuration(ingredients, techniques, rules)?;

    let selected = select_ingredients(ingredients, rules, curve, rng)?;
    let technique = select_technique(techniques, &rules.dish_type, recent_techniques, rng)?;

    debug!(
        dish_type = %rules.dish_type,
        count = selected.len(),
        technique = %technique.name,
        ?curve,
        "composition drawn"
    );

    Ok(Composition {
        ingredients: selected,
        technique,
        curve,
    })
}

/// Draw and validate the ingredient multiset for `rules`.
pub fn select_ingredients<'p>(
    pool: &'p [Ingredient],
    rules: &CompositionRules,
    curve: RarityCurve,
    rng: &mut StdRng,
) -> Result<Vec<&'p Ingredient>, GenerationError> {
    let mut draw = Draw::new(pool, rules, curve);
    let required = &rules.required_roles;

    for (idx, role) in required.iter().enumerate() {
        if draw.count_role(*role) >= rules.max_for(*role) {
            continue;
        }
        let still_needed = required[idx + 1..]
            .iter()
            .filter(|r| draw.count_role(**r) == 0)
            .count();
        let budget = rules
            .max_count()
            .saturating_sub(draw.selected.len() + still_needed)
            .max(1);
        let room = rules.max_for(*role) - draw.count_role(*role);
        let target = rng.gen_range(1..=room.min(budget).max(1));
        draw.draw_role(*role, target, rng);
    }

    for role in &rules.optional_roles {
        while draw.selected.len() < rules.min_count() {
            if draw.count_role(*role) >= rules.max_for(*role) {
                break;
            }
            if draw.draw_role(*role, 1, rng) == 0 {
                break;
            }
        }
    }

    let mut selected = draw.selected;
    selected.sort_by_key(|i| rules.role_rank(i.role));

    if let Err(e) = validate_composition(&selected, rules) {
        debug!(dish_type = %rules.dish_type, error = %e, "composition rejected");
        return Err(e.into());
    }
    Ok(selected)
}

/// Pick a technique for `dish_type` uniformly, preferring ones not used
/// recently.
pub fn select_technique<'p>(
    techniques: &'p [Technique],
    dish_type: &str,
    recent: &RecencyCache,
    rng: &mut StdRng,
) -> Result<&'p Technique, ConfigurationError> {
    let applicable: Vec<&Technique> = techniques
        .iter()
        .filter(|t| t.applies_to(dish_type))
        .collect();
    if applicable.is_empty() {
        return Err(ConfigurationError::NoApplicableTechnique {
            dish_type: dish_type.to_string(),
        });
    }

    let fresh: Vec<&Technique> = applicable
        .iter()
        .copied()
        .filter(|t| !recent.has(&t.name))
        .collect();
    let pool = if fresh.is_empty() { &applicable } else { &fresh };
    Ok(pool[rng.gen_range(0..pool.len())])
}

/// Check a selection against every composition rule.
pub fn validate_composition(
    selected: &[&Ingredient],
    rules: &CompositionRules,
) -> Result<(), CompositionError> {
    let count = selected.len();
    let minimum = rules.min_count().max(1);
    if count < minimum {
        return Err(CompositionError::InsufficientIngredients {
            selected: count,
            minimum,
        });
    }
    if count > rules.max_count() {
        return Err(CompositionError::TooManyIngredients {
            selected: count,
            maximum: rules.max_count(),
        });
    }

    let mut seen = FxHashSet::default();
    for ingredient in selected {
        if !seen.insert(ingredient.name.as_str()) {
            return Err(CompositionError::DuplicateIngredient {
                name: ingredient.name.clone(),
            });
        }
    }

    for role in &rules.required_roles {
        if !selected.iter().any(|i| i.role == *role) {
            return Err(CompositionError::MissingRequiredRole { role: *role });
        }
    }
    for role in Role::ALL {
        let role_count = selected.iter().filter(|i| i.role == role).count();
        if role_count > rules.max_for(role) {
            return Err(CompositionError::RoleMaximumExceeded {
                role,
                count: role_count,
                max: rules.max_for(role),
            });
        }
    }

    let sacred = selected.iter().filter(|i| i.is_sacred()).count();
    if sacred > rules.max_sacred {
        return Err(CompositionError::SacredCapExceeded {
            count: sacred,
            cap: rules.max_sacred,
        });
    }
    let legendary = selected.iter().filter(|i| i.is_legendary()).count();
    if legendary > rules.max_legendary {
        return Err(CompositionError::LegendaryCapExceeded {
            count: legendary,
            cap: rules.max_legendary,
        });
    }

    let mean = selected.iter().map(|i| i.cultural_weight).sum::<f32>() / count as f32;
    if mean < rules.min_average_weight {
        return Err(CompositionError::CulturalWeightBelowThreshold {
            mean,
            threshold: rules.min_average_weight,
        });
    }
    Ok(())
}

/// In-progress selection state for one composition.
struct Draw<'p, 'r> {
    pool: &'p [Ingredient],
    rules: &'r CompositionRules,
    curve: RarityCurve,
    selected: Vec<&'p Ingredient>,
    names: FxHashSet<&'p str>,
    sacred: usize,
    legendary: usize,
}

impl<'p, 'r> Draw<'p, 'r> {
    fn new(pool: &'p [Ingredient], rules: &'r CompositionRules, curve: RarityCurve) -> Self {
        Self {
            pool,
            rules,
            curve,
            selected: Vec::new(),
            names: FxHashSet::default(),
            sacred: 0,
            legendary: 0,
        }
    }

    fn count_role(&self, role: Role) -> usize {
        self.selected.iter().filter(|i| i.role == role).count()
    }

    /// Draw up to `target` distinct ingredients of `role` without
    /// replacement. Rarity weighting works by pool inflation: each candidate
    /// appears `curve.weight(rarity)` times before shuffling, and duplicates
    /// are skipped as they come up. Returns the number drawn.
    fn draw_role(&mut self, role: Role, target: usize, rng: &mut StdRng) -> usize {
        let mut inflated: Vec<&'p Ingredient> = Vec::new();
        for ingredient in self.pool.iter().filter(|i| i.role == role) {
            if !self.rules.permits(ingredient) || self.names.contains(ingredient.name.as_str()) {
                continue;
            }
            for _ in 0..self.curve.weight(ingredient.rarity) {
                inflated.push(ingredient);
            }
        }
        inflated.shuffle(rng);

        let mut drawn = 0;
        for ingredient in inflated {
            if drawn == target || self.selected.len() >= self.rules.max_count() {
                break;
            }
            if self.names.contains(ingredient.name.as_str()) {
                continue;
            }
            if ingredient.is_sacred() && self.sacred >= self.rules.max_sacred {
                continue;
            }
            if ingredient.is_legendary() && self.legendary >= self.rules.max_legendary {
                continue;
            }
            self.names.insert(ingredient.name.as_str());
            self.sacred += usize::from(ingredient.is_sacred());
            self.legendary += usize::from(ingredient.is_legendary());
            self.selected.push(ingredient);
            drawn += 1;
        }
        drawn
    }
}
