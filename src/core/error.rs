/// Error taxonomy for a generation call.
///
/// Configuration errors are setup bugs and surface before any drawing
/// happens. Composition errors mean one random draw broke a rule; the caller
/// may retry with a fresh draw. Selection, caching and cleanup never fail.
use thiserror::Error;

use crate::schema::ingredient::Role;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigurationError {
    #[error("ingredient pool is empty")]
    EmptyIngredientPool,
    #[error("technique pool is empty")]
    EmptyTechniquePool,
    #[error("unknown dish type: {dish_type}")]
    UnknownDishType { dish_type: String },
    #[error("no eligible ingredients for required role '{role}' in dish type '{dish_type}'")]
    NoEligibleIngredients { role: Role, dish_type: String },
    #[error("no technique applies to dish type '{dish_type}'")]
    NoApplicableTechnique { dish_type: String },
    #[error("{required} required roles cannot fit in a maximum of {max} ingredients")]
    RequiredRolesExceedMaximum { required: usize, max: usize },
    #[error("invalid ingredient count range {min}..={max}")]
    InvalidCountRange { min: usize, max: usize },
    #[error("dish type '{dish_type}' has no required roles and nothing forces an ingredient into it")]
    NothingToDraw { dish_type: String },
    #[error("fragment category '{category}' is missing or empty")]
    MissingFragmentCategory { category: String },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CompositionError {
    #[error("selected {selected} ingredients, below the minimum of {minimum}")]
    InsufficientIngredients { selected: usize, minimum: usize },
    #[error("selected {selected} ingredients, above the maximum of {maximum}")]
    TooManyIngredients { selected: usize, maximum: usize },
    #[error("required role '{role}' has no ingredient")]
    MissingRequiredRole { role: Role },
    #[error("role '{role}' has {count} ingredients, above its maximum of {max}")]
    RoleMaximumExceeded { role: Role, count: usize, max: usize },
    #[error("ingredient '{name}' selected twice")]
    DuplicateIngredient { name: String },
    #[error("{count} sacred ingredients exceed the cap of {cap}")]
    SacredCapExceeded { count: usize, cap: usize },
    #[error("{count} legendary ingredients exceed the cap of {cap}")]
    LegendaryCapExceeded { count: usize, cap: usize },
    #[error("mean cultural weight {mean:.2} is below the threshold of {threshold:.2}")]
    CulturalWeightBelowThreshold { mean: f32, threshold: f32 },
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum GenerationError {
    #[error("configuration error: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("composition error: {0}")]
    Composition(#[from] CompositionError),
}

impl GenerationError {
    /// Whether a fresh random draw with the same configuration might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Composition(_))
    }
}
