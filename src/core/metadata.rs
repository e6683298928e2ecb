/// Dish metadata: difficulty, serving size and a benefit line.
use rand::rngs::StdRng;
use tracing::trace;

use crate::core::fragment::{FragmentBank, SlotValues};
use crate::core::prose::{BENEFIT_CEREMONIAL, BENEFIT_EVERYDAY, BENEFIT_MYTHIC, BENEFIT_SACRED};
use crate::core::recency::{CacheKind, RecencyCaches};
use crate::core::selector::AntiClusterSelector;
use crate::schema::dish::Difficulty;
use crate::schema::ingredient::{Ingredient, Rarity};
use crate::schema::technique::{Technique, TimeRequirement};

const SIMPLE_BELOW: i32 = 8;
const MODERATE_BELOW: i32 = 14;
const COMPLEX_BELOW: i32 = 20;

const MIN_SERVINGS: i32 = 1;
const MAX_SERVINGS: i32 = 12;

pub fn rarity_score(rarity: Rarity) -> i32 {
    match rarity {
        Rarity::Common => 1,
        Rarity::Uncommon => 2,
        Rarity::Rare => 4,
        Rarity::Legendary => 6,
    }
}

pub fn time_score(time: TimeRequirement) -> i32 {
    match time {
        TimeRequirement::Quick => 1,
        TimeRequirement::Moderate => 3,
        TimeRequirement::Slow => 5,
        TimeRequirement::Ceremonial => 8,
    }
}

pub fn complexity_score(ingredients: &[&Ingredient], technique: &Technique) -> i32 {
    let rarity: i32 = ingredients.iter().map(|i| rarity_score(i.rarity)).sum();
    rarity + time_score(technique.time) + technique.difficulty_modifier
}

pub fn difficulty(ingredients: &[&Ingredient], technique: &Technique) -> Difficulty {
    match complexity_score(ingredients, technique) {
        s if s < SIMPLE_BELOW => Difficulty::Simple,
        s if s < MODERATE_BELOW => Difficulty::Moderate,
        s if s < COMPLEX_BELOW => Difficulty::Complex,
        _ => Difficulty::Masterful,
    }
}

/// One portion per ingredient plus one; ceremonies feed a crowd, legendary
/// ingredients stretch thin.
pub fn serving_size(ingredients: &[&Ingredient], technique: &Technique) -> u32 {
    let mut servings = ingredients.len() as i32 + 1;
    if technique.is_ceremonial() {
        servings += 4;
    }
    servings -= 2 * ingredients.iter().filter(|i| i.is_legendary()).count() as i32;
    servings.clamp(MIN_SERVINGS, MAX_SERVINGS) as u32
}

/// The benefit phrase category, by priority: legendary, sacred, ceremonial.
pub fn benefit_category(ingredients: &[&Ingredient], technique: &Technique) -> &'static str {
    if ingredients.iter().any(|i| i.is_legendary()) {
        BENEFIT_MYTHIC
    } else if ingredients.iter().any(|i| i.is_sacred()) {
        BENEFIT_SACRED
    } else if technique.is_ceremonial() {
        BENEFIT_CEREMONIAL
    } else {
        BENEFIT_EVERYDAY
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DishMetadata {
    pub difficulty: Difficulty,
    pub serving_size: u32,
    pub benefit: String,
}

/// Compute all metadata. The benefit line is drawn through the selector and
/// the phrase cache; an empty bucket yields an empty benefit.
pub fn compute_metadata(
    ingredients: &[&Ingredient],
    technique: &Technique,
    bank: &FragmentBank,
    selector: &mut AntiClusterSelector,
    caches: &mut RecencyCaches,
    rng: &mut StdRng,
) -> DishMetadata {
    let category = benefit_category(ingredients, technique);
    let fresh = caches.fresh(CacheKind::Phrase, bank.category(category));
    let benefit = match selector.select(category, &fresh, rng) {
        Some(fragment) => {
            caches.add(CacheKind::Phrase, &fragment.text);
            fragment.render(&SlotValues::default())
        }
        None => String::new(),
    };
    let metadata = DishMetadata {
        difficulty: difficulty(ingredients, technique),
        serving_size: serving_size(ingredients, technique),
        benefit,
    };
    trace!(
        difficulty = metadata.difficulty.name(),
        servings = metadata.serving_size,
        bucket = category,
        "metadata computed"
    );
    metadata
}
