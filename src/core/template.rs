/// Template selection: which narrative structure a dish gets.
///
/// Rare and legendary dishes are always myth-led. Everything else draws
/// uniformly from the four templates. The chosen template comes with a
/// context variant holding exactly the ingredients that template narrates.
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::core::composition::Composition;
use crate::core::error::CompositionError;
use crate::schema::ingredient::{Ingredient, Role};
use crate::schema::technique::{Technique, TimeRequirement};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    Traditional,
    FestivalFirst,
    MythLed,
    IngredientFocused,
}

impl TemplateKind {
    pub const ALL: [TemplateKind; 4] = [
        TemplateKind::Traditional,
        TemplateKind::FestivalFirst,
        TemplateKind::MythLed,
        TemplateKind::IngredientFocused,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::Traditional => "traditional",
            Self::FestivalFirst => "festival_first",
            Self::MythLed => "myth_led",
            Self::IngredientFocused => "ingredient_focused",
        }
    }
}

/// Which tier of sensory adjectives the prose draws from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SensoryIntensity {
    Gentle,
    Vibrant,
    Mystical,
}

impl SensoryIntensity {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Gentle => "gentle",
            Self::Vibrant => "vibrant",
            Self::Mystical => "mystical",
        }
    }

    /// Sacred or legendary ingredients, or a ceremonial technique, make a dish
    /// mystical; slow and moderate techniques are vibrant; quick ones gentle.
    pub fn derive(ingredients: &[&Ingredient], technique: &Technique) -> Self {
        let storied = ingredients
            .iter()
            .any(|i| i.is_sacred() || i.is_legendary());
        if storied || technique.time == TimeRequirement::Ceremonial {
            Self::Mystical
        } else if technique.time >= TimeRequirement::Moderate {
            Self::Vibrant
        } else {
            Self::Gentle
        }
    }
}

/// Per-template narrative inputs.
#[derive(Debug, Clone)]
pub enum TemplateContext<'p> {
    Traditional {
        primary: &'p Ingredient,
        supporting: Vec<&'p Ingredient>,
    },
    FestivalFirst {
        primary: &'p Ingredient,
        /// A fruit or vegetable to tie the dish to the season, if any.
        seasonal: Option<&'p Ingredient>,
    },
    MythLed {
        /// The rarest ingredient; the myth is told about it.
        relic: &'p Ingredient,
        sacred: Vec<&'p Ingredient>,
        supporting: Vec<&'p Ingredient>,
    },
    IngredientFocused {
        /// The ingredient with the highest cultural weight.
        featured: &'p Ingredient,
        accents: Vec<&'p Ingredient>,
    },
}

impl<'p> TemplateContext<'p> {
    pub fn kind(&self) -> TemplateKind {
        match self {
            Self::Traditional { .. } => TemplateKind::Traditional,
            Self::FestivalFirst { .. } => TemplateKind::FestivalFirst,
            Self::MythLed { .. } => TemplateKind::MythLed,
            Self::IngredientFocused { .. } => TemplateKind::IngredientFocused,
        }
    }

    /// The ingredient the prose is about.
    pub fn focus(&self) -> &'p Ingredient {
        match self {
            Self::Traditional { primary, .. } | Self::FestivalFirst { primary, .. } => *primary,
            Self::MythLed { relic, .. } => *relic,
            Self::IngredientFocused { featured, .. } => *featured,
        }
    }

    /// A secondary ingredient for `{accent}` slots.
    pub fn accent(&self) -> Option<&'p Ingredient> {
        match self {
            Self::Traditional { supporting, .. } => supporting.first().copied(),
            Self::FestivalFirst { seasonal, .. } => *seasonal,
            Self::MythLed {
                sacred, supporting, ..
            } => sacred.first().or_else(|| supporting.first()).copied(),
            Self::IngredientFocused { accents, .. } => accents.first().copied(),
        }
    }

    /// Build the context for `kind` from a composition. Fails on an empty
    /// composition.
    pub fn build(kind: TemplateKind, composition: &Composition<'p>) -> Result<Self, CompositionError> {
        let all = &composition.ingredients;
        let primary = composition.primary()?;
        let others = |focus: &Ingredient| -> Vec<&'p Ingredient> {
            all.iter()
                .copied()
                .filter(|i| i.name != focus.name)
                .collect()
        };

        let context = match kind {
            TemplateKind::Traditional => Self::Traditional {
                primary,
                supporting: others(primary),
            },
            TemplateKind::FestivalFirst => Self::FestivalFirst {
                primary,
                seasonal: all
                    .iter()
                    .copied()
                    .find(|i| matches!(i.role, Role::Fruit | Role::Vegetable)),
            },
            TemplateKind::MythLed => {
                // Highest rarity wins; ties go to the earliest ingredient.
                let relic = all
                    .iter()
                    .copied()
                    .fold(primary, |best, i| if i.rarity > best.rarity { i } else { best });
                let rest = others(relic);
                let (sacred, supporting): (Vec<_>, Vec<_>) = rest.into_iter().partition(|i| i.is_sacred());
                Self::MythLed {
                    relic,
                    sacred,
                    supporting,
                }
            }
            TemplateKind::IngredientFocused => {
                let featured = all.iter().copied().fold(primary, |best, i| {
                    if i.cultural_weight > best.cultural_weight {
                        i
                    } else {
                        best
                    }
                });
                Self::IngredientFocused {
                    featured,
                    accents: others(featured),
                }
            }
        };
        Ok(context)
    }
}

/// The template decision for one dish.
#[derive(Debug, Clone)]
pub struct TemplatePlan<'p> {
    pub context: TemplateContext<'p>,
    pub intensity: SensoryIntensity,
    pub technique: &'p Technique,
}

impl<'p> TemplatePlan<'p> {
    pub fn kind(&self) -> TemplateKind {
        self.context.kind()
    }
}

/// Choose the template kind: forced myth-led for rare or legendary dishes,
/// uniform otherwise.
pub fn choose_kind(composition: &Composition<'_>, rng: &mut StdRng) -> TemplateKind {
    if composition.max_rarity().is_storied() {
        return TemplateKind::MythLed;
    }
    TemplateKind::ALL[rng.gen_range(0..TemplateKind::ALL.len())]
}

pub fn select_template<'p>(
    composition: &Composition<'p>,
    rng: &mut StdRng,
) -> Result<TemplatePlan<'p>, CompositionError> {
    let kind = choose_kind(composition, rng);
    let intensity = SensoryIntensity::derive(&composition.ingredients, composition.technique);
    trace!(template = kind.name(), intensity = intensity.name(), "template selected");
    Ok(TemplatePlan {
        context: TemplateContext::build(kind, composition)?,
        intensity,
        technique: composition.technique,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::composition::RarityCurve;
    use crate::schema::ingredient::Rarity;
    use rand::SeedableRng;

    fn technique(time: TimeRequirement) -> Technique {
        Technique {
            name: "Ember Braising".to_string(),
            prepared: "ember-braised".to_string(),
            category: "wet-heat".to_string(),
            time,
            cultural_significance: 0.5,
            dish_types: ["stew".to_string()].into_iter().collect(),
            difficulty_modifier: 0,
        }
    }

    fn compose<'p>(ingredients: &'p [Ingredient], technique: &'p Technique) -> Composition<'p> {
        Composition {
            ingredients: ingredients.iter().collect(),
            technique,
            curve: RarityCurve::Balanced,
        }
    }

    #[test]
    fn rare_ingredient_forces_myth_led() {
        let ingredients = vec![
            Ingredient::new("Cliff Goat", Role::Main, Rarity::Common),
            Ingredient::new("Ghost Orchid", Role::Garnish, Rarity::Rare),
        ];
        let t = technique(TimeRequirement::Quick);
        let c = compose(&ingredients, &t);
        for seed in 0..500 {
            let mut rng = StdRng::seed_from_u64(seed);
            assert_eq!(choose_kind(&c, &mut rng), TemplateKind::MythLed);
        }
    }

    #[test]
    fn legendary_ingredient_forces_myth_led() {
        let ingredients = vec![
            Ingredient::new("Cliff Goat", Role::Main, Rarity::Common),
            Ingredient::new("Phoenix Yolk", Role::Protein, Rarity::Legendary),
        ];
        let t = technique(TimeRequirement::Quick);
        let c = compose(&ingredients, &t);
        let mut rng = StdRng::seed_from_u64(0);
        let plan = select_template(&c, &mut rng).unwrap();
        assert_eq!(plan.kind(), TemplateKind::MythLed);
        assert_eq!(plan.context.focus().name, "Phoenix Yolk");
    }

    #[test]
    fn common_dishes_use_every_template() {
        let ingredients = vec![
            Ingredient::new("Cliff Goat", Role::Main, Rarity::Common),
            Ingredient::new("Ash Leek", Role::Vegetable, Rarity::Uncommon),
        ];
        let t = technique(TimeRequirement::Slow);
        let c = compose(&ingredients, &t);
        let mut seen = std::collections::HashSet::new();
        for seed in 0..200 {
            let mut rng = StdRng::seed_from_u64(seed);
            seen.insert(choose_kind(&c, &mut rng));
        }
        assert_eq!(seen.len(), 4);
    }

    #[test]
    fn intensity_tiers() {
        let plain = Ingredient::new("Cliff Goat", Role::Main, Rarity::Common);
        let mut holy = Ingredient::new("Temple Rice", Role::Base, Rarity::Uncommon);
        holy.sacred = true;

        assert_eq!(
            SensoryIntensity::derive(&[&plain], &technique(TimeRequirement::Quick)),
            SensoryIntensity::Gentle
        );
        assert_eq!(
            SensoryIntensity::derive(&[&plain], &technique(TimeRequirement::Slow)),
            SensoryIntensity::Vibrant
        );
        assert_eq!(
            SensoryIntensity::derive(&[&plain], &technique(TimeRequirement::Ceremonial)),
            SensoryIntensity::Mystical
        );
        assert_eq!(
            SensoryIntensity::derive(&[&plain, &holy], &technique(TimeRequirement::Quick)),
            SensoryIntensity::Mystical
        );
    }

    #[test]
    fn contexts_carry_the_right_ingredients() {
        let mut heavy = Ingredient::new("Salt Fern", Role::Vegetable, Rarity::Common);
        heavy.cultural_weight = 3.0;
        let ingredients = vec![
            Ingredient::new("Cliff Goat", Role::Main, Rarity::Common),
            heavy,
            Ingredient::new("Tide Salt", Role::Seasoning, Rarity::Common),
        ];
        let t = technique(TimeRequirement::Slow);
        let c = compose(&ingredients, &t);

        let ctx = TemplateContext::build(TemplateKind::IngredientFocused, &c).unwrap();
        assert_eq!(ctx.focus().name, "Salt Fern");
        assert_eq!(ctx.accent().map(|i| i.name.as_str()), Some("Cliff Goat"));

        let ctx = TemplateContext::build(TemplateKind::FestivalFirst, &c).unwrap();
        assert_eq!(ctx.focus().name, "Cliff Goat");
        assert_eq!(ctx.accent().map(|i| i.name.as_str()), Some("Salt Fern"));

        let ctx = TemplateContext::build(TemplateKind::Traditional, &c).unwrap();
        match ctx {
            TemplateContext::Traditional { primary, supporting } => {
                assert_eq!(primary.name, "Cliff Goat");
                assert_eq!(supporting.len(), 2);
            }
            other => panic!("unexpected context {:?}", other.kind()),
        }
    }

    #[test]
    fn empty_composition_is_an_error_not_a_panic() {
        let t = technique(TimeRequirement::Quick);
        let c = compose(&[], &t);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(c.primary().is_err());
        for kind in TemplateKind::ALL {
            assert!(TemplateContext::build(kind, &c).is_err());
        }
        assert_eq!(
            select_template(&c, &mut rng).unwrap_err(),
            CompositionError::InsufficientIngredients {
                selected: 0,
                minimum: 1
            }
        );
    }
}
