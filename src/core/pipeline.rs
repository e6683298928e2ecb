/// The dish pipeline: configuration → composition → template → prose →
/// cleanup → finished dish.
///
/// All mutable state (selector history, recency caches, sentence history,
/// wildcard schedule) lives in a `DishSession`. Independent sessions never
/// share state, and a session seeded the same way replays the same dishes.
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::core::cleanup::{cleanup, CleanupPipeline, SENTENCE_HISTORY};
use crate::core::composition::{check_configuration, select_composition, RarityCurve};
use crate::core::error::{ConfigurationError, GenerationError};
use crate::core::fragment::FragmentBank;
use crate::core::metadata::compute_metadata;
use crate::core::prose::{LoreIntensity, ProseAssembler, ProseStyle, WildcardScheduler, REQUIRED_CATEGORIES};
use crate::core::recency::{CacheCapacities, CacheKind, RecencyCaches};
use crate::core::selector::{AntiClusterSelector, BannedPairs, SelectorConfig};
use crate::core::template::select_template;
use crate::schema::cuisine::Cuisine;
use crate::schema::dish::GeneratedDish;

/// Per-call toggles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct GenerationOptions {
    /// Prefix the dish name with the primary ingredient's emoji.
    pub include_emoji: bool,
    pub lore: LoreIntensity,
    /// Draw a rarity curve per dish instead of always using `Balanced`.
    pub batch_variation: bool,
    /// Force one curve; overrides `batch_variation`.
    pub rarity_curve: Option<RarityCurve>,
}

/// Everything one `generate` call reads. Pools, rules and phrases are
/// borrowed static data; generated dishes reference into them.
#[derive(Debug, Clone, Copy)]
pub struct GenerationConfig<'a> {
    pub cuisine: &'a Cuisine,
    pub phrases: &'a FragmentBank,
    pub dish_type: &'a str,
    pub options: GenerationOptions,
}

impl<'a> GenerationConfig<'a> {
    pub fn new(cuisine: &'a Cuisine, phrases: &'a FragmentBank, dish_type: &'a str) -> Self {
        Self {
            cuisine,
            phrases,
            dish_type,
            options: GenerationOptions::default(),
        }
    }

    pub fn with_options(mut self, options: GenerationOptions) -> Self {
        self.options = options;
        self
    }

    fn curve(&self, rng: &mut StdRng) -> RarityCurve {
        match (self.options.rarity_curve, self.options.batch_variation) {
            (Some(curve), _) => curve,
            (None, true) => RarityCurve::random(rng),
            (None, false) => RarityCurve::Balanced,
        }
    }
}

/// A generation session. Built via `DishSession::builder()`.
#[derive(Debug)]
pub struct DishSession {
    selector: AntiClusterSelector,
    caches: RecencyCaches,
    cleanup: CleanupPipeline,
    wildcards: WildcardScheduler,
    seed: u64,
    generation_count: u64,
}

/// Builder for constructing a `DishSession`.
#[derive(Debug, Clone)]
pub struct DishSessionBuilder {
    seed: u64,
    capacities: CacheCapacities,
    selector: SelectorConfig,
    sentence_history: usize,
    banned_pairs: BannedPairs,
}

impl DishSession {
    pub fn builder() -> DishSessionBuilder {
        DishSessionBuilder {
            seed: 0,
            capacities: CacheCapacities::default(),
            selector: SelectorConfig::default(),
            sentence_history: SENTENCE_HISTORY,
            banned_pairs: BannedPairs::new(),
        }
    }

    pub fn new(seed: u64) -> Self {
        Self::builder().seed(seed).build()
    }

    /// Generate one dish.
    ///
    /// Configuration problems (unknown dish type, missing phrase categories,
    /// empty pools, required roles nobody can fill) fail before anything is
    /// drawn. A draw that breaks a composition rule fails with
    /// `GenerationError::Composition`; calling again draws afresh.
    pub fn generate<'a>(
        &mut self,
        config: &GenerationConfig<'a>,
    ) -> Result<GeneratedDish<'a>, GenerationError> {
        let cuisine = config.cuisine;
        let rules = cuisine
            .rules_for(config.dish_type)
            .ok_or_else(|| ConfigurationError::UnknownDishType {
                dish_type: config.dish_type.to_string(),
            })?;
        if let Some(category) = config
            .phrases
            .missing_categories(&REQUIRED_CATEGORIES)
            .first()
        {
            return Err(ConfigurationError::MissingFragmentCategory {
                category: category.to_string(),
            }
            .into());
        }

        if let Err(e) = check_configuration(&cuisine.ingredients, &cuisine.techniques, rules) {
            warn!(dish_type = config.dish_type, error = %e, "configuration error");
            return Err(e.into());
        }

        // Every attempt advances the counter so a retry after a rejected
        // draw sees a different stream.
        let mut rng = StdRng::seed_from_u64(self.seed.wrapping_add(self.generation_count));
        self.generation_count += 1;

        let curve = config.curve(&mut rng);
        let composition = match select_composition(
            &cuisine.ingredients,
            &cuisine.techniques,
            rules,
            curve,
            self.caches.get(CacheKind::Technique),
            &mut rng,
        ) {
            Ok(composition) => composition,
            Err(e) => {
                if e.is_retryable() {
                    debug!(dish_type = config.dish_type, error = %e, "draw rejected");
                } else {
                    warn!(dish_type = config.dish_type, error = %e, "configuration error");
                }
                return Err(e);
            }
        };
        self.caches
            .add(CacheKind::Technique, &composition.technique.name);
        self.selector
            .banned_pairs_mut()
            .extend(&config.phrases.banned_pairs);

        let plan = select_template(&composition, &mut rng)?;
        let style = ProseStyle {
            include_emoji: config.options.include_emoji,
            lore: config.options.lore,
            wildcard: self.wildcards.tick(&mut rng),
        };
        let text = ProseAssembler::new(
            config.phrases,
            &mut self.selector,
            &mut self.caches,
            &mut rng,
        )
        .compose(&composition, &plan, &cuisine.nation, &style);

        let metadata = compute_metadata(
            &composition.ingredients,
            composition.technique,
            config.phrases,
            &mut self.selector,
            &mut self.caches,
            &mut rng,
        );

        let description = self.cleanup.run(&text.description);
        let lore = text.lore.map(|lore| self.cleanup.run(&lore));

        debug!(
            generation = self.generation_count,
            dish_type = config.dish_type,
            template = plan.kind().name(),
            wildcard = style.wildcard,
            "dish generated"
        );

        Ok(GeneratedDish {
            name: cleanup(&text.name),
            description,
            lore,
            dish_type: config.dish_type.to_string(),
            ingredients: composition.ingredients,
            technique: composition.technique,
            template: plan.kind(),
            serving_size: metadata.serving_size,
            difficulty: metadata.difficulty,
            benefit: metadata.benefit,
        })
    }

    /// Generate `count` dishes in sequence, stopping at the first error.
    pub fn generate_batch<'a>(
        &mut self,
        config: &GenerationConfig<'a>,
        count: usize,
    ) -> Result<Vec<GeneratedDish<'a>>, GenerationError> {
        let mut dishes = Vec::with_capacity(count);
        for _ in 0..count {
            dishes.push(self.generate(config)?);
        }
        Ok(dishes)
    }

    /// Clear every cache, the selector history and the sentence history.
    /// The generation counter keeps running.
    pub fn reset(&mut self) {
        self.selector.clear();
        self.caches.clear_all();
        self.cleanup.clear();
        self.wildcards.reset();
        debug!(generation = self.generation_count, "session reset");
    }

    /// Keep the newest half of every cache and history.
    pub fn soft_reset(&mut self) {
        self.selector.soften();
        self.caches.soften_all();
        self.cleanup.soften();
        debug!(generation = self.generation_count, "session soft reset");
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn generation_count(&self) -> u64 {
        self.generation_count
    }

    pub fn caches(&self) -> &RecencyCaches {
        &self.caches
    }

    pub fn selector(&self) -> &AntiClusterSelector {
        &self.selector
    }

    pub fn cleanup_pipeline(&self) -> &CleanupPipeline {
        &self.cleanup
    }
}

impl Default for DishSession {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl DishSessionBuilder {
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    pub fn prose_cache_capacity(mut self, capacity: usize) -> Self {
        self.capacities.prose = capacity;
        self
    }

    pub fn festival_cache_capacity(mut self, capacity: usize) -> Self {
        self.capacities.festival = capacity;
        self
    }

    pub fn phrase_cache_capacity(mut self, capacity: usize) -> Self {
        self.capacities.phrase = capacity;
        self
    }

    /// How many recent dishes' techniques are avoided.
    pub fn technique_memory(mut self, dishes: usize) -> Self {
        self.capacities.technique = dishes;
        self
    }

    /// Global anti-repeat window, in selector calls.
    pub fn global_window(mut self, calls: u64) -> Self {
        self.selector.global_window = calls;
        self
    }

    pub fn selector_config(mut self, config: SelectorConfig) -> Self {
        self.selector = config;
        self
    }

    pub fn sentence_history(mut self, sentences: usize) -> Self {
        self.sentence_history = sentences;
        self
    }

    /// Extra banned pairs on top of those in the phrase bank.
    pub fn banned_pairs(mut self, pairs: BannedPairs) -> Self {
        self.banned_pairs.extend(&pairs);
        self
    }

    pub fn build(self) -> DishSession {
        DishSession {
            selector: AntiClusterSelector::new(self.selector).with_banned_pairs(self.banned_pairs),
            caches: RecencyCaches::new(self.capacities),
            cleanup: CleanupPipeline::new(self.sentence_history),
            wildcards: WildcardScheduler::new(),
            seed: self.seed,
            generation_count: 0,
        }
    }
}
