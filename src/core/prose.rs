/// Prose assembly: renders a template plan into a dish name, a description
/// and optional lore.
///
/// Each template is a fixed ordered list of sections. A section draws one
/// fragment from its category: recency cache first, then the anti-clustering
/// selector, then slot rendering. Clauses are joined by a small rhythm state
/// machine so descriptions don't settle into one sentence shape.
use rand::rngs::StdRng;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::RangeInclusive;
use tracing::{debug, trace};

use crate::core::cleanup::capitalize;
use crate::core::composition::Composition;
use crate::core::fragment::{Fragment, FragmentBank, Slot, SlotValues};
use crate::core::recency::{CacheKind, RecencyCaches};
use crate::core::selector::{weighted_index, AntiClusterSelector};
use crate::core::template::{SensoryIntensity, TemplateKind, TemplatePlan};
use crate::schema::cuisine::Nation;
use crate::schema::ingredient::{Ingredient, Rarity};

pub const OPENING_TRADITIONAL: &str = "opening_traditional";
pub const OPENING_FESTIVAL: &str = "opening_festival";
pub const OPENING_MYTH: &str = "opening_myth";
pub const OPENING_INGREDIENT: &str = "opening_ingredient";
pub const SENSORY: &str = "sensory";
pub const EMOTIONAL: &str = "emotional";
pub const SERVING: &str = "serving";
pub const FESTIVAL: &str = "festival";
pub const MYTH: &str = "myth";
pub const LORE: &str = "lore";
pub const WILDCARD: &str = "wildcard";
pub const NAME_PATTERN: &str = "name_pattern";
pub const BENEFIT_MYTHIC: &str = "benefit_mythic";
pub const BENEFIT_SACRED: &str = "benefit_sacred";
pub const BENEFIT_CEREMONIAL: &str = "benefit_ceremonial";
pub const BENEFIT_EVERYDAY: &str = "benefit_everyday";

/// Every category a phrase bank must provide before a dish can be generated.
pub const REQUIRED_CATEGORIES: [&str; 23] = [
    OPENING_TRADITIONAL,
    OPENING_FESTIVAL,
    OPENING_MYTH,
    OPENING_INGREDIENT,
    SENSORY,
    "adjective_gentle",
    "adjective_vibrant",
    "adjective_mystical",
    EMOTIONAL,
    SERVING,
    FESTIVAL,
    MYTH,
    LORE,
    WILDCARD,
    "title_common",
    "title_uncommon",
    "title_rare",
    "title_legendary",
    NAME_PATTERN,
    BENEFIT_MYTHIC,
    BENEFIT_SACRED,
    BENEFIT_CEREMONIAL,
    BENEFIT_EVERYDAY,
];

/// Selector stream for festival names.
const FESTIVAL_STREAM: &str = "festival_name";
const HONORIFIC_STREAM: &str = "honorific";

/// Clauses with more words than this count as long.
const LONG_CLAUSE_WORDS: usize = 16;

const SUBORDINATORS: &[&str] = &[
    "while", "as", "when", "though", "although", "because", "where", "after", "before",
    "until", "once", "if", "since", "whenever",
];

pub const WILDCARD_CHANCE: f64 = 0.25;
pub const WILDCARD_GAP: RangeInclusive<u32> = 3..=5;

pub fn adjective_category(intensity: SensoryIntensity) -> &'static str {
    match intensity {
        SensoryIntensity::Gentle => "adjective_gentle",
        SensoryIntensity::Vibrant => "adjective_vibrant",
        SensoryIntensity::Mystical => "adjective_mystical",
    }
}

pub fn title_category(rarity: Rarity) -> &'static str {
    match rarity {
        Rarity::Common => "title_common",
        Rarity::Uncommon => "title_uncommon",
        Rarity::Rare => "title_rare",
        Rarity::Legendary => "title_legendary",
    }
}

/// How much lore a dish carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum LoreIntensity {
    None,
    /// One sentence, myth-led dishes only.
    #[default]
    Light,
    /// Two or three sentences for every dish.
    Rich,
}

/// One step of a template's section pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Section {
    Opening,
    Festival,
    Myth,
    Sensory,
    Emotional,
    Serving,
}

impl Section {
    pub fn pipeline(kind: TemplateKind) -> &'static [Section] {
        match kind {
            TemplateKind::Traditional => &[
                Section::Opening,
                Section::Sensory,
                Section::Emotional,
                Section::Serving,
            ],
            TemplateKind::FestivalFirst => &[
                Section::Festival,
                Section::Opening,
                Section::Sensory,
                Section::Serving,
            ],
            TemplateKind::MythLed => &[
                Section::Opening,
                Section::Myth,
                Section::Sensory,
                Section::Emotional,
                Section::Serving,
            ],
            TemplateKind::IngredientFocused => &[
                Section::Opening,
                Section::Sensory,
                Section::Serving,
                Section::Emotional,
            ],
        }
    }
}

fn opening_category(kind: TemplateKind) -> &'static str {
    match kind {
        TemplateKind::Traditional => OPENING_TRADITIONAL,
        TemplateKind::FestivalFirst => OPENING_FESTIVAL,
        TemplateKind::MythLed => OPENING_MYTH,
        TemplateKind::IngredientFocused => OPENING_INGREDIENT,
    }
}

// ---------------------------------------------------------------------------
// Connective rhythm
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClauseShape {
    Plain,
    /// Opens with a subordinating word ("while the broth settles").
    Subordinate,
    Long,
}

impl ClauseShape {
    pub fn classify(clause: &str) -> Self {
        let mut words = clause.split_whitespace();
        let first = words
            .next()
            .map(|w| w.trim_matches(|c: char| !c.is_alphabetic()).to_lowercase())
            .unwrap_or_default();
        if SUBORDINATORS.contains(&first.as_str()) {
            return Self::Subordinate;
        }
        if clause.split_whitespace().count() > LONG_CLAUSE_WORDS {
            return Self::Long;
        }
        Self::Plain
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum JoinStyle {
    Period,
    Comma,
    Semicolon,
    Subordinate,
}

impl JoinStyle {
    pub fn connector(&self) -> &'static str {
        match self {
            Self::Period => ". ",
            Self::Comma => ", and ",
            Self::Semicolon => "; ",
            Self::Subordinate => ", while ",
        }
    }
}

impl JoinStyle {
    pub const ALL: [JoinStyle; 4] = [
        JoinStyle::Period,
        JoinStyle::Comma,
        JoinStyle::Semicolon,
        JoinStyle::Subordinate,
    ];
}

/// Join weights in `JoinStyle::ALL` order. Myth-led prose leans on
/// semicolons and subordinate clauses; ingredient-focused prose on commas.
fn join_weights(kind: TemplateKind) -> [f64; 4] {
    match kind {
        TemplateKind::Traditional => [2.0, 1.0, 1.0, 1.0],
        TemplateKind::FestivalFirst => [2.0, 2.0, 1.0, 0.5],
        TemplateKind::MythLed => [2.0, 0.5, 2.0, 2.0],
        TemplateKind::IngredientFocused => [2.0, 3.0, 0.5, 0.5],
    }
}

/// Join state machine. A non-period join is always followed by a period,
/// and consecutive non-period joins never use the same style.
#[derive(Debug)]
pub struct Rhythm {
    weights: [f64; 4],
    previous: Option<JoinStyle>,
    last_linked: Option<JoinStyle>,
}

impl Default for Rhythm {
    fn default() -> Self {
        Self::for_template(TemplateKind::Traditional)
    }
}

impl Rhythm {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_template(kind: TemplateKind) -> Self {
        Self {
            weights: join_weights(kind),
            previous: None,
            last_linked: None,
        }
    }

    pub fn next(&mut self, before: ClauseShape, after: ClauseShape, rng: &mut StdRng) -> JoinStyle {
        let after_link = self.previous.is_some_and(|p| p != JoinStyle::Period);
        let style = if after_link || before != ClauseShape::Plain || after != ClauseShape::Plain {
            JoinStyle::Period
        } else {
            let weights: Vec<f64> = JoinStyle::ALL
                .iter()
                .zip(self.weights)
                .map(|(s, w)| if Some(*s) == self.last_linked { 0.0 } else { w })
                .collect();
            weighted_index(&weights, rng)
                .map(|i| JoinStyle::ALL[i])
                .unwrap_or(JoinStyle::Period)
        };
        if style != JoinStyle::Period {
            self.last_linked = Some(style);
        }
        self.previous = Some(style);
        style
    }
}

/// Join clauses into sentences ending with a period, in the rhythm of
/// template `kind`.
pub fn join_clauses(clauses: &[String], kind: TemplateKind, rng: &mut StdRng) -> String {
    let mut rhythm = Rhythm::for_template(kind);
    let mut out = String::new();
    let mut previous_shape = ClauseShape::Plain;
    for (i, clause) in clauses.iter().enumerate() {
        let shape = ClauseShape::classify(clause);
        if i == 0 {
            out.push_str(&capitalize(clause));
        } else {
            let style = rhythm.next(previous_shape, shape, rng);
            out.push_str(style.connector());
            if style == JoinStyle::Period {
                out.push_str(&capitalize(clause));
            } else {
                out.push_str(clause);
            }
        }
        previous_shape = shape;
    }
    if !out.is_empty() {
        out.push('.');
    }
    out
}

// ---------------------------------------------------------------------------
// Wildcards
// ---------------------------------------------------------------------------

/// Decides which dishes get a wildcard line: one roll after every gap of
/// three to five dishes.
#[derive(Debug, Default)]
pub struct WildcardScheduler {
    since_last: u32,
    gap: u32,
}

impl WildcardScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count one dish; true when this dish should carry a wildcard.
    pub fn tick(&mut self, rng: &mut StdRng) -> bool {
        if self.gap == 0 {
            self.gap = rng.gen_range(WILDCARD_GAP);
        }
        self.since_last += 1;
        if self.since_last < self.gap {
            return false;
        }
        self.since_last = 0;
        self.gap = rng.gen_range(WILDCARD_GAP);
        rng.gen_bool(WILDCARD_CHANCE)
    }

    pub fn gap(&self) -> u32 {
        self.gap
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BreakKind {
    Sentence,
    Comma,
    While,
}

/// Indices right after ". ", ", " or " while ". Every index is a char
/// boundary preceded by a space.
pub fn break_points(text: &str) -> Vec<(usize, BreakKind)> {
    let mut points = Vec::new();
    for (marker, kind) in [
        (". ", BreakKind::Sentence),
        (", ", BreakKind::Comma),
        (" while ", BreakKind::While),
    ] {
        points.extend(text.match_indices(marker).map(|(i, _)| (i + marker.len(), kind)));
    }
    points.sort_by_key(|(i, _)| *i);
    points
}

/// Splice `clause` into `text` at a random break point; appended as its own
/// sentence when there is none.
pub fn splice_wildcard(text: &str, clause: &str, rng: &mut StdRng) -> String {
    let points = break_points(text);
    if points.is_empty() {
        return format!("{} {}.", text.trim_end(), capitalize(clause));
    }
    let (at, kind) = points[rng.gen_range(0..points.len())];
    let inserted = match kind {
        BreakKind::Sentence => format!("{}. ", capitalize(clause)),
        BreakKind::Comma => format!("{}, ", clause),
        BreakKind::While => format!("{} and ", clause),
    };
    trace!(at, ?kind, "wildcard spliced");
    format!("{}{}{}", &text[..at], inserted, &text[at..])
}

// ---------------------------------------------------------------------------
// Assembler
// ---------------------------------------------------------------------------

/// Per-dish toggles for the assembler.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProseStyle {
    pub include_emoji: bool,
    pub lore: LoreIntensity,
    pub wildcard: bool,
}

/// Raw text for one dish, before cleanup.
#[derive(Debug, Clone, PartialEq)]
pub struct ComposedText {
    pub name: String,
    pub description: String,
    pub lore: Option<String>,
}

/// Borrows the session state for one dish.
pub struct ProseAssembler<'s> {
    bank: &'s FragmentBank,
    selector: &'s mut AntiClusterSelector,
    caches: &'s mut RecencyCaches,
    rng: &'s mut StdRng,
}

impl<'s> ProseAssembler<'s> {
    pub fn new(
        bank: &'s FragmentBank,
        selector: &'s mut AntiClusterSelector,
        caches: &'s mut RecencyCaches,
        rng: &'s mut StdRng,
    ) -> Self {
        Self {
            bank,
            selector,
            caches,
            rng,
        }
    }

    pub fn compose(
        &mut self,
        composition: &Composition<'_>,
        plan: &TemplatePlan<'_>,
        nation: &Nation,
        style: &ProseStyle,
    ) -> ComposedText {
        let mut values = self.slot_values(plan, nation);
        let mut description = self.describe(plan, &mut values);
        if style.wildcard {
            if let Some(clause) = self.draw(WILDCARD, CacheKind::Prose, &values) {
                description = splice_wildcard(&description, &clause, self.rng);
            }
        }
        let lore = self.lore(plan.kind(), &values, style.lore);
        let primary = match composition.primary() {
            Ok(primary) => primary,
            Err(_) => plan.context.focus(),
        };
        let name = self.name(primary, composition, nation, style.include_emoji);
        debug!(template = plan.kind().name(), %name, "dish prose composed");
        ComposedText {
            name,
            description,
            lore,
        }
    }

    /// Draw one rendered fragment from `category`. `None` when the category
    /// has nothing renderable with these values.
    pub fn draw(&mut self, category: &str, kind: CacheKind, values: &SlotValues) -> Option<String> {
        let bank = self.bank;
        let renderable: Vec<&Fragment> = bank
            .category(category)
            .iter()
            .filter(|f| f.renderable(values))
            .collect();
        let fresh = self.caches.fresh(kind, &renderable);
        let chosen = self.selector.select(category, &fresh, self.rng)?;
        self.caches.add(kind, &chosen.text);
        let rendered = chosen.render(values);
        Some(
            rendered
                .trim()
                .trim_end_matches(['.', '!', '?'])
                .to_string(),
        )
    }

    /// Pick one plain value (festival, honorific) through the selector,
    /// optionally filtered by a recency cache.
    pub fn pick(&mut self, stream: &str, kind: Option<CacheKind>, options: &[String]) -> Option<String> {
        let pool: Vec<&String> = match kind {
            Some(kind) => self.caches.fresh(kind, options),
            None => options.iter().collect(),
        };
        let chosen = self.selector.select(stream, &pool, self.rng)?.to_string();
        if let Some(kind) = kind {
            self.caches.add(kind, &chosen);
        }
        Some(chosen)
    }

    fn slot_values(&mut self, plan: &TemplatePlan<'_>, nation: &Nation) -> SlotValues {
        let mut values = SlotValues::default();
        let focus = plan.context.focus();
        values.insert(Slot::Ingredient, focus.name.to_lowercase());
        if let Some(accent) = plan.context.accent() {
            values.insert(Slot::Accent, accent.name.to_lowercase());
        }
        values.insert(Slot::Technique, plan.technique.name.to_lowercase());
        values.insert(Slot::Prepared, plan.technique.prepared.to_lowercase());
        values.insert(Slot::Nation, nation.name.clone());
        values.insert(Slot::Demonym, nation.demonym.clone());
        if let Some(festival) = self.pick(FESTIVAL_STREAM, Some(CacheKind::Festival), &nation.festivals) {
            values.insert(Slot::Festival, festival);
        }
        if let Some(honorific) = self.pick(HONORIFIC_STREAM, None, &nation.honorifics) {
            values.insert(Slot::Honorific, honorific);
        }
        values
    }

    fn section(&mut self, section: Section, kind: TemplateKind, intensity: SensoryIntensity, values: &mut SlotValues) -> Option<String> {
        match section {
            Section::Opening => self.draw(opening_category(kind), CacheKind::Prose, values),
            Section::Festival => self.draw(FESTIVAL, CacheKind::Prose, values),
            Section::Myth => self.draw(MYTH, CacheKind::Prose, values),
            Section::Sensory => {
                let adjective = self.draw(adjective_category(intensity), CacheKind::Phrase, values)?;
                values.insert(Slot::Sensory, adjective);
                self.draw(SENSORY, CacheKind::Prose, values)
            }
            Section::Emotional => self.draw(EMOTIONAL, CacheKind::Prose, values),
            Section::Serving => self.draw(SERVING, CacheKind::Prose, values),
        }
    }

    fn describe(&mut self, plan: &TemplatePlan<'_>, values: &mut SlotValues) -> String {
        let kind = plan.kind();
        let mut clauses = Vec::new();
        for section in Section::pipeline(kind) {
            match self.section(*section, kind, plan.intensity, values) {
                Some(clause) if !clause.is_empty() => clauses.push(clause),
                _ => trace!(?section, "section skipped, nothing renderable"),
            }
        }
        if clauses.is_empty() {
            let focus = plan.context.focus();
            clauses.push(format!(
                "{} {}",
                plan.technique.prepared.to_lowercase(),
                focus.name.to_lowercase()
            ));
        }
        join_clauses(&clauses, kind, self.rng)
    }

    fn lore(&mut self, kind: TemplateKind, values: &SlotValues, intensity: LoreIntensity) -> Option<String> {
        let count = match intensity {
            LoreIntensity::None => return None,
            LoreIntensity::Light if kind != TemplateKind::MythLed => return None,
            LoreIntensity::Light => 1,
            LoreIntensity::Rich => self.rng.gen_range(2..=3),
        };
        let lines: Vec<String> = (0..count)
            .filter_map(|_| self.draw(LORE, CacheKind::Prose, values))
            .map(|line| format!("{}.", capitalize(&line)))
            .collect();
        if lines.is_empty() {
            None
        } else {
            Some(lines.join(" "))
        }
    }

    fn name(
        &mut self,
        primary: &Ingredient,
        composition: &Composition<'_>,
        nation: &Nation,
        include_emoji: bool,
    ) -> String {
        let technique = composition.technique;
        let prepared = title_case(&technique.prepared);

        let mut values = SlotValues::default();
        values.insert(Slot::Ingredient, primary.name.clone());
        values.insert(Slot::Technique, technique.name.clone());
        values.insert(Slot::Prepared, prepared.clone());
        values.insert(Slot::Nation, nation.name.clone());
        values.insert(Slot::Demonym, nation.demonym.clone());
        if let Some(title) = self.draw(title_category(composition.max_rarity()), CacheKind::Phrase, &values) {
            values.insert(Slot::Title, title);
        }

        let name = self
            .draw(NAME_PATTERN, CacheKind::Phrase, &values)
            .unwrap_or_else(|| format!("{} {}", prepared, primary.name));
        match (&primary.emoji, include_emoji) {
            (Some(emoji), true) => format!("{} {}", emoji, name),
            _ => name,
        }
    }
}

/// "ember-braised" → "Ember-Braised".
pub fn title_case(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut at_word_start = true;
    for c in text.chars() {
        if at_word_start {
            out.extend(c.to_uppercase());
        } else {
            out.push(c);
        }
        at_word_start = c == ' ' || c == '-';
    }
    out
}
