/// Text cleanup: an ordered list of named rewrite passes run over every
/// generated text.
///
/// Order is part of the contract: later passes assume earlier ones already
/// ran (sentence splitting relies on normalized punctuation spacing, jargon
/// control counts words after duplicates are gone). [`cleanup`] repeats the
/// passes until the text stops changing, so `cleanup(cleanup(x)) == cleanup(x)`.
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use rustc_hash::FxHashMap;
use tracing::trace;

use crate::core::recency::RecencyCache;

/// Default bound on remembered sentences.
pub const SENTENCE_HISTORY: usize = 50;

/// Upper bound on fixpoint rounds in [`cleanup`].
const MAX_ROUNDS: usize = 10;

/// Clause joins allowed in one sentence before it is split.
const MAX_JOINS: usize = 3;

/// Share of words that may come from the ritual vocabulary.
const JARGON_THRESHOLD: f64 = 0.15;

/// Occurrences of one ritual term kept before substitution starts.
const JARGON_KEEP: usize = 2;

fn compile(pattern: &str) -> Regex {
    Regex::new(pattern).expect("cleanup patterns are valid")
}

static DOUBLE_DETERMINER: Lazy<Regex> = Lazy::new(|| compile(r"(?i)\b(a|an|the)\s+(a|an|the)\b"));
static DANGLING_CONJUNCTION: Lazy<Regex> =
    Lazy::new(|| compile(r"\s+(?:and|or|but|while|with)\s*([.,;!?])"));
static ARTICLE: Lazy<Regex> = Lazy::new(|| compile(r"\b([Aa]n?)(\s+)([A-Za-z][\w'-]*)"));
static SPACED_HYPHEN: Lazy<Regex> = Lazy::new(|| compile(r"(\w)(?: -|- | - )(\w)"));
static REPEATED_HYPHEN: Lazy<Regex> = Lazy::new(|| compile(r"-{2,}"));
static JOINED_CONJUNCTION: Lazy<Regex> = Lazy::new(|| compile(r",\s*(and|but)\s*,"));
static SEMICOLON_CONJUNCTION: Lazy<Regex> = Lazy::new(|| compile(r";\s*(?:and|but)\s+"));
static WHILE_COMMA: Lazy<Regex> = Lazy::new(|| compile(r"\bwhile\s*,\s*"));
static COMMA_SPLICE: Lazy<Regex> =
    Lazy::new(|| compile(r", (it|this|they|she|he) (is|was|are|were|has|had)\b"));
static SPACE_BEFORE_PUNCT: Lazy<Regex> = Lazy::new(|| compile(r"\s+([,.;:!?])"));
static REPEATED_COMMA: Lazy<Regex> = Lazy::new(|| compile(r",{2,}"));
static REPEATED_SEMICOLON: Lazy<Regex> = Lazy::new(|| compile(r";{2,}"));
static REPEATED_PERIOD: Lazy<Regex> = Lazy::new(|| compile(r"\.{2,}"));
static REPEATED_BANG: Lazy<Regex> = Lazy::new(|| compile(r"!{2,}"));
static REPEATED_QUESTION: Lazy<Regex> = Lazy::new(|| compile(r"\?{2,}"));
static SOFT_BEFORE_TERMINAL: Lazy<Regex> = Lazy::new(|| compile(r"[,;:]+\s*([.!?])"));
static SOFT_AFTER_TERMINAL: Lazy<Regex> = Lazy::new(|| compile(r"([.!?])\s*[,;:]+"));
static MISSING_SPACE: Lazy<Regex> = Lazy::new(|| compile(r"([,;:.!?])([A-Za-z])"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| compile(r"\s+"));
static AFTER_TERMINAL: Lazy<Regex> = Lazy::new(|| compile(r"([.!?]\s+)(\p{Ll})"));
/// `a, b and c` where `a` opens a list: sentence start, after a preposition
/// or determiner, or after an earlier list item. "the broth thickens, salt
/// and smoke rise" is a clause boundary and stays untouched.
static LIST_WITHOUT_OXFORD: Lazy<Regex> = Lazy::new(|| {
    compile(
        r"(?i)(^|[.;:!?]\s+|\b(?:of|with|from|in|into|over|under|beside|and|or|the|a|an|its|their|some)\s+|\w+,\s+)(\w+), (\w+) and (\w+)",
    )
});
static COMPOUND_PATTERNS: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    COMPOUNDS
        .iter()
        .map(|(split, joined)| {
            let words = regex::escape(split).replace(' ', r"\s+");
            (compile(&format!(r"(?i)\b{}\b", words)), *joined)
        })
        .collect()
});

/// Word pairs written apart or with a space that should be hyphenated.
const COMPOUNDS: &[(&str, &str)] = &[
    ("sun dried", "sun-dried"),
    ("fire roasted", "fire-roasted"),
    ("hand picked", "hand-picked"),
    ("slow cooked", "slow-cooked"),
    ("smoke cured", "smoke-cured"),
    ("salt cured", "salt-cured"),
    ("honey glazed", "honey-glazed"),
    ("stone ground", "stone-ground"),
    ("wood fired", "wood-fired"),
    ("pan seared", "pan-seared"),
    ("long simmered", "long-simmered"),
    ("twice baked", "twice-baked"),
    ("ash baked", "ash-baked"),
    ("ember kissed", "ember-kissed"),
];

/// Vowel-initial words that take "a".
const CONSONANT_SOUND_PREFIXES: &[&str] = &[
    "uni", "use", "usu", "uti", "ure", "uro", "eu", "ewe", "one", "once", "ubiq",
];

/// Consonant-initial words that take "an".
const VOWEL_SOUND_PREFIXES: &[&str] = &["hour", "honest", "honor", "honour", "heir"];

/// Keyword → synonyms used to vary a repeated sentence.
const SYNONYMS: &[(&str, &[&str])] = &[
    ("rich", &["deep", "lush"]),
    ("tender", &["soft", "supple"]),
    ("fragrant", &["perfumed", "scented"]),
    ("warm", &["mellow", "cozy"]),
    ("bright", &["lively", "vivid"]),
    ("slow", &["patient", "unhurried"]),
    ("served", &["offered", "presented"]),
    ("dish", &["plate", "preparation"]),
    ("broth", &["stock", "liquor"]),
    ("flavor", &["taste", "savor"]),
    ("aroma", &["scent", "perfume"]),
    ("smoky", &["charred", "smoldering"]),
    ("sweet", &["honeyed", "sugared"]),
    ("crisp", &["brittle", "crackling"]),
    ("golden", &["amber", "burnished"]),
    ("table", &["hearth", "board"]),
    ("family", &["household", "kin"]),
    ("guests", &["visitors", "company"]),
    ("memory", &["remembrance", "recollection"]),
    ("evening", &["dusk", "nightfall"]),
    ("savory", &["hearty", "robust"]),
    ("simmered", &["stewed", "braised"]),
    ("shared", &["passed around", "divided"]),
    ("cooks", &["kitchens", "hearth-keepers"]),
];

/// Ritual vocabulary and the lighter words that replace its excess uses.
const RITUAL_VOCABULARY: &[(&str, &[&str])] = &[
    ("sacred", &["cherished", "treasured"]),
    ("ancestral", &["old", "family"]),
    ("ritual", &["custom", "habit"]),
    ("rituals", &["customs", "habits"]),
    ("ceremonial", &["festive", "formal"]),
    ("divine", &["wonderful", "splendid"]),
    ("blessed", &["lucky", "fortunate"]),
    ("hallowed", &["honored", "storied"]),
    ("holy", &["special", "beloved"]),
    ("mystical", &["curious", "strange"]),
    ("spiritual", &["heartfelt", "soulful"]),
    ("consecrated", &["dedicated", "reserved"]),
    ("sanctified", &["honored", "prized"]),
    ("ancient", &["old", "time-worn"]),
    ("eternal", &["lasting", "enduring"]),
    ("venerated", &["respected", "esteemed"]),
    ("offering", &["gift", "portion"]),
    ("offerings", &["gifts", "portions"]),
    ("rite", &["custom", "practice"]),
    ("rites", &["customs", "practices"]),
];

/// A single named rewrite pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CleanupPass {
    LiteralFixes,
    DuplicateWords,
    Articles,
    Compounds,
    RunOns,
    Punctuation,
    OxfordComma,
    SentenceDedup,
    JargonDensity,
}

impl CleanupPass {
    /// The fixed pass order.
    pub const ORDER: [CleanupPass; 9] = [
        CleanupPass::LiteralFixes,
        CleanupPass::DuplicateWords,
        CleanupPass::Articles,
        CleanupPass::Compounds,
        CleanupPass::RunOns,
        CleanupPass::Punctuation,
        CleanupPass::OxfordComma,
        CleanupPass::SentenceDedup,
        CleanupPass::JargonDensity,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Self::LiteralFixes => "literal_fixes",
            Self::DuplicateWords => "duplicate_words",
            Self::Articles => "articles",
            Self::Compounds => "compounds",
            Self::RunOns => "run_ons",
            Self::Punctuation => "punctuation",
            Self::OxfordComma => "oxford_comma",
            Self::SentenceDedup => "sentence_dedup",
            Self::JargonDensity => "jargon_density",
        }
    }

    pub fn apply(&self, text: &str, history: &mut SentenceHistory) -> String {
        match self {
            Self::LiteralFixes => fix_literals(text),
            Self::DuplicateWords => collapse_duplicate_words(text),
            Self::Articles => correct_articles(text),
            Self::Compounds => repair_compounds(text),
            Self::RunOns => repair_run_ons(text),
            Self::Punctuation => normalize_punctuation(text),
            Self::OxfordComma => apply_oxford_comma(text),
            Self::SentenceDedup => dedupe_sentences(text, history),
            Self::JargonDensity => control_jargon(text),
        }
    }
}

/// Bounded memory of normalized sentences.
#[derive(Debug)]
pub struct SentenceHistory {
    seen: RecencyCache,
}

impl SentenceHistory {
    pub fn new(capacity: usize) -> Self {
        Self {
            seen: RecencyCache::new(capacity),
        }
    }

    pub fn contains(&self, normalized: &str) -> bool {
        self.seen.has(normalized)
    }

    pub fn record(&mut self, normalized: &str) {
        if !normalized.is_empty() {
            self.seen.add(normalized);
        }
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    pub fn clear(&mut self) {
        self.seen.clear();
    }

    pub fn partial_clear(&mut self, keep: usize) {
        self.seen.partial_clear(keep);
    }
}

impl Default for SentenceHistory {
    fn default() -> Self {
        Self::new(SENTENCE_HISTORY)
    }
}

/// Run every pass once, in order.
pub fn run_passes(text: &str, history: &mut SentenceHistory) -> String {
    CleanupPass::ORDER
        .iter()
        .fold(text.to_string(), |current, pass| pass.apply(&current, history))
}

/// Clean `text` with a fresh sentence history, repeating the passes until
/// the output is stable.
pub fn cleanup(text: &str) -> String {
    let mut current = text.to_string();
    for round in 0..MAX_ROUNDS {
        let mut history = SentenceHistory::default();
        let next = run_passes(&current, &mut history);
        if next == current {
            trace!(rounds = round, "cleanup converged");
            return current;
        }
        current = next;
    }
    current
}

/// A session's cleanup: remembers sentences across texts so a line used in
/// one dish is varied when it comes back in the next.
#[derive(Debug)]
pub struct CleanupPipeline {
    history: SentenceHistory,
}

impl CleanupPipeline {
    pub fn new(history_capacity: usize) -> Self {
        Self {
            history: SentenceHistory::new(history_capacity),
        }
    }

    /// One ordered pass against the session history, then a stateless
    /// cleanup so the result is itself a fixpoint of [`cleanup`].
    pub fn run(&mut self, text: &str) -> String {
        let varied = run_passes(text, &mut self.history);
        cleanup(&varied)
    }

    pub fn history(&self) -> &SentenceHistory {
        &self.history
    }

    pub fn clear(&mut self) {
        self.history.clear();
    }

    pub fn soften(&mut self) {
        let keep = self.history.len() / 2;
        self.history.partial_clear(keep);
    }
}

impl Default for CleanupPipeline {
    fn default() -> Self {
        Self::new(SENTENCE_HISTORY)
    }
}

// ---------------------------------------------------------------------------
// Passes
// ---------------------------------------------------------------------------

/// Pass 1: doubled determiners and conjunctions stranded before punctuation.
pub fn fix_literals(text: &str) -> String {
    let text = DOUBLE_DETERMINER.replace_all(text, |caps: &Captures| {
        let first = &caps[1];
        let second = &caps[2];
        let keep = if first.eq_ignore_ascii_case("the") || second.eq_ignore_ascii_case("the") {
            "the"
        } else {
            second
        };
        match_case(first, &keep.to_lowercase())
    });
    DANGLING_CONJUNCTION.replace_all(&text, "$1").into_owned()
}

/// Pass 2: collapse repeated words ("the the") and repeated word pairs
/// ("rich broth rich broth").
pub fn collapse_duplicate_words(text: &str) -> String {
    let mut tokens: Vec<String> = text.split_whitespace().map(str::to_string).collect();
    if tokens.is_empty() {
        return text.to_string();
    }

    let mut changed = true;
    while changed {
        changed = false;
        let mut i = 0;
        while i + 1 < tokens.len() {
            // Single repeat: "the the" → "the". Punctuation of the second
            // token is kept.
            if is_bare_word(&tokens[i]) && same_word(&tokens[i], &tokens[i + 1]) {
                let merged = format!("{}{}", tokens[i], trailing_punct(&tokens[i + 1]));
                tokens.splice(i..i + 2, [merged]);
                changed = true;
                continue;
            }
            // Pair repeat: "rich broth rich broth" → "rich broth".
            if i + 3 < tokens.len()
                && is_bare_word(&tokens[i])
                && is_bare_word(&tokens[i + 1])
                && is_bare_word(&tokens[i + 2])
                && same_word(&tokens[i], &tokens[i + 2])
                && same_word(&tokens[i + 1], &tokens[i + 3])
            {
                let merged = format!("{}{}", tokens[i + 1], trailing_punct(&tokens[i + 3]));
                tokens.splice(i + 1..i + 4, [merged]);
                changed = true;
                continue;
            }
            i += 1;
        }
    }
    tokens.join(" ")
}

/// Pass 3: "a" before consonant sounds, "an" before vowel sounds.
pub fn correct_articles(text: &str) -> String {
    ARTICLE
        .replace_all(text, |caps: &Captures| {
            let article = &caps[1];
            let space = &caps[2];
            let word = &caps[3];
            let wanted = if starts_with_vowel_sound(word) { "an" } else { "a" };
            format!("{}{}{}", match_case(article, wanted), space, word)
        })
        .into_owned()
}

/// Pass 4: hyphenation repair.
pub fn repair_compounds(text: &str) -> String {
    let mut out = REPEATED_HYPHEN.replace_all(text, "-").into_owned();
    out = SPACED_HYPHEN.replace_all(&out, "$1-$2").into_owned();
    for (pattern, joined) in COMPOUND_PATTERNS.iter() {
        out = pattern
            .replace_all(&out, |caps: &Captures| match_case(&caps[0], joined))
            .into_owned();
    }
    out
}

/// Pass 5: comma splices, stray conjunctions after clause joins, and
/// sentences with too many joins.
pub fn repair_run_ons(text: &str) -> String {
    let mut out = JOINED_CONJUNCTION.replace_all(text, ", $1").into_owned();
    out = SEMICOLON_CONJUNCTION.replace_all(&out, "; ").into_owned();
    out = WHILE_COMMA.replace_all(&out, "while ").into_owned();
    out = COMMA_SPLICE.replace_all(&out, ". $1 $2").into_owned();

    let sentences: Vec<String> = split_sentences(&out)
        .into_iter()
        .map(split_overlong_sentence)
        .collect();
    if sentences.is_empty() {
        return out;
    }
    sentences.join(" ")
}

/// Pass 6: punctuation spacing, doubled punctuation, whitespace, and
/// capitalization after sentence terminators.
pub fn normalize_punctuation(text: &str) -> String {
    let mut out = text.to_string();
    loop {
        let mut next = WHITESPACE.replace_all(&out, " ").into_owned();
        next = SPACE_BEFORE_PUNCT.replace_all(&next, "$1").into_owned();
        next = REPEATED_COMMA.replace_all(&next, ",").into_owned();
        next = REPEATED_SEMICOLON.replace_all(&next, ";").into_owned();
        next = REPEATED_PERIOD.replace_all(&next, ".").into_owned();
        next = REPEATED_BANG.replace_all(&next, "!").into_owned();
        next = REPEATED_QUESTION.replace_all(&next, "?").into_owned();
        next = SOFT_BEFORE_TERMINAL.replace_all(&next, "$1").into_owned();
        next = SOFT_AFTER_TERMINAL.replace_all(&next, "$1").into_owned();
        next = MISSING_SPACE.replace_all(&next, "$1 $2").into_owned();
        next = AFTER_TERMINAL
            .replace_all(&next, |caps: &Captures| {
                format!("{}{}", &caps[1], caps[2].to_uppercase())
            })
            .into_owned();
        let next = next.trim().to_string();
        if next == out {
            return out;
        }
        out = next;
    }
}

/// Pass 7: "salt, pepper and ash" → "salt, pepper, and ash".
pub fn apply_oxford_comma(text: &str) -> String {
    LIST_WITHOUT_OXFORD
        .replace_all(text, "$1$2, $3, and $4")
        .into_owned()
}

/// Pass 8: vary sentences already seen, by swapping one keyword for a
/// synonym. Sentences are never dropped; one with no usable keyword is
/// kept as is.
pub fn dedupe_sentences(text: &str, history: &mut SentenceHistory) -> String {
    let sentences = split_sentences(text);
    if sentences.is_empty() {
        return text.to_string();
    }

    let mut out = Vec::with_capacity(sentences.len());
    for sentence in sentences {
        let key = normalize_sentence(sentence);
        let mut chosen = sentence.to_string();
        if !key.is_empty() && history.contains(&key) {
            if let Some(varied) =
                substitute_synonym(sentence, |candidate| !history.contains(candidate))
            {
                trace!(from = sentence, to = %varied, "repeated sentence varied");
                chosen = varied;
            }
        }
        history.record(&normalize_sentence(&chosen));
        out.push(chosen);
    }
    out.join(" ")
}

/// Pass 9: when ritual vocabulary passes the density threshold, keep the
/// first two uses of each term and lighten the rest.
pub fn control_jargon(text: &str) -> String {
    let tokens: Vec<&str> = text.split(' ').collect();
    let words = tokens.iter().filter(|t| !word_core(t).is_empty()).count();
    let ritual = tokens
        .iter()
        .filter(|t| ritual_alternatives(&word_core(t).to_lowercase()).is_some())
        .count();
    if words == 0 || (ritual as f64 / words as f64) <= JARGON_THRESHOLD {
        return text.to_string();
    }

    let mut uses: FxHashMap<String, usize> = FxHashMap::default();
    let rebuilt: Vec<String> = tokens
        .iter()
        .map(|token| {
            let core = word_core(token).to_lowercase();
            let Some(lighter) = ritual_alternatives(&core) else {
                return token.to_string();
            };
            let n = uses.entry(core).or_default();
            *n += 1;
            if *n <= JARGON_KEEP {
                return token.to_string();
            }
            replace_core(token, lighter[(*n - JARGON_KEEP - 1) % lighter.len()])
        })
        .collect();
    rebuilt.join(" ")
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Split text into sentences at `.`, `!` or `?` followed by whitespace or the
/// end of the text. Terminators stay attached.
pub fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    for (i, c) in text.char_indices() {
        if matches!(c, '.' | '!' | '?') {
            let end = i + c.len_utf8();
            let boundary = text[end..].chars().next().map_or(true, char::is_whitespace);
            if boundary {
                let sentence = text[start..end].trim();
                if !sentence.is_empty() {
                    sentences.push(sentence);
                }
                start = end;
            }
        }
    }
    let rest = text[start..].trim();
    if !rest.is_empty() {
        sentences.push(rest);
    }
    sentences
}

/// Lowercase letters only; the comparison key for repeated sentences.
pub fn normalize_sentence(sentence: &str) -> String {
    sentence
        .chars()
        .filter(|c| c.is_alphabetic())
        .flat_map(char::to_lowercase)
        .collect()
}

pub fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// `replacement` with the first letter upper-cased if `original` starts
/// upper-case.
fn match_case(original: &str, replacement: &str) -> String {
    if original.chars().next().is_some_and(char::is_uppercase) {
        capitalize(replacement)
    } else {
        replacement.to_string()
    }
}

fn starts_with_vowel_sound(word: &str) -> bool {
    let lower = word.to_lowercase();
    if VOWEL_SOUND_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return true;
    }
    if CONSONANT_SOUND_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return false;
    }
    lower.starts_with(['a', 'e', 'i', 'o', 'u'])
}

/// The token without leading/trailing punctuation.
fn word_core(token: &str) -> &str {
    token.trim_matches(|c: char| !c.is_alphanumeric())
}

fn is_bare_word(token: &str) -> bool {
    !token.is_empty() && word_core(token) == token
}

fn same_word(a: &str, b: &str) -> bool {
    let (a, b) = (word_core(a), word_core(b));
    !a.is_empty() && a.to_lowercase() == b.to_lowercase()
}

fn trailing_punct(token: &str) -> &str {
    let core_end = token
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_alphanumeric())
        .map(|(i, c)| i + c.len_utf8())
        .unwrap_or(0);
    &token[core_end..]
}

/// Swap a token's word core for `word`, keeping punctuation and case.
fn replace_core(token: &str, word: &str) -> String {
    let core = word_core(token);
    if core.is_empty() {
        return token.to_string();
    }
    let start = token.find(core).unwrap_or(0);
    let end = start + core.len();
    format!("{}{}{}", &token[..start], match_case(core, word), &token[end..])
}

fn ritual_alternatives(word: &str) -> Option<&'static [&'static str]> {
    RITUAL_VOCABULARY
        .iter()
        .find(|(term, _)| *term == word)
        .map(|(_, lighter)| *lighter)
}

fn synonyms_for(word: &str) -> Option<&'static [&'static str]> {
    SYNONYMS
        .iter()
        .find(|(term, _)| *term == word)
        .map(|(_, alternatives)| *alternatives)
}

/// First keyword/synonym swap whose normalized result `accept` allows.
fn substitute_synonym<F>(sentence: &str, accept: F) -> Option<String>
where
    F: Fn(&str) -> bool,
{
    let tokens: Vec<&str> = sentence.split(' ').collect();
    for (i, token) in tokens.iter().enumerate() {
        let Some(alternatives) = synonyms_for(&word_core(token).to_lowercase()) else {
            continue;
        };
        for alternative in alternatives {
            let mut candidate: Vec<String> = tokens.iter().map(|t| t.to_string()).collect();
            candidate[i] = replace_core(token, alternative);
            let candidate = candidate.join(" ");
            if accept(&normalize_sentence(&candidate)) {
                return Some(candidate);
            }
        }
    }
    None
}

/// Break a sentence with more than [`MAX_JOINS`] clause joins at its last
/// semicolon or ", while" join.
fn split_overlong_sentence(sentence: &str) -> String {
    let mut out = sentence.to_string();
    loop {
        let joins = out.matches("; ").count()
            + out.matches(", while ").count()
            + out.matches(", and ").count();
        if joins <= MAX_JOINS {
            return out;
        }
        let last_semicolon = out.rfind("; ").map(|i| (i, 2));
        let last_while = out.rfind(", while ").map(|i| (i, 8));
        let Some((at, len)) = last_semicolon.max(last_while) else {
            return out;
        };
        let rest = capitalize(&out[at + len..]);
        out = format!("{}. {}", &out[..at], rest);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scenario_doubled_words() {
        assert_eq!(cleanup("the the dish and and spices"), "the dish and spices");
    }

    #[test]
    fn pass_order_is_fixed() {
        let names: Vec<&str> = CleanupPass::ORDER.iter().map(|p| p.name()).collect();
        assert_eq!(
            names,
            vec![
                "literal_fixes",
                "duplicate_words",
                "articles",
                "compounds",
                "run_ons",
                "punctuation",
                "oxford_comma",
                "sentence_dedup",
                "jargon_density",
            ]
        );
    }

    #[test]
    fn literal_fixes_doubled_determiners() {
        assert_eq!(fix_literals("a the stew"), "the stew");
        assert_eq!(fix_literals("The a stew"), "The stew");
        assert_eq!(fix_literals("a an ember"), "an ember");
    }

    #[test]
    fn literal_fixes_dangling_conjunctions() {
        assert_eq!(fix_literals("salt and, pepper"), "salt, pepper");
        assert_eq!(fix_literals("served with."), "served.");
    }

    #[test]
    fn duplicate_words_single_and_pair() {
        assert_eq!(collapse_duplicate_words("the the dish"), "the dish");
        assert_eq!(collapse_duplicate_words("The the dish"), "The dish");
        assert_eq!(collapse_duplicate_words("and and and"), "and");
        assert_eq!(collapse_duplicate_words("a rich broth rich broth."), "a rich broth.");
        assert_eq!(collapse_duplicate_words("spices spices."), "spices.");
    }

    #[test]
    fn duplicate_words_respects_punctuation_between() {
        assert_eq!(collapse_duplicate_words("salt, salt"), "salt, salt");
    }

    #[test]
    fn articles_follow_sound() {
        assert_eq!(correct_articles("a ember"), "an ember");
        assert_eq!(correct_articles("an broth"), "a broth");
        assert_eq!(correct_articles("A onion"), "An onion");
        assert_eq!(correct_articles("an unique dish"), "a unique dish");
        assert_eq!(correct_articles("a hour"), "an hour");
        assert_eq!(correct_articles("a golden crust"), "a golden crust");
    }

    #[test]
    fn compounds_are_hyphenated() {
        assert_eq!(repair_compounds("sun dried figs"), "sun-dried figs");
        assert_eq!(repair_compounds("Slow cooked stew"), "Slow-cooked stew");
        assert_eq!(repair_compounds("ember - braised"), "ember-braised");
        assert_eq!(repair_compounds("ember--braised"), "ember-braised");
    }

    #[test]
    fn run_ons_are_split() {
        assert_eq!(
            repair_run_ons("The stew thickens, it is ready."),
            "The stew thickens. it is ready."
        );
        assert_eq!(repair_run_ons("salt; and pepper"), "salt; pepper");
        assert_eq!(repair_run_ons("while, the broth"), "while the broth");

        let long = "a; b, while c; d, and e.";
        assert_eq!(repair_run_ons(long), "a; b, while c. D, and e.");
    }

    #[test]
    fn punctuation_is_normalized() {
        assert_eq!(normalize_punctuation("salt ,pepper"), "salt, pepper");
        assert_eq!(normalize_punctuation("done.. next"), "done. Next");
        assert_eq!(normalize_punctuation("rich,, deep ."), "rich, deep.");
        assert_eq!(normalize_punctuation("rich,."), "rich.");
        assert_eq!(normalize_punctuation("  spaced   out  "), "spaced out");
        assert_eq!(normalize_punctuation("one. two! three? four"), "one. Two! Three? Four");
    }

    #[test]
    fn oxford_comma_inserted() {
        assert_eq!(
            apply_oxford_comma("salt, pepper and ash"),
            "salt, pepper, and ash"
        );
        assert_eq!(
            apply_oxford_comma("salt, pepper, and ash"),
            "salt, pepper, and ash"
        );
    }

    #[test]
    fn oxford_comma_leaves_clause_boundaries_alone() {
        assert_eq!(
            apply_oxford_comma("the broth thickens, salt and smoke rise"),
            "the broth thickens, salt and smoke rise"
        );
        assert_eq!(
            apply_oxford_comma("a stew of goat, leek and salt"),
            "a stew of goat, leek, and salt"
        );
        assert_eq!(
            apply_oxford_comma("It simmers. Salt, pepper and ash follow."),
            "It simmers. Salt, pepper, and ash follow."
        );
        assert_eq!(
            apply_oxford_comma("salt, pepper, leek and ash"),
            "salt, pepper, leek, and ash"
        );
        assert_eq!(
            cleanup("The broth thickens, salt and smoke rise."),
            "The broth thickens, salt and smoke rise."
        );
    }

    #[test]
    fn repeated_sentence_gets_synonym() {
        let mut history = SentenceHistory::default();
        let out = dedupe_sentences("A rich broth. A rich broth.", &mut history);
        assert_eq!(out, "A rich broth. A deep broth.");
    }

    #[test]
    fn repeated_sentence_without_keyword_is_kept() {
        let mut history = SentenceHistory::default();
        let out = dedupe_sentences("Xyz. Xyz.", &mut history);
        assert_eq!(out, "Xyz. Xyz.");
    }

    #[test]
    fn dedupe_remembers_across_calls() {
        let mut history = SentenceHistory::default();
        dedupe_sentences("The broth is warm.", &mut history);
        let out = dedupe_sentences("The broth is warm.", &mut history);
        assert_eq!(out, "The stock is warm.");
    }

    #[test]
    fn sentence_history_is_bounded() {
        let mut history = SentenceHistory::new(50);
        for i in 0..200 {
            history.record(&format!("sentence{}", "x".repeat(i % 70)));
            assert!(history.len() <= 50);
        }
    }

    #[test]
    fn jargon_is_lightened_past_threshold() {
        let text = "sacred sacred rice, sacred salt, sacred smoke";
        let out = control_jargon(text);
        assert_eq!(out, "sacred sacred rice, cherished salt, treasured smoke");
    }

    #[test]
    fn jargon_below_threshold_untouched() {
        let text = "A sacred bowl of rice with salt, smoke, pepper, oil, herbs, and a little sacred ash and sacred dust from the old sacred hearth of the house by the sea where we cook every day";
        assert_eq!(control_jargon(text), text);
    }

    #[test]
    fn split_sentences_keeps_terminators() {
        assert_eq!(
            split_sentences("One. Two! Three? four"),
            vec!["One.", "Two!", "Three?", "four"]
        );
        assert_eq!(split_sentences("3.5 cups. Done."), vec!["3.5 cups.", "Done."]);
        assert!(split_sentences("   ").is_empty());
    }

    #[test]
    fn normalization_strips_non_letters() {
        assert_eq!(normalize_sentence("The Broth, warm!"), "thebrothwarm");
    }

    #[test]
    fn cleanup_is_idempotent_on_tricky_inputs() {
        let inputs = [
            "",
            "   ",
            "the the dish and and spices",
            "a ember - roasted onion ,, served with.",
            "A rich broth. A rich broth. A rich broth. A rich broth.",
            "sacred sacred sacred rite; and ancient ancient rite, while, holy holy offering.",
            "salt, pepper and ash and and and honey",
            "it simmers, it is done, it was good; and then; and more; and more, while more, while less.",
            "a offering of a an hour , truly.. truly!!",
            "The stew thickens, it is ready. the stew thickens, it is ready.",
            "sun dried sun dried figs, fire roasted.",
            "an unique an uncommon a umbrella a honest cook",
            "Xyz. Xyz. Xyz.",
            "no terminal punctuation here",
            "ends with a comma,",
            "?!.,;:",
            "ember--kissed -- dish - here",
        ];
        for input in inputs {
            let once = cleanup(input);
            let twice = cleanup(&once);
            assert_eq!(once, twice, "not idempotent for input {:?}", input);
        }
    }

    #[test]
    fn pipeline_varies_across_texts_and_stays_clean() {
        let mut pipeline = CleanupPipeline::default();
        let first = pipeline.run("The broth is warm.");
        let second = pipeline.run("The broth is warm.");
        assert_eq!(first, "The broth is warm.");
        assert_ne!(first, second);
        assert_eq!(cleanup(&second), second);
        assert!(!pipeline.history().is_empty());

        pipeline.clear();
        assert!(pipeline.history().is_empty());
        assert_eq!(pipeline.run("The broth is warm."), "The broth is warm.");
    }
}
