/// Phrase fragments: slot templates, parsing, and RON-loaded phrase banks.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use crate::core::selector::BannedPairs;

#[derive(Debug, Error)]
pub enum FragmentError {
    #[error("fragment parse error in '{fragment}': {reason}")]
    Parse { fragment: String, reason: String },
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("RON deserialization error: {0}")]
    Ron(#[from] ron::error::SpannedError),
}

/// A value slot a fragment can reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Slot {
    /// The featured ingredient.
    Ingredient,
    /// A supporting ingredient.
    Accent,
    /// Technique display name.
    Technique,
    /// Technique past participle.
    Prepared,
    Nation,
    Demonym,
    Festival,
    /// A sensory adjective from the dish's intensity tier.
    Sensory,
    /// Cultural title chosen by maximum rarity.
    Title,
    Honorific,
}

impl Slot {
    pub fn from_name(name: &str) -> Option<Slot> {
        match name {
            "ingredient" => Some(Self::Ingredient),
            "accent" => Some(Self::Accent),
            "technique" => Some(Self::Technique),
            "prepared" => Some(Self::Prepared),
            "nation" => Some(Self::Nation),
            "demonym" => Some(Self::Demonym),
            "festival" => Some(Self::Festival),
            "sensory" => Some(Self::Sensory),
            "title" => Some(Self::Title),
            "honorific" => Some(Self::Honorific),
            _ => None,
        }
    }
}

/// A segment of a parsed fragment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Segment {
    /// Literal text, emitted as-is.
    Literal(String),
    /// A slot filled at render time: `{ingredient}`, `{festival}`, ...
    Slot(Slot),
}

/// Values available to fill slots for one dish.
pub type SlotValues = FxHashMap<Slot, String>;

/// A phrase fragment: its raw text (used as the identity for recency
/// tracking) and the parsed segments.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fragment {
    pub text: String,
    pub segments: Vec<Segment>,
}

impl AsRef<str> for Fragment {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

impl Fragment {
    /// Parse fragment text into segments.
    ///
    /// Syntax:
    /// - `{slot}` → `Slot` (see [`Slot::from_name`] for the names)
    /// - `{{` / `}}` → literal braces
    /// - Everything else → `Literal`
    pub fn parse(input: &str) -> Result<Fragment, FragmentError> {
        let err = |reason: &str| FragmentError::Parse {
            fragment: input.to_string(),
            reason: reason.to_string(),
        };

        let mut segments = Vec::new();
        let mut literal_buf = String::new();
        let chars: Vec<char> = input.chars().collect();
        let len = chars.len();
        let mut i = 0;

        while i < len {
            match chars[i] {
                '{' if i + 1 < len && chars[i + 1] == '{' => {
                    literal_buf.push('{');
                    i += 2;
                }
                '{' => {
                    if !literal_buf.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal_buf)));
                    }

                    let start = i + 1;
                    let mut end = start;
                    while end < len && chars[end] != '}' {
                        if chars[end] == '{' {
                            return Err(err("nested braces are not allowed"));
                        }
                        end += 1;
                    }
                    if end == len {
                        return Err(err("unclosed brace"));
                    }

                    let name: String = chars[start..end].iter().collect();
                    if name.is_empty() {
                        return Err(err("empty braces"));
                    }
                    let slot = Slot::from_name(&name)
                        .ok_or_else(|| err(&format!("unknown slot '{}'", name)))?;
                    segments.push(Segment::Slot(slot));
                    i = end + 1;
                }
                '}' if i + 1 < len && chars[i + 1] == '}' => {
                    literal_buf.push('}');
                    i += 2;
                }
                '}' => return Err(err("unmatched closing brace")),
                c => {
                    literal_buf.push(c);
                    i += 1;
                }
            }
        }

        if !literal_buf.is_empty() {
            segments.push(Segment::Literal(literal_buf));
        }

        Ok(Fragment {
            text: input.to_string(),
            segments,
        })
    }

    pub fn slots(&self) -> impl Iterator<Item = Slot> + '_ {
        self.segments.iter().filter_map(|s| match s {
            Segment::Slot(slot) => Some(*slot),
            Segment::Literal(_) => None,
        })
    }

    /// Whether every slot this fragment uses has a value.
    pub fn renderable(&self, values: &SlotValues) -> bool {
        self.slots().all(|slot| values.contains_key(&slot))
    }

    /// Fill slots from `values`. Missing values render as nothing.
    pub fn render(&self, values: &SlotValues) -> String {
        let mut out = String::new();
        for segment in &self.segments {
            match segment {
                Segment::Literal(text) => out.push_str(text),
                Segment::Slot(slot) => {
                    if let Some(value) = values.get(slot) {
                        out.push_str(value);
                    }
                }
            }
        }
        out
    }
}

/// Named categories of fragments plus the banned adjacent pairs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FragmentBank {
    pub categories: FxHashMap<String, Vec<Fragment>>,
    pub banned_pairs: BannedPairs,
}

// The RON file stores plain strings; they are parsed into fragments on load.
#[derive(Debug, Deserialize)]
struct RonBank {
    categories: FxHashMap<String, Vec<String>>,
    #[serde(default)]
    banned_pairs: Vec<(String, String)>,
}

impl FragmentBank {
    /// Load a fragment bank from a RON file.
    pub fn load_from_ron(path: &Path) -> Result<FragmentBank, FragmentError> {
        let contents = std::fs::read_to_string(path)?;
        Self::parse_ron(&contents)
    }

    /// Parse a fragment bank from a RON string.
    pub fn parse_ron(input: &str) -> Result<FragmentBank, FragmentError> {
        let raw: RonBank = ron::from_str(input)?;
        let mut categories = FxHashMap::default();
        for (name, texts) in raw.categories {
            let fragments = texts
                .iter()
                .map(|t| Fragment::parse(t))
                .collect::<Result<Vec<_>, _>>()?;
            categories.insert(name, fragments);
        }
        Ok(FragmentBank {
            categories,
            banned_pairs: BannedPairs::from_pairs(raw.banned_pairs),
        })
    }

    /// Merge another bank into this one. Categories from `other` replace
    /// categories with the same name; banned pairs are unioned.
    pub fn merge(&mut self, other: FragmentBank) {
        for (name, fragments) in other.categories {
            self.categories.insert(name, fragments);
        }
        self.banned_pairs.extend(&other.banned_pairs);
    }

    pub fn category(&self, name: &str) -> &[Fragment] {
        self.categories
            .get(name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Required categories that are absent or empty.
    pub fn missing_categories<'a>(&self, required: &[&'a str]) -> Vec<&'a str> {
        required
            .iter()
            .copied()
            .filter(|name| self.category(name).is_empty())
            .collect()
    }
}
