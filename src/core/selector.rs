/// Weighted anti-clustering selection: the one randomness primitive every
/// text-producing component goes through.
///
/// Each candidate starts at weight 1.0 and is damped for appearing in the
/// stream's last few picks, for recent use anywhere in the session, and for
/// forming a banned pair with a recent pick.
use rand::rngs::StdRng;
use rand::Rng;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

/// How many picks per stream are kept for local anti-repeat and pair checks.
const STREAM_MEMORY: usize = 8;

/// Tuning constants for the selector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SelectorConfig {
    /// Number of most recent stream entries checked for repeats and pairs.
    pub local_depth: usize,
    /// Multiplier per local repeat (0.3^k).
    pub local_decay: f64,
    /// Multiplier per use inside the global window (0.5^m).
    pub global_decay: f64,
    /// Global window length, counted in selection calls.
    pub global_window: u64,
    /// Multiplier applied once when a banned pair is formed.
    pub banned_penalty: f64,
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            local_depth: 3,
            local_decay: 0.3,
            global_decay: 0.5,
            global_window: 30,
            banned_penalty: 0.1,
        }
    }
}

/// Ordered pairs of phrases that read badly back to back.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BannedPairs {
    pairs: FxHashSet<(String, String)>,
}

impl BannedPairs {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_pairs<I, A, B>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (A, B)>,
        A: Into<String>,
        B: Into<String>,
    {
        Self {
            pairs: pairs
                .into_iter()
                .map(|(a, b)| (a.into(), b.into()))
                .collect(),
        }
    }

    pub fn ban(&mut self, first: &str, second: &str) {
        self.pairs.insert((first.to_string(), second.to_string()));
    }

    /// True if `second` may not directly follow `first`.
    pub fn is_banned(&self, first: &str, second: &str) -> bool {
        self.pairs
            .contains(&(first.to_string(), second.to_string()))
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn extend(&mut self, other: &BannedPairs) {
        self.pairs.extend(other.pairs.iter().cloned());
    }
}

/// Weight for one candidate given its stream history (oldest first) and its
/// number of uses inside the global window.
pub fn candidate_weight(
    candidate: &str,
    recent: &[String],
    global_uses: u32,
    banned: &BannedPairs,
    config: &SelectorConfig,
) -> f64 {
    let local_start = recent.len().saturating_sub(config.local_depth);
    let local = &recent[local_start..];

    let repeats = local.iter().filter(|r| r.as_str() == candidate).count() as i32;
    let mut weight = config.local_decay.powi(repeats);
    weight *= config.global_decay.powi(global_uses as i32);

    if local.iter().any(|prev| banned.is_banned(prev, candidate)) {
        weight *= config.banned_penalty;
    }
    weight
}

/// Roulette-wheel choice over precomputed weights.
///
/// Draws `r` uniformly in [0, total) and walks the candidates until the
/// running sum exceeds it. Degenerate weights fall back to the last index.
pub fn weighted_index(weights: &[f64], rng: &mut StdRng) -> Option<usize> {
    if weights.is_empty() {
        return None;
    }
    let total: f64 = weights.iter().filter(|w| w.is_finite() && **w > 0.0).sum();
    let last = weights.len() - 1;
    if total <= f64::EPSILON || !total.is_finite() {
        return Some(last);
    }

    let r = rng.gen::<f64>() * total;
    let mut running = 0.0;
    for (i, w) in weights.iter().enumerate() {
        if w.is_finite() && *w > 0.0 {
            running += w;
        }
        if running > r {
            return Some(i);
        }
    }
    Some(last)
}

/// Session-owned selection state: per-stream recent picks and global usage.
///
/// A stream is a named sequence of related picks ("opening", "benefit", ...).
/// Local anti-repeat and banned pairs look at the stream; the global window
/// looks at every pick in the session.
#[derive(Debug, Clone)]
pub struct AntiClusterSelector {
    config: SelectorConfig,
    banned: BannedPairs,
    streams: FxHashMap<String, VecDeque<String>>,
    usage: FxHashMap<String, VecDeque<u64>>,
    tick: u64,
}

impl AntiClusterSelector {
    pub fn new(config: SelectorConfig) -> Self {
        Self {
            config,
            banned: BannedPairs::default(),
            streams: FxHashMap::default(),
            usage: FxHashMap::default(),
            tick: 0,
        }
    }

    pub fn with_banned_pairs(mut self, banned: BannedPairs) -> Self {
        self.banned = banned;
        self
    }

    pub fn config(&self) -> &SelectorConfig {
        &self.config
    }

    pub fn banned_pairs(&self) -> &BannedPairs {
        &self.banned
    }

    pub fn banned_pairs_mut(&mut self) -> &mut BannedPairs {
        &mut self.banned
    }

    /// Pick one candidate and record it. Returns `None` only for an empty
    /// candidate list.
    pub fn select<'c, S: AsRef<str>>(
        &mut self,
        stream: &str,
        candidates: &'c [S],
        rng: &mut StdRng,
    ) -> Option<&'c S> {
        let weights = self.weights(stream, candidates);
        let index = weighted_index(&weights, rng)?;
        let chosen = &candidates[index];
        self.record(stream, chosen.as_ref());
        Some(chosen)
    }

    /// Current weights for `candidates` in `stream`, without recording.
    pub fn weights<S: AsRef<str>>(&self, stream: &str, candidates: &[S]) -> Vec<f64> {
        let recent: Vec<String> = self
            .streams
            .get(stream)
            .map(|h| h.iter().cloned().collect())
            .unwrap_or_default();
        candidates
            .iter()
            .map(|c| {
                let text = c.as_ref();
                candidate_weight(
                    text,
                    &recent,
                    self.global_uses(text),
                    &self.banned,
                    &self.config,
                )
            })
            .collect()
    }

    /// Record a pick made outside `select`, so it still counts toward
    /// anti-repeat.
    pub fn record(&mut self, stream: &str, value: &str) {
        self.tick += 1;
        let history = self.streams.entry(stream.to_string()).or_default();
        history.push_back(value.to_string());
        while history.len() > STREAM_MEMORY {
            history.pop_front();
        }

        let cutoff = self.window_start();
        let uses = self.usage.entry(value.to_string()).or_default();
        uses.push_back(self.tick);
        while uses.front().is_some_and(|t| *t < cutoff) {
            uses.pop_front();
        }

        if self.tick % self.config.global_window.max(1) == 0 {
            self.sweep(cutoff);
        }
    }

    /// Drop usage for values not picked inside the window.
    fn sweep(&mut self, cutoff: u64) {
        self.usage.retain(|_, ticks| {
            while ticks.front().is_some_and(|t| *t < cutoff) {
                ticks.pop_front();
            }
            !ticks.is_empty()
        });
    }

    /// Number of values with usage recorded inside the window.
    pub fn tracked_values(&self) -> usize {
        self.usage.len()
    }

    /// Times `value` was picked within the trailing global window.
    pub fn global_uses(&self, value: &str) -> u32 {
        let cutoff = self.window_start();
        self.usage
            .get(value)
            .map(|ticks| ticks.iter().filter(|t| **t >= cutoff).count() as u32)
            .unwrap_or(0)
    }

    /// Most recent picks in a stream, oldest first.
    pub fn recent(&self, stream: &str) -> Vec<&str> {
        self.streams
            .get(stream)
            .map(|h| h.iter().map(String::as_str).collect())
            .unwrap_or_default()
    }

    pub fn clear(&mut self) {
        self.streams.clear();
        self.usage.clear();
        self.tick = 0;
    }

    /// Forget global usage but keep the last pick of every stream, so the
    /// next batch does not open with the line the previous one ended on.
    pub fn soften(&mut self) {
        self.usage.clear();
        for history in self.streams.values_mut() {
            while history.len() > 1 {
                history.pop_front();
            }
        }
    }

    fn window_start(&self) -> u64 {
        self.tick.saturating_sub(self.config.global_window) + 1
    }
}

impl Default for AntiClusterSelector {
    fn default() -> Self {
        Self::new(SelectorConfig::default())
    }
}
