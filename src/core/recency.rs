/// Recency caches: bounded, insertion-ordered sets of recently emitted text.
///
/// The prose assembler filters fragment candidates through these so the same
/// opening or festival does not come back a few dishes later.
use lru::LruCache;
use std::num::NonZeroUsize;
use tracing::trace;

/// A bounded set that remembers the most recent `capacity` insertions.
///
/// Re-adding an item already present does not refresh its position; eviction
/// is strictly by first insertion.
#[derive(Debug)]
pub struct RecencyCache {
    entries: LruCache<String, ()>,
}

impl RecencyCache {
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            entries: LruCache::new(capacity),
        }
    }

    /// Insert an item, evicting the oldest entry when full.
    pub fn add(&mut self, item: &str) {
        if self.entries.contains(item) {
            return;
        }
        self.entries.push(item.to_string(), ());
    }

    pub fn has(&self, item: &str) -> bool {
        self.entries.contains(item)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop everything except the `keep_count` newest entries.
    pub fn partial_clear(&mut self, keep_count: usize) {
        while self.entries.len() > keep_count {
            self.entries.pop_lru();
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Entries from newest to oldest.
    pub fn newest_first(&self) -> Vec<&str> {
        self.entries.iter().map(|(k, _)| k.as_str()).collect()
    }
}

/// The fragment categories that each keep their own cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheKind {
    /// Prose fragments: openings, sensory lines, serving context.
    Prose,
    Festival,
    /// Short alternatives: titles, benefits, name patterns.
    Phrase,
    /// Techniques used in recent dishes.
    Technique,
}

/// Capacities for every cache in a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheCapacities {
    pub prose: usize,
    pub festival: usize,
    pub phrase: usize,
    pub technique: usize,
}

impl Default for CacheCapacities {
    fn default() -> Self {
        Self {
            prose: 30,
            festival: 8,
            phrase: 25,
            technique: 3,
        }
    }
}

/// One recency cache per fragment category.
#[derive(Debug)]
pub struct RecencyCaches {
    prose: RecencyCache,
    festival: RecencyCache,
    phrase: RecencyCache,
    technique: RecencyCache,
}

impl RecencyCaches {
    pub fn new(capacities: CacheCapacities) -> Self {
        Self {
            prose: RecencyCache::new(capacities.prose),
            festival: RecencyCache::new(capacities.festival),
            phrase: RecencyCache::new(capacities.phrase),
            technique: RecencyCache::new(capacities.technique),
        }
    }

    pub fn get(&self, kind: CacheKind) -> &RecencyCache {
        match kind {
            CacheKind::Prose => &self.prose,
            CacheKind::Festival => &self.festival,
            CacheKind::Phrase => &self.phrase,
            CacheKind::Technique => &self.technique,
        }
    }

    pub fn get_mut(&mut self, kind: CacheKind) -> &mut RecencyCache {
        match kind {
            CacheKind::Prose => &mut self.prose,
            CacheKind::Festival => &mut self.festival,
            CacheKind::Phrase => &mut self.phrase,
            CacheKind::Technique => &mut self.technique,
        }
    }

    pub fn add(&mut self, kind: CacheKind, item: &str) {
        self.get_mut(kind).add(item);
    }

    /// Candidates not currently cached. When every candidate is cached the
    /// category has run out of variety: its cache is cleared and all
    /// candidates are returned for this call.
    pub fn fresh<'c, S: AsRef<str>>(&mut self, kind: CacheKind, candidates: &'c [S]) -> Vec<&'c S> {
        let cache = self.get_mut(kind);
        let fresh: Vec<&S> = candidates
            .iter()
            .filter(|c| !cache.has(c.as_ref()))
            .collect();
        if fresh.is_empty() && !candidates.is_empty() {
            trace!(?kind, candidates = candidates.len(), "recency cache exhausted, clearing");
            cache.clear();
            return candidates.iter().collect();
        }
        fresh
    }

    pub fn clear_all(&mut self) {
        self.prose.clear();
        self.festival.clear();
        self.phrase.clear();
        self.technique.clear();
    }

    /// Keep the newest half of every cache.
    pub fn soften_all(&mut self) {
        for cache in [
            &mut self.prose,
            &mut self.festival,
            &mut self.phrase,
            &mut self.technique,
        ] {
            let keep = cache.len() / 2;
            cache.partial_clear(keep);
        }
    }
}

impl Default for RecencyCaches {
    fn default() -> Self {
        Self::new(CacheCapacities::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn add_and_has() {
        let mut cache = RecencyCache::new(3);
        cache.add("smoke");
        assert!(cache.has("smoke"));
        assert!(!cache.has("brine"));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn evicts_oldest_when_full() {
        let mut cache = RecencyCache::new(2);
        cache.add("a");
        cache.add("b");
        cache.add("c");
        assert!(!cache.has("a"));
        assert!(cache.has("b"));
        assert!(cache.has("c"));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn re_adding_does_not_refresh_position() {
        let mut cache = RecencyCache::new(2);
        cache.add("a");
        cache.add("b");
        cache.add("a");
        cache.add("c");
        // "a" was inserted first, so it is evicted even though it was re-added.
        assert!(!cache.has("a"));
        assert!(cache.has("b"));
        assert!(cache.has("c"));
    }

    #[test]
    fn size_never_exceeds_capacity() {
        let mut cache = RecencyCache::new(8);
        for i in 0..500 {
            cache.add(&format!("item-{}", i % 37));
            assert!(cache.len() <= cache.capacity());
        }
        assert_eq!(cache.len(), 8);
    }

    #[test]
    fn partial_clear_keeps_newest() {
        let mut cache = RecencyCache::new(5);
        for item in ["a", "b", "c", "d", "e"] {
            cache.add(item);
        }
        cache.partial_clear(2);
        assert_eq!(cache.len(), 2);
        assert_eq!(cache.newest_first(), vec!["e", "d"]);
    }

    #[test]
    fn clear_empties() {
        let mut cache = RecencyCache::new(5);
        cache.add("a");
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn zero_capacity_is_clamped_to_one() {
        let mut cache = RecencyCache::new(0);
        cache.add("a");
        cache.add("b");
        assert_eq!(cache.capacity(), 1);
        assert!(cache.has("b"));
    }

    #[test]
    fn fresh_filters_cached_candidates() {
        let mut caches = RecencyCaches::default();
        let candidates = ["salt", "smoke", "honey"];
        caches.add(CacheKind::Prose, "smoke");
        let fresh = caches.fresh(CacheKind::Prose, &candidates);
        assert_eq!(fresh, vec![&"salt", &"honey"]);
    }

    #[test]
    fn exhausted_category_clears_and_returns_everything() {
        let mut caches = RecencyCaches::default();
        let candidates = ["salt", "smoke"];
        caches.add(CacheKind::Festival, "salt");
        caches.add(CacheKind::Festival, "smoke");
        caches.add(CacheKind::Prose, "salt");

        let fresh = caches.fresh(CacheKind::Festival, &candidates);
        assert_eq!(fresh.len(), 2);
        assert!(caches.get(CacheKind::Festival).is_empty());
        // Other categories are untouched.
        assert!(caches.get(CacheKind::Prose).has("salt"));
    }

    #[test]
    fn soften_keeps_half() {
        let mut caches = RecencyCaches::default();
        for i in 0..10 {
            caches.add(CacheKind::Prose, &format!("p{}", i));
        }
        caches.soften_all();
        assert_eq!(caches.get(CacheKind::Prose).len(), 5);
        assert!(caches.get(CacheKind::Prose).has("p9"));
        assert!(!caches.get(CacheKind::Prose).has("p0"));
    }
}
