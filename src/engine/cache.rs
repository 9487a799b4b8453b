//! Packrat memoization of rule applications.
//!
//! Entries are keyed by `(position, rule)` and hold everything needed to
//! replay an application without evaluating it again: the result, the cursor
//! position it ended at, the nodes it appended and the soft diagnostics it
//! recorded.
//!
//! ```text
//! position ─▶ [(rule, entry), (rule, entry), ...]   at most `breadth` rules
//!    ▲
//! order: oldest position first                      at most `depth` positions
//! ```
//!
//! Bounds only trade recomputation for memory. A missing entry is always
//! re-evaluated, so the cache never changes what a parse produces.

use super::matcher::MatchResult;
use crate::{Node, ParseError, RuleId};
use std::collections::{HashMap, VecDeque};

/// Size limits of the memoization cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheConfig {
    /// Number of input positions tracked.
    pub depth: usize,
    /// Number of rules tracked per position.
    pub breadth: usize,
}

impl CacheConfig {
    pub fn new(depth: usize, breadth: usize) -> Self {
        CacheConfig { depth, breadth }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        CacheConfig { depth: 1024, breadth: 64 }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: usize,
    pub misses: usize,
    pub stores: usize,
    pub evictions: usize,
}

#[derive(Debug, Clone)]
pub(crate) struct CacheEntry {
    pub(crate) result: MatchResult,
    pub(crate) end: usize,
    pub(crate) nodes: Vec<Node>,
    pub(crate) warnings: Vec<ParseError>,
}

#[derive(Debug, Default)]
pub(crate) struct MatchCache {
    config: Option<CacheConfig>,
    entries: HashMap<usize, Vec<(RuleId, CacheEntry)>>,
    order: VecDeque<usize>,
    stats: CacheStats,
}

impl MatchCache {
    pub(crate) fn new(config: Option<CacheConfig>) -> Self {
        MatchCache { config, ..MatchCache::default() }
    }

    pub(crate) fn is_enabled(&self) -> bool {
        self.config.is_some_and(|c| c.depth > 0 && c.breadth > 0)
    }

    pub(crate) fn lookup(&mut self, position: usize, rule: RuleId) -> Option<&CacheEntry> {
        if !self.is_enabled() {
            return None;
        }
        let found = self.entries.get(&position).and_then(|slot| slot.iter().find(|(id, _)| *id == rule));
        match found {
            Some((_, entry)) => {
                self.stats.hits += 1;
                Some(entry)
            }
            None => {
                self.stats.misses += 1;
                None
            }
        }
    }

    /// Record `entry`; a key that already has an entry keeps the first one.
    pub(crate) fn store(&mut self, position: usize, rule: RuleId, entry: CacheEntry) {
        let Some(config) = self.config.filter(|_| self.is_enabled()) else {
            return;
        };

        if !self.entries.contains_key(&position) {
            while self.order.len() >= config.depth {
                let Some(oldest) = self.order.pop_front() else { break };
                if let Some(evicted) = self.entries.remove(&oldest) {
                    self.stats.evictions += evicted.len();
                }
            }
            self.order.push_back(position);
        }

        let slot = self.entries.entry(position).or_default();
        if slot.iter().any(|(id, _)| *id == rule) {
            return;
        }
        if slot.len() >= config.breadth {
            slot.remove(0);
            self.stats.evictions += 1;
        }
        slot.push((rule, entry));
        self.stats.stores += 1;
    }

    pub(crate) fn stats(&self) -> CacheStats {
        self.stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{GrammarBuilder, Range};

    fn ids(count: usize) -> Vec<RuleId> {
        let mut g = GrammarBuilder::new();
        (0..count).map(|_| g.any()).collect()
    }

    fn entry(end: usize) -> CacheEntry {
        CacheEntry { result: MatchResult::Consumed(Range::new(0, end)), end, nodes: Vec::new(), warnings: Vec::new() }
    }

    #[test]
    fn disabled_cache_stores_nothing() {
        let rules = ids(1);
        let mut cache = MatchCache::new(None);
        cache.store(0, rules[0], entry(1));
        assert!(cache.lookup(0, rules[0]).is_none());
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn entries_are_write_once() {
        let rules = ids(1);
        let mut cache = MatchCache::new(Some(CacheConfig::default()));
        cache.store(0, rules[0], entry(1));
        cache.store(0, rules[0], entry(5));
        assert_eq!(cache.lookup(0, rules[0]).map(|e| e.end), Some(1));
        assert_eq!(cache.stats().stores, 1);
        assert_eq!(cache.stats().hits, 1);
    }

    #[test]
    fn oldest_position_is_evicted_first() {
        let rules = ids(1);
        let mut cache = MatchCache::new(Some(CacheConfig::new(2, 4)));
        cache.store(0, rules[0], entry(1));
        cache.store(1, rules[0], entry(2));
        cache.store(2, rules[0], entry(3));
        assert!(cache.lookup(0, rules[0]).is_none());
        assert!(cache.lookup(1, rules[0]).is_some());
        assert!(cache.lookup(2, rules[0]).is_some());
        assert_eq!(cache.stats().evictions, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn breadth_bounds_rules_per_position() {
        let rules = ids(3);
        let mut cache = MatchCache::new(Some(CacheConfig::new(8, 2)));
        for rule in &rules {
            cache.store(0, *rule, entry(1));
        }
        assert!(cache.lookup(0, rules[0]).is_none());
        assert!(cache.lookup(0, rules[2]).is_some());
    }
}
