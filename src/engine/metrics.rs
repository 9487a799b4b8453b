//! Parse run metrics.
//!
//! Collected on every parse (the counters are plain integers) and surfaced
//! through [`parse_verbose_with`](crate::parse_verbose_with):
//!
//! - timing of the whole run and of each top-level rule,
//! - how many rule evaluations ran (cache hits are not evaluations),
//! - the deepest recursive nesting reached, to tune `Options::max_depth`,
//! - cache hit/miss/store/eviction counts.

use super::cache::CacheStats;
use crate::RuleId;
use std::time::Duration;

#[derive(Debug, Default, Clone)]
pub struct ParseMetrics {
    /// Total elapsed time of the run.
    pub total: Duration,
    /// Rule evaluations performed (excluding cache hits).
    pub rule_attempts: usize,
    /// Deepest nesting of recursive rules reached.
    pub max_depth_reached: usize,
    pub cache: CacheStats,
    /// One entry per top-level rule that was applied, in order.
    pub roots: Vec<RootMetrics>,
}

/// Outcome of applying one top-level rule.
#[derive(Debug, Clone)]
pub struct RootMetrics {
    pub rule: RuleId,
    pub duration: Duration,
    /// Cursor position before the rule was applied.
    pub start: usize,
    /// Cursor position afterwards.
    pub end: usize,
    pub matched: bool,
}
