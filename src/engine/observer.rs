//! Hooks into rule evaluation.
//!
//! The matcher is generic over its [`Observer`], so a parse run with
//! [`NoopObserver`] carries no tracing cost at all. [`TracingObserver`]
//! forwards every event to `tracing`; rule descriptions are only rendered when
//! the corresponding level is enabled.

use super::matcher::MatchResult;
use crate::{Grammar, RuleId};
use tracing::{debug, trace};

pub trait Observer {
    /// A rule is about to be evaluated at `position`.
    fn evaluating(&mut self, _grammar: &Grammar, _rule: RuleId, _position: usize) {}

    /// A rule evaluated at `position` finished with `result`.
    fn evaluated(&mut self, _grammar: &Grammar, _rule: RuleId, _position: usize, _result: &MatchResult) {}

    /// A rule application at `position` was answered from the cache.
    fn cache_hit(&mut self, _grammar: &Grammar, _rule: RuleId, _position: usize, _result: &MatchResult) {}
}

impl<O: Observer + ?Sized> Observer for &mut O {
    fn evaluating(&mut self, grammar: &Grammar, rule: RuleId, position: usize) {
        (**self).evaluating(grammar, rule, position)
    }

    fn evaluated(&mut self, grammar: &Grammar, rule: RuleId, position: usize, result: &MatchResult) {
        (**self).evaluated(grammar, rule, position, result)
    }

    fn cache_hit(&mut self, grammar: &Grammar, rule: RuleId, position: usize, result: &MatchResult) {
        (**self).cache_hit(grammar, rule, position, result)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl Observer for NoopObserver {}

/// Emits `trace!` events per evaluation and `debug!` events per cache hit.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl Observer for TracingObserver {
    fn evaluating(&mut self, grammar: &Grammar, rule: RuleId, position: usize) {
        trace!(rule = rule.index(), position, description = %grammar.describe(rule), "evaluating");
    }

    fn evaluated(&mut self, grammar: &Grammar, rule: RuleId, position: usize, result: &MatchResult) {
        trace!(
            rule = rule.index(),
            position,
            outcome = result.outcome(),
            description = %grammar.describe(rule),
            "evaluated"
        );
    }

    fn cache_hit(&mut self, grammar: &Grammar, rule: RuleId, position: usize, result: &MatchResult) {
        debug!(
            rule = rule.index(),
            position,
            outcome = result.outcome(),
            description = %grammar.describe(rule),
            "cache hit"
        );
    }
}
