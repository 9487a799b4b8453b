//! Backtracking rule evaluation.
//!
//! A [`Matcher`] owns the state of one in-flight parse: the cursor, the AST
//! builder, the memoization cache and the soft diagnostics recorded so far.
//! Applying a rule peels its behaviour off in layers, outermost first:
//!
//! ```text
//! apply(id)        cache lookup / replay / store, stack growth
//!  └ evaluate      lookahead: evaluate, then rewind everything
//!     └ structural token: entering / succeeded / failed on the IR
//!        └ cardinal   repetition [min, max], zero-advance guard
//!           └ once       negation
//!              └ body       terminal | sequence | choice | repeat | recursive (depth limit)
//! ```
//!
//! Every place that backtracks does so through a [`Checkpoint`], which saves
//! the cursor mark, the IR state and the diagnostic count together; restoring
//! one without the others would desynchronise nodes and positions.
//!
//! ## Failure polarity
//!
//! - `Failure` propagates until a tolerant container (an alternative remains,
//!   or the cardinality minimum is already met) absorbs it.
//! - `IgnorableFailure` is produced by a repetition with `min == 0` that
//!   matched nothing; every container treats it as an empty match.
//! - A rule that fails on a position never leaves the cursor moved.
//!
//! ## Nesting
//!
//! `depth` counts entries into recursive stubs, not rule applications: a
//! grammar without stubs has a nesting bounded by its own size. Entering a stub
//! once `Options::max_depth` stubs are open aborts the whole parse: every
//! subsequent application fails with the same `RecursionLimit` error and
//! nothing is cached, so an aborted parse never poisons results.
//!
//! Applications grow the native stack on demand through `stacker`, so nesting
//! is bounded by the limit rather than by the calling thread's stack.

use super::cache::{CacheEntry, MatchCache};
use super::ir::{AstBuilder, Emitted, IrCheckpoint};
use super::metrics::{ParseMetrics, RootMetrics};
use super::observer::Observer;
use crate::cursor::{Cursor, Mark};
use crate::grammar::{RuleKind, Terminal};
use crate::{Grammar, Node, Options, ParseError, Range, RuleId};
use std::time::Instant;
use tracing::debug;

/// Remaining stack below which an application switches to a fresh segment.
const STACK_RED_ZONE: usize = 64 * 1024;
/// Size of each segment allocated when the stack runs low.
const STACK_SEGMENT: usize = 1024 * 1024;

/// Outcome of applying a rule at a position.
#[derive(Debug, Clone, PartialEq)]
pub enum MatchResult {
    /// Matched and produced a node.
    Success(Range),
    /// Matched; input advanced (possibly by nothing) without a node of its own.
    Consumed(Range),
    /// Did not match, but the container may continue.
    IgnorableFailure(ParseError),
    /// Did not match; fatal unless a container absorbs it.
    Failure(ParseError),
}

impl MatchResult {
    pub fn is_match(&self) -> bool {
        matches!(self, MatchResult::Success(_) | MatchResult::Consumed(_))
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, MatchResult::Failure(_))
    }

    pub fn range(&self) -> Option<Range> {
        match self {
            MatchResult::Success(range) | MatchResult::Consumed(range) => Some(*range),
            MatchResult::IgnorableFailure(_) | MatchResult::Failure(_) => None,
        }
    }

    pub fn cause(&self) -> Option<&ParseError> {
        match self {
            MatchResult::IgnorableFailure(cause) | MatchResult::Failure(cause) => Some(cause),
            MatchResult::Success(_) | MatchResult::Consumed(_) => None,
        }
    }

    /// Short name of the variant, for logs.
    pub fn outcome(&self) -> &'static str {
        match self {
            MatchResult::Success(_) => "success",
            MatchResult::Consumed(_) => "consumed",
            MatchResult::IgnorableFailure(_) => "ignorable",
            MatchResult::Failure(_) => "failure",
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Checkpoint {
    cursor: Mark,
    ir: IrCheckpoint,
    warnings: usize,
}

/// Everything a finished run produced.
#[derive(Debug)]
pub(crate) struct Outcome {
    pub(crate) tree: Option<Node>,
    pub(crate) errors: Vec<ParseError>,
    pub(crate) warnings: Vec<ParseError>,
    pub(crate) consumed: usize,
    pub(crate) metrics: ParseMetrics,
}

pub(crate) struct Matcher<'g, 's, O: Observer> {
    grammar: &'g Grammar,
    cursor: Cursor<'s>,
    ir: AstBuilder,
    cache: MatchCache,
    observer: O,
    warnings: Vec<ParseError>,
    depth: usize,
    max_depth: usize,
    abort: Option<ParseError>,
    attempts: usize,
    deepest: usize,
}

impl<'g, 's, O: Observer> Matcher<'g, 's, O> {
    pub(crate) fn new(grammar: &'g Grammar, source: &'s str, options: &Options, observer: O) -> Self {
        Matcher {
            grammar,
            cursor: Cursor::new(source),
            ir: AstBuilder::new(),
            cache: MatchCache::new(options.cache),
            observer,
            warnings: Vec::new(),
            depth: 0,
            max_depth: options.max_depth,
            abort: None,
            attempts: 0,
            deepest: 0,
        }
    }

    pub(crate) fn position(&self) -> usize {
        self.cursor.position()
    }

    pub(crate) fn at_end(&self) -> bool {
        self.cursor.at_end()
    }

    pub(crate) fn warnings(&self) -> &[ParseError] {
        &self.warnings
    }

    fn checkpoint(&self) -> Checkpoint {
        Checkpoint { cursor: self.cursor.mark(), ir: self.ir.checkpoint(), warnings: self.warnings.len() }
    }

    fn rewind(&mut self, checkpoint: Checkpoint) {
        self.cursor.restore(checkpoint.cursor);
        self.ir.rewind(checkpoint.ir);
        self.warnings.truncate(checkpoint.warnings);
    }

    fn aborted(&self) -> Option<MatchResult> {
        self.abort.clone().map(MatchResult::Failure)
    }

    // --- Driver --------------------------------------------------------------

    /// Apply every root once, in order, then resolve the tree.
    pub(crate) fn run(mut self) -> Outcome {
        let grammar = self.grammar;
        let started = Instant::now();
        let mut errors = Vec::new();
        let mut roots = Vec::with_capacity(grammar.roots().len());

        for &root in grammar.roots() {
            let start = self.cursor.position();
            let applied = Instant::now();
            let result = self.apply(root);
            let end = self.cursor.position();
            debug!(rule = root.index(), start, end, outcome = result.outcome(), "applied root");
            let matched = !result.is_failure();
            roots.push(RootMetrics { rule: root, duration: applied.elapsed(), start, end, matched });

            if let Some(err) = self.abort.take() {
                errors.push(err);
                break;
            }
            if let MatchResult::Failure(cause) = result {
                errors.push(cause);
                break;
            }
        }

        if errors.is_empty() && !self.cursor.at_end() {
            let position = self.cursor.position();
            let found: String = self.cursor.remaining().chars().take(16).collect();
            errors.push(ParseError::parsing(
                format!("unexpected input {found:?}"),
                Range::new(position, self.cursor.source().len()),
                Vec::new(),
            ));
        }

        let consumed = self.cursor.position();
        let tree = match self.ir.finish() {
            Ok(tree) => Some(tree),
            Err(err) => {
                if errors.is_empty() {
                    errors.push(err);
                }
                None
            }
        };

        let metrics = ParseMetrics {
            total: started.elapsed(),
            rule_attempts: self.attempts,
            max_depth_reached: self.deepest,
            cache: self.cache.stats(),
            roots,
        };
        debug!(
            consumed,
            errors = errors.len(),
            warnings = self.warnings.len(),
            attempts = metrics.rule_attempts,
            "parse finished"
        );
        Outcome { tree, errors, warnings: self.warnings, consumed, metrics }
    }

    /// Advance by one top-level match: the first root that makes progress
    /// wins and the top-level nodes it produced are returned.
    pub(crate) fn step(&mut self) -> Result<Vec<Node>, ParseError> {
        let grammar = self.grammar;
        let start = self.cursor.position();
        let mut causes = Vec::new();
        for &root in grammar.roots() {
            let checkpoint = self.checkpoint();
            let result = self.apply(root);
            if let Some(err) = self.abort.take() {
                return Err(err);
            }
            match result {
                MatchResult::Success(_) | MatchResult::Consumed(_) if self.cursor.position() > start => {
                    return Ok(self.ir.take_nodes());
                }
                MatchResult::Failure(cause) | MatchResult::IgnorableFailure(cause) => causes.push(cause),
                MatchResult::Success(_) | MatchResult::Consumed(_) => {}
            }
            self.rewind(checkpoint);
        }
        let end = self.cursor.remaining().chars().next().map_or(start, |c| start + c.len_utf8());
        Err(ParseError::parsing("no top-level rule matched", Range::new(start, end), causes))
    }

    // --- Rule application ----------------------------------------------------

    pub(crate) fn apply(&mut self, id: RuleId) -> MatchResult {
        if let Some(aborted) = self.aborted() {
            return aborted;
        }
        let start = self.cursor.position();
        if let Some(entry) = self.cache.lookup(start, id).cloned() {
            self.observer.cache_hit(self.grammar, id, start, &entry.result);
            self.ir.extend(entry.nodes);
            self.warnings.extend(entry.warnings);
            self.cursor.jump(entry.end);
            return entry.result;
        }

        self.attempts += 1;
        self.observer.evaluating(self.grammar, id, start);

        let checkpoint = self.checkpoint();
        let result = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || self.evaluate(id));
        if !result.is_match() {
            self.rewind(checkpoint);
        }

        self.observer.evaluated(self.grammar, id, start, &result);

        if self.abort.is_none() && self.cache.is_enabled() {
            let entry = CacheEntry {
                result: result.clone(),
                end: self.cursor.position(),
                nodes: self.ir.appended_since(checkpoint.ir),
                warnings: self.warnings.get(checkpoint.warnings..).map(<[ParseError]>::to_vec).unwrap_or_default(),
            };
            self.cache.store(start, id, entry);
        }
        result
    }

    fn evaluate(&mut self, id: RuleId) -> MatchResult {
        let grammar = self.grammar;
        if !grammar.rule(id).behaviour().lookahead {
            return self.structural(id);
        }
        let start = self.cursor.position();
        let checkpoint = self.checkpoint();
        let result = self.cardinal(id);
        self.rewind(checkpoint);
        match result {
            MatchResult::Success(_) | MatchResult::Consumed(_) => MatchResult::Consumed(Range::empty(start)),
            failure => failure,
        }
    }

    fn structural(&mut self, id: RuleId) -> MatchResult {
        let grammar = self.grammar;
        let rule = grammar.rule(id);
        let annotations = rule.annotations();
        let Some(token) = rule.token() else {
            let result = self.cardinal(id);
            return self.annotate_failure(id, result);
        };

        let start = self.cursor.position();
        self.ir.entering();
        let range = match self.cardinal(id) {
            MatchResult::Success(range) | MatchResult::Consumed(range) => range,
            MatchResult::IgnorableFailure(_) if annotations.is_pinned() => Range::empty(start),
            MatchResult::IgnorableFailure(cause) => {
                self.ir.failed();
                return MatchResult::IgnorableFailure(cause);
            }
            MatchResult::Failure(cause) => {
                self.ir.failed();
                if self.abort.is_some() {
                    return MatchResult::Failure(cause);
                }
                let message = annotations.error().map_or_else(|| format!("expected {token}"), str::to_string);
                return MatchResult::Failure(ParseError::parsing(message, Range::empty(start), vec![cause]));
            }
        };
        match self.ir.succeeded(token, annotations, range) {
            Emitted::Node => MatchResult::Success(range),
            Emitted::Spliced | Emitted::Voided => MatchResult::Consumed(range),
        }
    }

    /// Replace the message of a failed scanning rule with its `error`
    /// annotation, keeping the original failure as the cause.
    fn annotate_failure(&self, id: RuleId, result: MatchResult) -> MatchResult {
        let grammar = self.grammar;
        match (result, grammar.rule(id).annotations().error()) {
            (MatchResult::Failure(cause), Some(message)) if self.abort.is_none() => {
                MatchResult::Failure(ParseError::parsing(message, Range::empty(self.cursor.position()), vec![cause]))
            }
            (result, _) => result,
        }
    }

    fn cardinal(&mut self, id: RuleId) -> MatchResult {
        let grammar = self.grammar;
        let cardinality = grammar.rule(id).behaviour().cardinality;
        if cardinality.is_one() {
            return self.once(id);
        }

        let start = self.cursor.position();
        let checkpoint = self.checkpoint();
        let mut count = 0;
        let mut last_cause = None;
        while cardinality.allows_more(count) {
            let before = self.checkpoint();
            let position = self.cursor.position();
            match self.once(id) {
                MatchResult::Success(_) | MatchResult::Consumed(_) => {
                    count += 1;
                    if self.cursor.position() == position {
                        // A zero-width iteration would repeat forever.
                        count = count.max(cardinality.min());
                        break;
                    }
                }
                MatchResult::IgnorableFailure(_) => {
                    self.rewind(before);
                    count = count.max(cardinality.min());
                    break;
                }
                MatchResult::Failure(cause) => {
                    self.rewind(before);
                    last_cause = Some(cause);
                    break;
                }
            }
        }
        if let Some(aborted) = self.aborted() {
            return aborted;
        }

        let cause = || {
            ParseError::parsing(format!("expected {}", grammar.describe(id)), Range::empty(start), Vec::new())
        };
        if count < cardinality.min() {
            self.rewind(checkpoint);
            return MatchResult::Failure(last_cause.unwrap_or_else(cause));
        }
        if count == 0 {
            return MatchResult::IgnorableFailure(last_cause.unwrap_or_else(cause));
        }
        MatchResult::Consumed(Range::new(start, self.cursor.position()))
    }

    fn once(&mut self, id: RuleId) -> MatchResult {
        let grammar = self.grammar;
        let behaviour = grammar.rule(id).behaviour();
        if !behaviour.negated {
            return self.body(id);
        }

        let start = self.cursor.position();
        let checkpoint = self.checkpoint();
        let result = self.body(id);
        if let Some(aborted) = self.aborted() {
            return aborted;
        }
        match result {
            MatchResult::Success(_) | MatchResult::Consumed(_) | MatchResult::IgnorableFailure(_) => {
                let end = self.cursor.position();
                self.rewind(checkpoint);
                let message = format!("unexpected {}", grammar.describe(id).without_modifiers());
                MatchResult::Failure(ParseError::scanning(message, Range::new(start, end)))
            }
            MatchResult::Failure(_) if behaviour.lookahead => MatchResult::Consumed(Range::empty(start)),
            MatchResult::Failure(_) => match self.cursor.scan_next() {
                Ok(_) => MatchResult::Consumed(Range::new(start, self.cursor.position())),
                Err(err) => MatchResult::Failure(err),
            },
        }
    }

    fn body(&mut self, id: RuleId) -> MatchResult {
        let grammar = self.grammar;
        match grammar.rule(id).kind() {
            RuleKind::Terminal(terminal) => self.terminal(terminal),
            RuleKind::Sequence(items) => self.sequence(items),
            RuleKind::Choice(alternatives) => self.choice(alternatives),
            RuleKind::Repeat(inner) => self.apply(*inner),
            RuleKind::Recursive(slot) => self.recurse(id, grammar.surrogate(*slot)),
        }
    }

    /// Enter the surrogate of the stub `id`, counting one level of nesting.
    fn recurse(&mut self, id: RuleId, surrogate: RuleId) -> MatchResult {
        if self.depth >= self.max_depth {
            let position = self.cursor.position();
            debug!(limit = self.max_depth, position, rule = id.index(), "recursion limit reached");
            let err = ParseError::RecursionLimit { limit: self.max_depth, range: Range::empty(position) };
            self.abort = Some(err.clone());
            return MatchResult::Failure(err);
        }
        self.depth += 1;
        self.deepest = self.deepest.max(self.depth);
        let result = self.apply(surrogate);
        self.depth -= 1;
        result
    }

    fn terminal(&mut self, terminal: &Terminal) -> MatchResult {
        let start = self.cursor.position();
        let scanned = match terminal {
            Terminal::Character(c) => self.cursor.scan_char(*c),
            Terminal::Literal(literal) => self.cursor.scan_literal(literal),
            Terminal::Set(set) => self.cursor.scan_set(set).map(drop),
            Terminal::Regex(regex) => self.cursor.scan_regex(regex).map(drop),
            Terminal::Any => self.cursor.scan_next().map(drop),
        };
        match scanned {
            Ok(()) => MatchResult::Consumed(Range::new(start, self.cursor.position())),
            Err(err) => MatchResult::Failure(err),
        }
    }

    fn sequence(&mut self, items: &[RuleId]) -> MatchResult {
        let start = self.cursor.position();
        let checkpoint = self.checkpoint();
        for &item in items {
            if let MatchResult::Failure(cause) = self.apply(item) {
                self.rewind(checkpoint);
                return MatchResult::Failure(cause);
            }
        }
        MatchResult::Consumed(Range::new(start, self.cursor.position()))
    }

    fn choice(&mut self, alternatives: &[RuleId]) -> MatchResult {
        let grammar = self.grammar;
        let start = self.cursor.position();
        let checkpoint = self.checkpoint();
        let mut failed: Vec<(RuleId, ParseError)> = Vec::new();

        for &alternative in alternatives {
            match self.apply(alternative) {
                MatchResult::Success(_) | MatchResult::Consumed(_) => {
                    self.record_soft_failures(start, failed);
                    return MatchResult::Consumed(Range::new(start, self.cursor.position()));
                }
                MatchResult::IgnorableFailure(cause) => {
                    self.record_soft_failures(start, failed);
                    return MatchResult::IgnorableFailure(cause);
                }
                MatchResult::Failure(cause) => {
                    if self.abort.is_some() {
                        return MatchResult::Failure(cause);
                    }
                    self.rewind(checkpoint);
                    failed.push((alternative, cause));
                }
            }
        }

        let expected: Vec<String> = failed.iter().map(|(id, _)| grammar.describe(*id).to_string()).collect();
        let causes = failed.into_iter().map(|(_, cause)| cause).collect();
        MatchResult::Failure(ParseError::parsing(
            format!("expected one of {}", expected.join(" or ")),
            Range::empty(start),
            causes,
        ))
    }

    /// Keep the failures of `error`-annotated alternatives that got past the
    /// choice's start before a later alternative matched.
    fn record_soft_failures(&mut self, start: usize, failed: Vec<(RuleId, ParseError)>) {
        let grammar = self.grammar;
        for (alternative, cause) in failed {
            if grammar.rule(alternative).annotations().error().is_some() && cause.furthest() > start {
                self.warnings.push(cause);
            }
        }
    }
}
