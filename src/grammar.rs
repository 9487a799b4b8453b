//! Rule graphs: construction and the built [`Grammar`].
//!
//! Rules live in an arena and refer to each other by [`RuleId`] (an index into
//! that arena). A rule's identity is its index: two structurally identical
//! rules are different rules, and the packrat cache keys on the index.
//!
//! Construction happens in two phases:
//!
//! 1. **Build the graph** with a [`GrammarBuilder`]. Every combinator returns a
//!    fresh `RuleId`; changing behaviour or annotations copies the rule rather
//!    than mutating it. Cycles are expressed with stubs:
//!
//!    ```text
//!    let expr = g.declare("expr");          // stub, surrogate slot empty
//!    let group = g.sequence([open, expr.rule(), close]);
//!    ...
//!    g.resolve(expr, sum);                  // slot := sum (handle consumed)
//!    ```
//!
//! 2. **Build the grammar** with [`GrammarBuilder::build`]. This validates the
//!    graph (every stub resolved, no empty composites, no foreign ids) and
//!    freezes it. Only a built [`Grammar`] can be parsed with, so a stub can
//!    never be matched before its surrogate is assigned.
//!
//! ## Invariants
//!
//! - `Grammar::rules` and every `RuleId` stored inside it are aligned: ids are
//!   always in bounds once `build` succeeded.
//! - `Grammar::surrogates[slot]` is the resolved target of the stub with that
//!   slot and never itself a stub chain that loops back.

use crate::error::GrammarError;
use crate::{Annotation, AnnotationValue, Annotations, Behaviour, Cardinality, CharacterSet, Kind, Token};
use regex::Regex;
use std::fmt;

/// Identity of a rule (index into the grammar's rule arena).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RuleId(usize);

impl RuleId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for RuleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule #{}", self.0)
    }
}

/// An atomic unit of input.
#[derive(Debug, Clone)]
pub enum Terminal {
    Character(char),
    Literal(String),
    Set(CharacterSet),
    /// Anchored at the cursor when matched.
    Regex(Regex),
    /// Any single character.
    Any,
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Terminal::Character(c) => write!(f, "{c:?}"),
            Terminal::Literal(s) => write!(f, "{s:?}"),
            Terminal::Set(set) => write!(f, "{set}"),
            Terminal::Regex(re) => {
                let pattern = re.as_str();
                let pattern = pattern.strip_prefix(r"\A(?:").and_then(|p| p.strip_suffix(')')).unwrap_or(pattern);
                write!(f, "/{pattern}/")
            }
            Terminal::Any => f.write_str("."),
        }
    }
}

#[derive(Debug, Clone)]
pub enum RuleKind {
    Terminal(Terminal),
    Sequence(Vec<RuleId>),
    Choice(Vec<RuleId>),
    /// Applies the wrapper's cardinality to the inner rule.
    Repeat(RuleId),
    /// Stub delegating to the surrogate in the given slot.
    Recursive(usize),
}

#[derive(Debug, Clone)]
pub struct Rule {
    kind: RuleKind,
    behaviour: Behaviour,
    annotations: Annotations,
    /// Effective token: the `token` annotation wins over the behaviour.
    token: Option<Token>,
}

impl Rule {
    fn new(kind: RuleKind, behaviour: Behaviour, annotations: Annotations) -> Self {
        let token = annotations.token().or_else(|| behaviour.token().cloned());
        Rule { kind, behaviour, annotations, token }
    }

    pub fn kind(&self) -> &RuleKind {
        &self.kind
    }

    pub fn behaviour(&self) -> &Behaviour {
        &self.behaviour
    }

    pub fn annotations(&self) -> &Annotations {
        &self.annotations
    }

    /// Token of the node this rule produces, if it produces one.
    pub fn token(&self) -> Option<&Token> {
        self.token.as_ref()
    }
}

#[derive(Debug)]
struct Stub {
    name: String,
    surrogate: Option<RuleId>,
}

/// Values that can stand for a rule while building a grammar: rule ids, stub
/// handles, and characters, literals or sets (which become new terminals).
pub trait IntoRule {
    fn into_rule(self, builder: &mut GrammarBuilder) -> RuleId;
}

impl IntoRule for RuleId {
    fn into_rule(self, _builder: &mut GrammarBuilder) -> RuleId {
        self
    }
}

impl IntoRule for &StubHandle {
    fn into_rule(self, _builder: &mut GrammarBuilder) -> RuleId {
        self.rule()
    }
}

impl IntoRule for char {
    fn into_rule(self, builder: &mut GrammarBuilder) -> RuleId {
        builder.character(self)
    }
}

impl IntoRule for &str {
    fn into_rule(self, builder: &mut GrammarBuilder) -> RuleId {
        builder.literal(self)
    }
}

impl IntoRule for CharacterSet {
    fn into_rule(self, builder: &mut GrammarBuilder) -> RuleId {
        builder.set(self)
    }
}

/// Handle to a declared recursive stub. Consumed by
/// [`GrammarBuilder::resolve`], so a stub is resolved at most once.
#[must_use = "a declared stub must be resolved before the grammar is built"]
#[derive(Debug)]
pub struct StubHandle {
    rule: RuleId,
    slot: usize,
}

impl StubHandle {
    /// The stub rule, usable in other rules before it is resolved.
    pub fn rule(&self) -> RuleId {
        self.rule
    }
}

/// Incrementally builds a rule graph.
#[derive(Debug, Default)]
pub struct GrammarBuilder {
    rules: Vec<Rule>,
    stubs: Vec<Stub>,
}

impl GrammarBuilder {
    pub fn new() -> Self {
        GrammarBuilder::default()
    }

    fn push(&mut self, kind: RuleKind, behaviour: Behaviour, annotations: Annotations) -> RuleId {
        let id = RuleId(self.rules.len());
        self.rules.push(Rule::new(kind, behaviour, annotations));
        id
    }

    /// The rule behind `id`, if it was created by this builder.
    pub fn rule(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0)
    }

    /// The rule `item` stands for (see [`IntoRule`]).
    pub fn rule_from(&mut self, item: impl IntoRule) -> RuleId {
        item.into_rule(self)
    }

    // --- Terminals -----------------------------------------------------------

    pub fn terminal(&mut self, terminal: Terminal) -> RuleId {
        self.push(RuleKind::Terminal(terminal), Behaviour::scanning(), Annotations::new())
    }

    pub fn character(&mut self, c: char) -> RuleId {
        self.terminal(Terminal::Character(c))
    }

    pub fn literal(&mut self, literal: impl Into<String>) -> RuleId {
        self.terminal(Terminal::Literal(literal.into()))
    }

    pub fn set(&mut self, set: CharacterSet) -> RuleId {
        self.terminal(Terminal::Set(set))
    }

    /// Inclusive character range, `"0"..."9"` in STLR.
    pub fn range(&mut self, lo: char, hi: char) -> RuleId {
        self.set(CharacterSet::range(lo, hi))
    }

    pub fn any(&mut self) -> RuleId {
        self.terminal(Terminal::Any)
    }

    /// Regular-expression terminal, anchored at the cursor when matched.
    pub fn regex(&mut self, pattern: &str) -> Result<RuleId, GrammarError> {
        let regex = Regex::new(&format!(r"\A(?:{pattern})"))
            .map_err(|source| GrammarError::InvalidRegex { pattern: pattern.to_string(), source })?;
        Ok(self.terminal(Terminal::Regex(regex)))
    }

    // --- Composites ----------------------------------------------------------

    pub fn sequence(&mut self, items: impl IntoIterator<Item = RuleId>) -> RuleId {
        let items = items.into_iter().collect();
        self.push(RuleKind::Sequence(items), Behaviour::scanning(), Annotations::new())
    }

    /// Ordered choice: the first alternative that matches wins.
    pub fn choice(&mut self, alternatives: impl IntoIterator<Item = RuleId>) -> RuleId {
        let alternatives = alternatives.into_iter().collect();
        self.push(RuleKind::Choice(alternatives), Behaviour::scanning(), Annotations::new())
    }

    pub fn repeat(&mut self, rule: RuleId, cardinality: Cardinality) -> RuleId {
        let behaviour = Behaviour::scanning().with_cardinality(cardinality);
        self.push(RuleKind::Repeat(rule), behaviour, Annotations::new())
    }

    pub fn optional(&mut self, rule: RuleId) -> RuleId {
        self.repeat(rule, Cardinality::optional())
    }

    pub fn zero_or_more(&mut self, rule: RuleId) -> RuleId {
        self.repeat(rule, Cardinality::zero_or_more())
    }

    pub fn one_or_more(&mut self, rule: RuleId) -> RuleId {
        self.repeat(rule, Cardinality::one_or_more())
    }

    // --- Instances -----------------------------------------------------------

    /// Copy of `rule` with a different behaviour and/or annotations.
    ///
    /// The copy is a new rule with its own identity; `rule` is unchanged. Ids
    /// that do not belong to this builder are returned as they are.
    pub fn instance_with(
        &mut self,
        rule: RuleId,
        behaviour: Option<Behaviour>,
        annotations: Option<Annotations>,
    ) -> RuleId {
        let Some(original) = self.rules.get(rule.0) else {
            return rule;
        };
        let kind = original.kind.clone();
        let behaviour = behaviour.unwrap_or_else(|| original.behaviour.clone());
        let annotations = annotations.unwrap_or_else(|| original.annotations.clone());
        self.push(kind, behaviour, annotations)
    }

    fn with_behaviour(&mut self, rule: RuleId, change: impl FnOnce(Behaviour) -> Behaviour) -> RuleId {
        let behaviour = self.rules.get(rule.0).map(|r| change(r.behaviour.clone()));
        self.instance_with(rule, behaviour, None)
    }

    /// Copy of `rule` that produces a node labelled `token`.
    pub fn token(&mut self, rule: RuleId, token: impl Into<Token>) -> RuleId {
        let token = token.into();
        self.with_behaviour(rule, |b| b.with_kind(Kind::Structural(token)))
    }

    /// Copy of `rule` with the polarity of its match inverted.
    pub fn not(&mut self, rule: RuleId) -> RuleId {
        self.with_behaviour(rule, Behaviour::negate)
    }

    /// Copy of `rule` that matches without consuming input.
    pub fn lookahead(&mut self, rule: RuleId) -> RuleId {
        self.with_behaviour(rule, Behaviour::lookahead)
    }

    /// Copy of `rule` with `annotation` set to `value`.
    pub fn annotate(&mut self, rule: RuleId, annotation: Annotation, value: impl Into<AnnotationValue>) -> RuleId {
        let annotations = self.rules.get(rule.0).map(|r| r.annotations.clone().with(annotation, value));
        self.instance_with(rule, None, annotations)
    }

    pub fn void(&mut self, rule: RuleId) -> RuleId {
        self.annotate(rule, Annotation::Void, AnnotationValue::Set)
    }

    pub fn transient(&mut self, rule: RuleId) -> RuleId {
        self.annotate(rule, Annotation::Transient, AnnotationValue::Set)
    }

    pub fn pinned(&mut self, rule: RuleId) -> RuleId {
        self.annotate(rule, Annotation::Pinned, AnnotationValue::Set)
    }

    /// Copy of `rule` reporting `message` when it fails.
    pub fn error(&mut self, rule: RuleId, message: impl Into<String>) -> RuleId {
        self.annotate(rule, Annotation::Error, AnnotationValue::String(message.into()))
    }

    // --- Recursion -----------------------------------------------------------

    /// Declare a stub for a rule that will be defined later.
    pub fn declare(&mut self, name: impl Into<String>) -> StubHandle {
        let slot = self.stubs.len();
        self.stubs.push(Stub { name: name.into(), surrogate: None });
        let rule = self.push(RuleKind::Recursive(slot), Behaviour::scanning(), Annotations::new());
        StubHandle { rule, slot }
    }

    /// Assign the real rule behind a stub.
    pub fn resolve(&mut self, stub: StubHandle, rule: RuleId) {
        if let Some(slot) = self.stubs.get_mut(stub.slot) {
            slot.surrogate = Some(rule);
        }
    }

    // --- Build ---------------------------------------------------------------

    /// Validate the graph and freeze it into a [`Grammar`] whose top-level
    /// rules are `roots`, applied in order.
    pub fn build(self, roots: impl IntoIterator<Item = RuleId>) -> Result<Grammar, GrammarError> {
        let roots: Vec<RuleId> = roots.into_iter().collect();
        if roots.is_empty() {
            return Err(GrammarError::NoRoots);
        }

        let count = self.rules.len();
        let check = |rule: RuleId| if rule.0 < count { Ok(()) } else { Err(GrammarError::UnknownRule { rule }) };

        for &root in &roots {
            check(root)?;
        }
        for (idx, rule) in self.rules.iter().enumerate() {
            match &rule.kind {
                RuleKind::Sequence(items) | RuleKind::Choice(items) => {
                    if items.is_empty() {
                        let composite = if matches!(rule.kind, RuleKind::Sequence(_)) { "sequence" } else { "choice" };
                        return Err(GrammarError::EmptyComposite { composite, rule: RuleId(idx) });
                    }
                    for &item in items {
                        check(item)?;
                    }
                }
                RuleKind::Repeat(inner) => check(*inner)?,
                RuleKind::Terminal(_) | RuleKind::Recursive(_) => {}
            }
        }

        let mut surrogates = Vec::with_capacity(self.stubs.len());
        let mut stub_names = Vec::with_capacity(self.stubs.len());
        for stub in self.stubs {
            let Some(surrogate) = stub.surrogate else {
                return Err(GrammarError::UnresolvedStub { name: stub.name });
            };
            check(surrogate)?;
            surrogates.push(surrogate);
            stub_names.push(stub.name);
        }

        // A stub whose surrogate chain only passes through other stubs would
        // recurse without consuming anything.
        for (slot, name) in stub_names.iter().enumerate() {
            let mut seen = vec![slot];
            let mut target = surrogates[slot];
            while let RuleKind::Recursive(next) = self.rules[target.0].kind {
                if seen.contains(&next) {
                    return Err(GrammarError::CyclicStub { name: name.clone() });
                }
                seen.push(next);
                target = surrogates[next];
            }
        }

        Ok(Grammar { rules: self.rules, surrogates, stub_names, roots })
    }
}

/// A validated, immutable rule graph with its ordered top-level rules.
///
/// `Grammar` is `Send + Sync`; any number of parses may share one.
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<Rule>,
    surrogates: Vec<RuleId>,
    stub_names: Vec<String>,
    roots: Vec<RuleId>,
}

impl Grammar {
    /// Top-level rules, in the order they are applied.
    pub fn roots(&self) -> &[RuleId] {
        &self.roots
    }

    pub fn get(&self, id: RuleId) -> Option<&Rule> {
        self.rules.get(id.0)
    }

    /// Only called with ids validated by `GrammarBuilder::build`.
    pub(crate) fn rule(&self, id: RuleId) -> &Rule {
        &self.rules[id.0]
    }

    pub(crate) fn surrogate(&self, slot: usize) -> RuleId {
        self.surrogates[slot]
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Every token some rule of the grammar can produce, sorted.
    pub fn tokens(&self) -> Vec<Token> {
        let mut tokens: Vec<Token> = self.rules.iter().filter_map(|r| r.token().cloned()).collect();
        tokens.sort();
        tokens.dedup();
        tokens
    }

    /// Human-readable description of a rule, rendered lazily.
    pub fn describe(&self, id: RuleId) -> RuleDescription<'_> {
        RuleDescription { grammar: self, id, depth: 0, modifiers: true }
    }
}

/// Lazily formatted description of a rule, used in diagnostics and traces.
pub struct RuleDescription<'g> {
    grammar: &'g Grammar,
    id: RuleId,
    depth: usize,
    modifiers: bool,
}

impl RuleDescription<'_> {
    const MAX_DEPTH: usize = 2;

    /// Leave out the negation and lookahead prefixes of the outermost rule.
    pub fn without_modifiers(mut self) -> Self {
        self.modifiers = false;
        self
    }

    fn nested(&self, id: RuleId) -> Self {
        RuleDescription { grammar: self.grammar, id, depth: self.depth + 1, modifiers: true }
    }

    fn write_items(&self, f: &mut fmt::Formatter<'_>, items: &[RuleId], separator: &str) -> fmt::Result {
        if self.depth >= Self::MAX_DEPTH {
            return f.write_str("(...)");
        }
        f.write_str("(")?;
        for (idx, item) in items.iter().enumerate() {
            if idx > 0 {
                f.write_str(separator)?;
            }
            write!(f, "{}", self.nested(*item))?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for RuleDescription<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(rule) = self.grammar.get(self.id) else {
            return write!(f, "{}", self.id);
        };
        let behaviour = rule.behaviour();
        if self.modifiers && behaviour.negated {
            f.write_str("!")?;
        }
        if self.modifiers && behaviour.lookahead {
            f.write_str(">")?;
        }
        match (rule.token(), rule.kind()) {
            (Some(token), _) => write!(f, "{token}")?,
            (None, RuleKind::Terminal(terminal)) => write!(f, "{terminal}")?,
            (None, RuleKind::Sequence(items)) => self.write_items(f, items, " ")?,
            (None, RuleKind::Choice(items)) => self.write_items(f, items, " | ")?,
            (None, RuleKind::Repeat(inner)) => write!(f, "{}", self.nested(*inner))?,
            (None, RuleKind::Recursive(slot)) => {
                f.write_str(self.grammar.stub_names.get(*slot).map(String::as_str).unwrap_or("<stub>"))?
            }
        }
        write!(f, "{}", behaviour.cardinality)
    }
}
