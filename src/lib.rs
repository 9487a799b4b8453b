//! A backtracking, memoizing grammar engine.
//!
//! Grammars are graphs of [`Rule`]s built with a [`GrammarBuilder`]: terminals
//! (characters, literals, character sets, regular expressions) combined into
//! sequences, ordered choices and repetitions, with behaviour modifiers
//! (negation, lookahead, cardinality) and annotations (token, error, void,
//! transient, pinned, ...). Recursive grammars are expressed through stubs that
//! are declared first and resolved once the rest of the graph exists.
//!
//! ```text
//! GrammarBuilder ── build(roots) ──▶ Grammar ──┐
//!                                              │ parse / parse_with / tokens
//! source text ─────────────────────────────────┤
//!                                              ▼
//!                      Cursor + Matcher + AstBuilder (+ MatchCache)
//!                                              │
//!                                              ▼
//!                          ParseResult { tree: Node, errors, ... }
//! ```
//!
//! # Example
//! ```
//! use stlr::{Cardinality, GrammarBuilder};
//!
//! let mut g = GrammarBuilder::new();
//! let digit = g.range('0', '9');
//! let digits = g.repeat(digit, Cardinality::one_or_more());
//! let number = g.token(digits, "number");
//! let grammar = g.build([number]).unwrap();
//!
//! let tree = stlr::parse(&grammar, "042").unwrap();
//! assert_eq!(tree.token.name(), "number");
//! assert_eq!((tree.range.start, tree.range.end), (0, 3));
//! ```

#[macro_use]
mod macros;
mod annotation;
mod api;
mod behaviour;
mod charset;
mod cursor;
mod engine;
mod error;
mod grammar;
pub mod languages;

use std::fmt;
use std::sync::Arc;

pub use annotation::{Annotation, AnnotationValue, Annotations};
pub use api::{
    Options, ParseDetails, ParseResult, ParseResultVerbose, parse, parse_observed, parse_verbose, parse_verbose_with,
    parse_with, tokens,
};
pub use behaviour::{Behaviour, Cardinality, Kind};
pub use charset::{CharClass, CharacterSet};
pub use cursor::{Cursor, Mark};
pub use engine::{
    CacheConfig, CacheStats, MatchResult, NoopObserver, Observer, ParseMetrics, RootMetrics, TokenStream,
    TracingObserver,
};
pub use error::{GrammarError, ParseError, SourceLocation};
pub use grammar::{
    Grammar, GrammarBuilder, IntoRule, Rule, RuleDescription, RuleId, RuleKind, StubHandle, Terminal,
};

// --- Core value types --------------------------------------------------------

/// A half-open byte range `[start, end)` into the parsed source.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Range {
    /// Start byte index (inclusive).
    pub start: usize,
    /// End byte index (exclusive).
    pub end: usize,
}

impl Range {
    pub fn new(start: usize, end: usize) -> Self {
        Range { start, end }
    }

    /// A zero-width range at `position`.
    pub fn empty(position: usize) -> Self {
        Range { start: position, end: position }
    }

    pub fn len(&self) -> usize {
        self.end.saturating_sub(self.start)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Smallest range covering both `self` and `other`.
    pub fn cover(self, other: Range) -> Range {
        Range { start: self.start.min(other.start), end: self.end.max(other.end) }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}..{}", self.start, self.end)
    }
}

/// Label attached to nodes produced by structural rules.
///
/// Tokens are compared by name; cloning is cheap.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Token(Arc<str>);

impl Token {
    pub fn new(name: impl AsRef<str>) -> Self {
        Token(Arc::from(name.as_ref()))
    }

    /// Token of the synthetic node wrapping several top-level nodes.
    pub fn root() -> Self {
        Token::new("root")
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Token {
    fn from(name: &str) -> Self {
        Token::new(name)
    }
}

impl From<String> for Token {
    fn from(name: String) -> Self {
        Token::new(name)
    }
}

/// A node of the abstract syntax tree.
///
/// Nodes own their children; the tree is immutable once the parse finishes.
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub token: Token,
    pub range: Range,
    pub children: Vec<Node>,
    /// Annotations of the rule that produced this node.
    pub annotations: Annotations,
}

impl Node {
    pub fn new(token: impl Into<Token>, range: Range) -> Self {
        Node { token: token.into(), range, children: Vec::new(), annotations: Annotations::new() }
    }

    pub fn with_children(mut self, children: Vec<Node>) -> Self {
        self.children = children;
        self
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    /// Slice of `source` covered by this node.
    pub fn text<'s>(&self, source: &'s str) -> &'s str {
        source.get(self.range.start..self.range.end).unwrap_or("")
    }

    /// Leaf nodes in tree order.
    pub fn leaves(&self) -> Vec<&Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.is_leaf() {
                out.push(node);
            } else {
                stack.extend(node.children.iter().rev());
            }
        }
        out
    }

    /// First node (pre-order, including `self`) carrying `token`.
    pub fn find(&self, token: &str) -> Option<&Node> {
        if self.token.name() == token {
            return Some(self);
        }
        self.children.iter().find_map(|child| child.find(token))
    }

    /// All nodes (pre-order, including `self`) carrying `token`.
    pub fn find_all<'n>(&'n self, token: &str) -> Vec<&'n Node> {
        let mut out = Vec::new();
        let mut stack = vec![self];
        while let Some(node) = stack.pop() {
            if node.token.name() == token {
                out.push(node);
            }
            stack.extend(node.children.iter().rev());
        }
        out
    }

    /// Height of the tree rooted here (a leaf has depth 1).
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Node::depth).max().unwrap_or(0)
    }

    /// Indented dump of the tree; leaves show the text they cover.
    ///
    /// ```text
    /// expression 0..5
    ///     number 0..1 '1'
    ///     operator 2..3 '+'
    ///     number 4..5 '2'
    /// ```
    pub fn describe(&self, source: &str) -> String {
        let mut out = String::new();
        self.describe_into(source, 0, &mut out);
        out
    }

    fn describe_into(&self, source: &str, indent: usize, out: &mut String) {
        use std::fmt::Write;

        let _ = write!(out, "{:width$}{} {}", "", self.token, self.range, width = indent * 4);
        if self.is_leaf() {
            let _ = write!(out, " '{}'", self.text(source).escape_debug());
        }
        out.push('\n');
        for child in &self.children {
            child.describe_into(source, indent + 1, out);
        }
    }
}
