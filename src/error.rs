//! Errors and source locations.
//!
//! Parse errors form a causal tree: a terminal that fails to scan produces a
//! [`ParseError::Scanning`]; composite and structural rules that fail wrap the
//! errors of their components in a [`ParseError::Parsing`]. Nothing is
//! summarized away, so a caller can render the whole chain:
//!
//! ```text
//! 1:5: expected expression
//!   1:5: expected one of number or group
//!     1:5: expected '0'...'9' but found ")"
//!     1:5: expected '(' but found ")"
//! ```
//!
//! [`GrammarError`] covers problems found while building a grammar; a grammar
//! that fails to build can never be parsed with.

use crate::{Range, RuleId};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A terminal did not match at a position.
    #[error("{message}")]
    Scanning { message: String, range: Range },

    /// A composite or structural rule failed after trying its components.
    #[error("{message}")]
    Parsing { message: String, range: Range, causes: Vec<ParseError> },

    /// Matching finished but no tree could be produced.
    #[error("{message}")]
    Interpretation { message: String, range: Range, causes: Vec<ParseError> },

    /// Recursive rules nested deeper than [`Options::max_depth`](crate::Options::max_depth).
    #[error("rule nesting exceeded the depth limit of {limit}")]
    RecursionLimit { limit: usize, range: Range },
}

impl ParseError {
    pub fn scanning(message: impl Into<String>, range: Range) -> Self {
        ParseError::Scanning { message: message.into(), range }
    }

    pub fn parsing(message: impl Into<String>, range: Range, causes: Vec<ParseError>) -> Self {
        ParseError::Parsing { message: message.into(), range, causes }
    }

    pub fn interpretation(message: impl Into<String>, range: Range, causes: Vec<ParseError>) -> Self {
        ParseError::Interpretation { message: message.into(), range, causes }
    }

    pub fn range(&self) -> Range {
        match self {
            ParseError::Scanning { range, .. }
            | ParseError::Parsing { range, .. }
            | ParseError::Interpretation { range, .. }
            | ParseError::RecursionLimit { range, .. } => *range,
        }
    }

    pub fn causes(&self) -> &[ParseError] {
        match self {
            ParseError::Parsing { causes, .. } | ParseError::Interpretation { causes, .. } => causes,
            ParseError::Scanning { .. } | ParseError::RecursionLimit { .. } => &[],
        }
    }

    /// Errors at the leaves of the causal tree.
    pub fn root_causes(&self) -> Vec<&ParseError> {
        if self.causes().is_empty() {
            return vec![self];
        }
        self.causes().iter().flat_map(ParseError::root_causes).collect()
    }

    /// Furthest position reached by any error in the causal tree.
    pub fn furthest(&self) -> usize {
        self.causes().iter().map(ParseError::furthest).fold(self.range().start, usize::max)
    }

    /// Render the error and its causes as `line:column: message` lines,
    /// indenting each level of the causal chain.
    pub fn render(&self, source: &str) -> String {
        let mut out = String::new();
        self.render_into(source, 0, &mut out);
        out
    }

    fn render_into(&self, source: &str, indent: usize, out: &mut String) {
        let location = SourceLocation::locate(source, self.range().start);
        out.push_str(&format!("{:width$}{location}: {self}\n", "", width = indent * 2));
        for cause in self.causes() {
            cause.render_into(source, indent + 1, out);
        }
    }
}

/// One-based line and column (in characters) of a byte offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

impl SourceLocation {
    /// Locate `offset` in `source`. Offsets past the end are clamped; an offset
    /// inside a multi-byte character counts as that character.
    pub fn locate(source: &str, offset: usize) -> Self {
        let mut line = 1;
        let mut column = 1;
        for (idx, c) in source.char_indices() {
            if idx >= offset {
                break;
            }
            if c == '\n' {
                line += 1;
                column = 1;
            } else {
                column += 1;
            }
        }
        SourceLocation { line, column }
    }
}

impl std::fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// Problems detected while building a grammar.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GrammarError {
    #[error("recursive rule `{name}` was declared but never resolved")]
    UnresolvedStub { name: String },

    #[error("{composite} {rule} has no children")]
    EmptyComposite { composite: &'static str, rule: RuleId },

    #[error("{rule} does not belong to this grammar")]
    UnknownRule { rule: RuleId },

    #[error("recursive rule `{name}` only ever refers to other recursive rules")]
    CyclicStub { name: String },

    #[error("invalid cardinality: minimum {min} exceeds maximum {max}")]
    InvalidCardinality { min: usize, max: usize },

    #[error("invalid regular expression `{pattern}`")]
    InvalidRegex {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("a grammar needs at least one root rule")]
    NoRoots,
}
